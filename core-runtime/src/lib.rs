//! # Core Runtime Module
//!
//! Runtime infrastructure shared by the narration core:
//! - Logging and tracing setup with host log forwarding
//! - Configuration builder with fail-fast capability checks
//! - Event bus for download, preload and playback notifications

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{CoreConfig, CoreConfigBuilder, ResourcePolicy};
pub use error::{Error, Result};
pub use events::{CoreEvent, EventBus, EventStream};
