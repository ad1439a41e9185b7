//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (`core-service`, `core-playback`). Host applications can
//! depend on `narration-workspace` and enable the documented features without
//! needing to wire each crate individually.
//!
//! - `desktop-shims` (default): the full [`NarrationService`] façade with
//!   reqwest / tokio-fs defaults for missing bridges.
//! - `playback-only`: just the playback core, for hosts that wire every
//!   component themselves.

#[cfg(feature = "desktop-shims")]
pub use core_service::{CoreError, NarrationService};

#[cfg(feature = "playback-only")]
pub use core_playback as playback;
