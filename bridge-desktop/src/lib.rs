//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux):
//! - `HttpClient` using `reqwest`
//! - `FileSystemAccess` using `tokio::fs` and `dirs` for platform directories
//! - `NowPlayingCenter` that records and logs the current item
//! - `InterruptionSource` fed manually by the host
//!
//! There is no desktop `PlaybackAdapter`; hosts always inject their audio
//! engine.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ReqwestHttpClient, TokioFileSystem};
//!
//! let http_client = ReqwestHttpClient::new()?;
//! let fs = TokioFileSystem::new();
//! ```

mod filesystem;
mod http;
mod media_session;

pub use filesystem::TokioFileSystem;
pub use http::ReqwestHttpClient;
pub use media_session::{LoggingNowPlayingCenter, ManualInterruptionSource};
