//! # Host Bridge Traits
//!
//! Capabilities the narration audio core requires from its host platform.
//!
//! ## Traits
//!
//! ### Networking & I/O
//! - [`HttpClient`](http::HttpClient) - Single-attempt async HTTP requests
//! - [`FileSystemAccess`](storage::FileSystemAccess) - Whole-file I/O and atomic rename
//!
//! ### Audio
//! - [`PlaybackAdapter`](playback::PlaybackAdapter) - Native player control and callbacks
//! - [`NowPlayingCenter`](media_session::NowPlayingCenter) - Lock-screen / media panel metadata
//! - [`InterruptionSource`](media_session::InterruptionSource) - Audio session interruptions
//!
//! ### Utilities
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Fail-Fast Strategy
//!
//! `core-runtime` refuses to build a configuration when a required capability
//! is missing and reports which one, instead of failing on first use:
//!
//! ```ignore
//! let adapter = builder.playback_adapter.ok_or_else(|| Error::CapabilityMissing {
//!     capability: "PlaybackAdapter".to_string(),
//!     message: "Inject the host audio engine adapter.".to_string(),
//! })?;
//! ```
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so implementations can be shared
//! across the core's background tasks.

pub mod error;
pub mod http;
pub mod logging;
pub mod media_session;
pub mod playback;
pub mod storage;

pub use error::BridgeError;

pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use media_session::{
    AudioInterruption, InterruptionSource, InterruptionStream, NowPlayingCenter, NowPlayingInfo,
};
pub use playback::{
    player_event_channel, AudioSource, PlaybackAdapter, PlaybackMetadata, PlaybackRequest,
    PlaybackSessionId, PlayerEvent, PlayerEventReceiver, PlayerEventSender,
};
pub use storage::FileSystemAccess;
