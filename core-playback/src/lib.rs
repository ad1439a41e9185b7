//! # Narration Playback Core
//!
//! Acquires synthesized narration audio and drives its playback.
//!
//! ## Overview
//!
//! This crate handles:
//! - A file-backed cache with deterministic names and atomic publish
//! - Digest verification against server-advertised hashes
//! - Single-attempt downloads classified as ready, pending or failed
//! - Batch preloading with linear back-off between rounds
//! - A playback session state machine over a host player
//!
//! ## Components
//!
//! ```text
//! Preloader ─────┐
//!                ├──> DownloadClient ──> CacheStore ──> FileSystemAccess
//! PlaybackSession┘          │               └──> IntegrityVerifier
//!        │                  └──> HttpClient
//!        └──> PlaybackAdapter / NowPlayingCenter / InterruptionSource
//! ```

pub mod cache;
pub mod config;
pub mod download;
pub mod error;
pub mod preload;
pub mod session;
pub mod types;

pub use cache::{CacheStore, DigestAlgorithm, ExpectedDigest, IntegrityVerifier};
pub use config::{DownloadSettings, PreloadSettings, SessionSettings};
pub use download::DownloadClient;
pub use error::{DownloadError, DownloadErrorKind, PlaybackError, Result};
pub use preload::{PreloadReport, Preloader};
pub use session::{
    format_time, PlaybackSession, PlaybackState, ScrubState, SessionDeps, SessionSnapshot,
    AUDIO_ERROR_MESSAGE, AUDIO_PENDING_MESSAGE, DURATION_SENTINEL,
};
pub use types::{
    ContentId, DownloadOutcome, DownloadPriority, DownloadType, NarrationItem, Voice,
};
