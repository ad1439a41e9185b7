//! Playback bridge traits and supporting audio types.
//!
//! The core never decodes audio itself. It hands a resolved [`AudioSource`] to
//! a host [`PlaybackAdapter`] (AVPlayer, ExoPlayer, rodio, ...) and drives it
//! through a small command surface. Asynchronous player callbacks flow back as
//! [`PlayerEvent`]s on the channel passed to [`PlaybackAdapter::prepare`].

use crate::error::Result;
use core_async::sync::mpsc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// Resolved audio resource handed to the adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    /// Verified file in the local narration cache.
    LocalFile { path: PathBuf },
    /// Remote MP3 stream fetched progressively by the host.
    RemoteStream {
        url: String,
        headers: HashMap<String, String>,
    },
}

impl AudioSource {
    pub fn is_remote(&self) -> bool {
        matches!(self, AudioSource::RemoteStream { .. })
    }
}

/// Unique identifier for playback sessions managed by a host adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaybackSessionId(Uuid);

impl PlaybackSessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PlaybackSessionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Display metadata adapters may surface in platform media UI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackMetadata {
    pub content_id: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
}

/// Request describing the player a host adapter should provision.
#[derive(Debug, Clone)]
pub struct PlaybackRequest {
    pub source: AudioSource,
    pub metadata: PlaybackMetadata,
    /// Initial position; zero for a fresh item.
    pub start_position: Duration,
}

impl PlaybackRequest {
    pub fn new(source: AudioSource) -> Self {
        Self {
            source,
            metadata: PlaybackMetadata::default(),
            start_position: Duration::ZERO,
        }
    }

    pub fn with_metadata(mut self, metadata: PlaybackMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Callbacks raised by the host player after `prepare`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayerEvent {
    /// Enough data is buffered to start; the core responds with `play`.
    ReadyToPlay,
    /// Progressive download of a remote stream advanced.
    DownloadProgress {
        bytes_downloaded: u64,
        total_bytes: Option<u64>,
    },
    /// Remote stream fully downloaded.
    DownloadFinished { bytes: u64 },
    /// Buffer ran dry.
    Stalled,
    /// Reached the end of the item.
    Finished,
    /// Unrecoverable player failure.
    Failed { message: String },
}

pub type PlayerEventSender = mpsc::UnboundedSender<PlayerEvent>;
pub type PlayerEventReceiver = mpsc::UnboundedReceiver<PlayerEvent>;

/// Create the channel a session hands to [`PlaybackAdapter::prepare`].
pub fn player_event_channel() -> (PlayerEventSender, PlayerEventReceiver) {
    mpsc::unbounded_channel()
}

/// Trait for platform-specific playback adapters that drive native audio engines.
///
/// Calls for one session are serialized by the core; adapters need not guard
/// against concurrent commands on the same [`PlaybackSessionId`].
#[async_trait::async_trait]
pub trait PlaybackAdapter: Send + Sync {
    /// Allocate a player bound to `request.source`. Player callbacks for the
    /// returned session must be sent on `events` until `unload` is called.
    async fn prepare(
        &self,
        request: PlaybackRequest,
        events: PlayerEventSender,
    ) -> Result<PlaybackSessionId>;

    /// Begin or resume playback.
    async fn play(&self, session: PlaybackSessionId) -> Result<()>;

    /// Pause playback without releasing the player.
    async fn pause(&self, session: PlaybackSessionId) -> Result<()>;

    /// Seek to an absolute position within the item.
    async fn seek(&self, session: PlaybackSessionId, position: Duration) -> Result<()>;

    /// Current playback position.
    async fn get_position(&self, session: PlaybackSessionId) -> Result<Duration>;

    /// Total item duration, `None` while still unknown (streams).
    async fn get_duration(&self, session: PlaybackSessionId) -> Result<Option<Duration>>;

    /// Release the player; no further events are sent for `session`.
    async fn unload(&self, session: PlaybackSessionId) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_is_unique() {
        let a = PlaybackSessionId::new();
        let b = PlaybackSessionId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn remote_source_detection() {
        let local = AudioSource::LocalFile {
            path: PathBuf::from("/tmp/a.mp3"),
        };
        let remote = AudioSource::RemoteStream {
            url: "https://example.com/audio.mp3".into(),
            headers: HashMap::new(),
        };
        assert!(!local.is_remote());
        assert!(remote.is_remote());
    }

    #[test]
    fn player_event_serializes_tagged() {
        let json = serde_json::to_string(&PlayerEvent::DownloadFinished { bytes: 10 }).unwrap();
        assert_eq!(json, r#"{"type":"download_finished","bytes":10}"#);
    }

    #[tokio::test]
    async fn player_event_channel_delivers_in_order() {
        let (tx, mut rx) = player_event_channel();
        tx.send(PlayerEvent::ReadyToPlay).unwrap();
        tx.send(PlayerEvent::Finished).unwrap();

        assert_eq!(rx.recv().await, Some(PlayerEvent::ReadyToPlay));
        assert_eq!(rx.recv().await, Some(PlayerEvent::Finished));
    }
}
