//! # Event Bus System
//!
//! Broadcast channel connecting the narration core to its observers (UI,
//! analytics, host logging). Download, preload and playback components emit
//! typed events; any number of subscribers consume them independently.
//!
//! ```text
//! ┌────────────────┐  emit   ┌───────────┐  subscribe  ┌────────────┐
//! │ DownloadClient ├────────>│           ├────────────>│ Subscriber │
//! └────────────────┘         │ EventBus  │             └────────────┘
//! ┌────────────────┐  emit   │ (broadcast│  subscribe  ┌────────────┐
//! │ Preloader      ├────────>│  channel) ├────────────>│ Subscriber │
//! └────────────────┘         │           │             └────────────┘
//! ┌────────────────┐  emit   │           │
//! │ PlaybackSession├────────>│           │
//! └────────────────┘         └───────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, DownloadEvent, EventBus};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(100);
//! let mut subscriber = bus.subscribe();
//!
//! bus.emit(CoreEvent::Download(DownloadEvent::Pending {
//!     content_id: "article-1".to_string(),
//!     voice: "en-US-JennyNeural".to_string(),
//! }))
//! .ok();
//!
//! let event = subscriber.recv().await.unwrap();
//! assert_eq!(event.description(), "Audio is still being generated");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber fell `n` events behind. Non-fatal.
//! - **`RecvError::Closed`**: every sender is gone; treat as shutdown.
//!
//! Emitting with no subscribers returns an error that emitters ignore.

use core_async::sync::broadcast;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use core_async::sync::broadcast::error::{RecvError, SendError};
pub use core_async::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Progress ticks arrive once per second while playing, so a hundred slots
/// tolerate a slow subscriber for well over a minute.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    Download(DownloadEvent),
    Preload(PreloadEvent),
    Playback(PlaybackEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Download(e) => e.description(),
            CoreEvent::Preload(e) => e.description(),
            CoreEvent::Playback(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Download(DownloadEvent::Failed { .. }) => EventSeverity::Error,
            CoreEvent::Playback(PlaybackEvent::Error { .. }) => EventSeverity::Error,
            CoreEvent::Preload(PreloadEvent::Finished { success: false, .. }) => {
                EventSeverity::Warning
            }
            CoreEvent::Playback(PlaybackEvent::Stalled { .. }) => EventSeverity::Warning,
            CoreEvent::Download(DownloadEvent::Completed { .. }) => EventSeverity::Info,
            CoreEvent::Preload(PreloadEvent::Finished { success: true, .. }) => {
                EventSeverity::Info
            }
            CoreEvent::Playback(PlaybackEvent::Started { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Download Events
// ============================================================================

/// Outcome notifications from a single audio fetch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum DownloadEvent {
    /// The canonical file already existed; no request was made.
    CacheHit { content_id: String, voice: String },
    /// A request is about to be sent.
    Started {
        content_id: String,
        voice: String,
        /// `low` or `high`.
        priority: String,
    },
    /// Audio was verified and published to the cache.
    Completed {
        content_id: String,
        voice: String,
        bytes: u64,
    },
    /// The server accepted the request but is still synthesizing.
    Pending { content_id: String, voice: String },
    Failed {
        content_id: String,
        voice: String,
        /// Stable failure category, e.g. `integrity_mismatch`.
        kind: String,
        message: String,
    },
}

impl DownloadEvent {
    fn description(&self) -> &str {
        match self {
            DownloadEvent::CacheHit { .. } => "Audio served from cache",
            DownloadEvent::Started { .. } => "Audio download started",
            DownloadEvent::Completed { .. } => "Audio downloaded and verified",
            DownloadEvent::Pending { .. } => "Audio is still being generated",
            DownloadEvent::Failed { .. } => "Audio download failed",
        }
    }
}

// ============================================================================
// Preload Events
// ============================================================================

/// Progress of a batch preload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PreloadEvent {
    /// A round over the pending list is starting. `round` is 1-based.
    RoundStarted { round: u32, pending: usize },
    /// A round finished; `remaining` items are still not cached.
    RoundCompleted { round: u32, remaining: usize },
    /// The batch is over, either fully cached or out of attempts.
    Finished {
        success: bool,
        rounds: u32,
        remaining: Vec<String>,
    },
    /// The caller cancelled the batch.
    Cancelled { rounds: u32 },
}

impl PreloadEvent {
    fn description(&self) -> &str {
        match self {
            PreloadEvent::RoundStarted { .. } => "Preload round started",
            PreloadEvent::RoundCompleted { .. } => "Preload round completed",
            PreloadEvent::Finished { success: true, .. } => "Preload completed",
            PreloadEvent::Finished { success: false, .. } => "Preload gave up",
            PreloadEvent::Cancelled { .. } => "Preload cancelled",
        }
    }
}

// ============================================================================
// Playback Events
// ============================================================================

/// Events related to the playback session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// Resolving the audio resource for a new item.
    Loading { content_id: String },
    Started { content_id: String, title: String },
    Paused {
        content_id: String,
        position_ms: u64,
    },
    Resumed {
        content_id: String,
        position_ms: u64,
    },
    /// Session torn down. `content_id` is absent when nothing was loaded.
    Stopped { content_id: Option<String> },
    /// The item played to its end.
    Completed { content_id: String },
    PositionChanged {
        content_id: String,
        position_ms: u64,
        duration_ms: u64,
    },
    Seeked {
        content_id: String,
        position_ms: u64,
    },
    /// Progressive download of a streamed item advanced.
    Buffering {
        content_id: String,
        bytes_downloaded: u64,
        total_bytes: Option<u64>,
    },
    Stalled { content_id: String },
    /// An audio session interruption began or ended.
    Interrupted { content_id: String, active: bool },
    Error {
        content_id: Option<String>,
        /// User-facing message.
        message: String,
        recoverable: bool,
    },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::Loading { .. } => "Loading audio",
            PlaybackEvent::Started { .. } => "Playback started",
            PlaybackEvent::Paused { .. } => "Playback paused",
            PlaybackEvent::Resumed { .. } => "Playback resumed",
            PlaybackEvent::Stopped { .. } => "Playback stopped",
            PlaybackEvent::Completed { .. } => "Playback completed",
            PlaybackEvent::PositionChanged { .. } => "Playback position changed",
            PlaybackEvent::Seeked { .. } => "Playback position moved",
            PlaybackEvent::Buffering { .. } => "Buffering audio",
            PlaybackEvent::Stalled { .. } => "Playback stalled",
            PlaybackEvent::Interrupted { .. } => "Playback interrupted",
            PlaybackEvent::Error { .. } => "Playback error",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Cloning the bus clones the sender; every clone publishes to the same
/// subscribers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus buffering up to `capacity` events per
    /// subscriber before it starts lagging.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers reached, or an error when there are
    /// none.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Shorthand for `EventStream::new(self.subscribe())`.
    pub fn stream(&self) -> EventStream {
        EventStream::new(self.subscribe())
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A `broadcast::Receiver` with an optional predicate.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus};
///
/// let bus = EventBus::new(100);
/// let playback_only = bus
///     .stream()
///     .filter(|event| matches!(event, CoreEvent::Playback(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned by `recv`/`try_recv`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn matches(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// `RecvError::Lagged(n)` if the subscriber fell behind by `n` events,
    /// `RecvError::Closed` once all senders are dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.matches(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive a matching event without waiting.
    ///
    /// Returns `None` if no matching event is currently buffered.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.matches(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(id: &str) -> CoreEvent {
        CoreEvent::Download(DownloadEvent::Pending {
            content_id: id.to_string(),
            voice: "en-US-JennyNeural".to_string(),
        })
    }

    #[tokio::test]
    async fn test_emit_without_subscribers_is_an_error() {
        let bus = EventBus::new(10);
        assert!(bus.emit(pending("a")).is_err());
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        let event = pending("article-1");
        assert_eq!(bus.emit(event.clone()).unwrap(), 2);

        assert_eq!(sub1.recv().await.unwrap(), event);
        assert_eq!(sub2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_event_stream_with_filter() {
        let bus = EventBus::new(10);
        let mut stream = bus
            .stream()
            .filter(|event| matches!(event, CoreEvent::Playback(_)));

        bus.emit(pending("article-1")).ok();
        let playback = CoreEvent::Playback(PlaybackEvent::Loading {
            content_id: "article-1".to_string(),
        });
        bus.emit(playback.clone()).ok();

        assert_eq!(stream.recv().await.unwrap(), playback);
    }

    #[tokio::test]
    async fn test_try_recv_skips_filtered_events() {
        let bus = EventBus::new(10);
        let mut stream = bus
            .stream()
            .filter(|event| event.severity() == EventSeverity::Error);

        bus.emit(pending("a")).ok();
        assert!(stream.try_recv().is_none());

        let failure = CoreEvent::Download(DownloadEvent::Failed {
            content_id: "a".to_string(),
            voice: "v".to_string(),
            kind: "bad_status".to_string(),
            message: "HTTP 500".to_string(),
        });
        bus.emit(failure.clone()).ok();
        assert_eq!(stream.try_recv().unwrap().unwrap(), failure);
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe();

        for i in 0..5 {
            bus.emit(pending(&format!("article-{}", i))).ok();
        }

        assert!(matches!(sub.recv().await, Err(RecvError::Lagged(_))));
    }

    #[test]
    fn test_event_severity() {
        let finished_ok = CoreEvent::Preload(PreloadEvent::Finished {
            success: true,
            rounds: 1,
            remaining: vec![],
        });
        let gave_up = CoreEvent::Preload(PreloadEvent::Finished {
            success: false,
            rounds: 6,
            remaining: vec!["b".to_string()],
        });
        let tick = CoreEvent::Playback(PlaybackEvent::PositionChanged {
            content_id: "a".to_string(),
            position_ms: 1000,
            duration_ms: 60_000,
        });

        assert_eq!(finished_ok.severity(), EventSeverity::Info);
        assert_eq!(gave_up.severity(), EventSeverity::Warning);
        assert_eq!(tick.severity(), EventSeverity::Debug);
        assert_eq!(gave_up.description(), "Preload gave up");
    }

    #[test]
    fn test_event_serialization() {
        let event = CoreEvent::Playback(PlaybackEvent::Error {
            content_id: Some("article-9".to_string()),
            message: "Error generating audio.".to_string(),
            recoverable: false,
        });

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"Playback""#));
        assert!(json.contains(r#""event":"Error""#));

        let back: CoreEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[tokio::test]
    async fn test_concurrent_publishers() {
        let bus = EventBus::new(100);
        let mut sub = bus.subscribe();

        let handles: Vec<_> = (0..2)
            .map(|n| {
                let bus = bus.clone();
                core_async::task::spawn(async move {
                    for i in 0..10 {
                        bus.emit(pending(&format!("{}-{}", n, i))).ok();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let mut count = 0;
        while sub.try_recv().is_ok() {
            count += 1;
        }
        assert_eq!(count, 20);
    }
}
