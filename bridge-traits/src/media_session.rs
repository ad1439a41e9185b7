//! Platform media session integration: the now-playing panel and audio
//! session interruptions (phone calls, other apps taking focus).

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Snapshot shown in the platform's now-playing / lock-screen UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NowPlayingInfo {
    pub title: String,
    pub artist: String,
    pub duration: Duration,
    pub elapsed: Duration,
}

/// Publishes now-playing information to the host.
#[async_trait::async_trait]
pub trait NowPlayingCenter: Send + Sync {
    async fn update(&self, info: NowPlayingInfo) -> Result<()>;

    /// Remove any now-playing entry owned by the core.
    async fn clear(&self) -> Result<()>;
}

/// Audio session interruption notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AudioInterruption {
    /// Another audio client took over; playback must pause.
    Began,
    /// The interruption is over. `should_resume` mirrors the platform hint.
    Ended { should_resume: bool },
}

/// Source of interruption notifications.
///
/// Each call to `subscribe` yields an independent stream; dropping the stream
/// unsubscribes.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::media_session::{AudioInterruption, InterruptionSource};
///
/// async fn watch(source: &dyn InterruptionSource) -> Result<()> {
///     let mut stream = source.subscribe().await?;
///     while let Some(event) = stream.next().await {
///         if event == AudioInterruption::Began {
///             pause().await;
///         }
///     }
///     Ok(())
/// }
/// ```
#[async_trait::async_trait]
pub trait InterruptionSource: Send + Sync {
    async fn subscribe(&self) -> Result<Box<dyn InterruptionStream>>;
}

/// Stream of interruption notifications.
#[async_trait::async_trait]
pub trait InterruptionStream: Send {
    /// Returns `None` when the source is gone.
    async fn next(&mut self) -> Option<AudioInterruption>;
}
