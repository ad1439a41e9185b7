//! Media session shims for desktop hosts, which have neither a system
//! now-playing panel nor audio session interruptions by default.

use async_trait::async_trait;
use bridge_traits::{
    error::Result,
    media_session::{
        AudioInterruption, InterruptionSource, InterruptionStream, NowPlayingCenter,
        NowPlayingInfo,
    },
};
use core_async::sync::broadcast;
use parking_lot::Mutex;
use tracing::{debug, warn};

/// Now-playing center that records the latest info and logs updates.
#[derive(Default)]
pub struct LoggingNowPlayingCenter {
    current: Mutex<Option<NowPlayingInfo>>,
}

impl LoggingNowPlayingCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recently published info, if any.
    pub fn current(&self) -> Option<NowPlayingInfo> {
        self.current.lock().clone()
    }
}

#[async_trait]
impl NowPlayingCenter for LoggingNowPlayingCenter {
    async fn update(&self, info: NowPlayingInfo) -> Result<()> {
        debug!(
            title = %info.title,
            elapsed_secs = info.elapsed.as_secs(),
            duration_secs = info.duration.as_secs(),
            "Now playing updated"
        );
        *self.current.lock() = Some(info);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        debug!("Now playing cleared");
        *self.current.lock() = None;
        Ok(())
    }
}

/// Interruption source driven by the host application itself, e.g. from a
/// tray menu or an OS hook the host wires up.
pub struct ManualInterruptionSource {
    sender: broadcast::Sender<AudioInterruption>,
}

impl ManualInterruptionSource {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(16);
        Self { sender }
    }

    /// Deliver an interruption to every live subscriber. Returns the number
    /// of subscribers reached.
    pub fn notify(&self, interruption: AudioInterruption) -> usize {
        self.sender.send(interruption).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ManualInterruptionSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InterruptionSource for ManualInterruptionSource {
    async fn subscribe(&self) -> Result<Box<dyn InterruptionStream>> {
        Ok(Box::new(BroadcastInterruptionStream {
            receiver: self.sender.subscribe(),
        }))
    }
}

struct BroadcastInterruptionStream {
    receiver: broadcast::Receiver<AudioInterruption>,
}

#[async_trait]
impl InterruptionStream for BroadcastInterruptionStream {
    async fn next(&mut self) -> Option<AudioInterruption> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Interruption stream lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
