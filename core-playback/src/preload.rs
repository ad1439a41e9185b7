//! # Preload Orchestrator
//!
//! Warms the cache for a batch of items at low priority, retrying items the
//! server is still synthesizing with a linear back-off.
//!
//! Rounds run strictly one after another and items within a round are
//! fetched sequentially, so at most one request is in flight per call.

use core_async::sync::CancellationToken;
use core_async::time::sleep;
use core_runtime::events::{CoreEvent, EventBus, PreloadEvent};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::config::PreloadSettings;
use crate::download::DownloadClient;
use crate::types::{ContentId, DownloadOutcome, DownloadPriority, Voice};

/// Summary of one preload call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloadReport {
    /// Every item ended up cached.
    pub success: bool,
    /// Rounds started, i.e. the most download attempts any item received.
    pub rounds: u32,
    /// Items still not cached, in request order.
    pub remaining: Vec<ContentId>,
    pub cancelled: bool,
}

pub struct Preloader {
    client: Arc<DownloadClient>,
    settings: PreloadSettings,
    event_bus: Option<EventBus>,
}

impl Preloader {
    /// A zero attempt limit is raised to one.
    pub fn new(client: Arc<DownloadClient>, mut settings: PreloadSettings) -> Self {
        if let Err(reason) = settings.validate() {
            warn!("Invalid preload settings ({}); using a single attempt", reason);
            settings.max_attempts = 1;
        }
        Self {
            client,
            settings,
            event_bus: None,
        }
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Cache every item, retrying pending ones. `false` when attempts ran out.
    pub async fn preload(&self, content_ids: &[ContentId], voice: &Voice) -> bool {
        self.preload_with_cancel(content_ids, voice, &CancellationToken::new())
            .await
    }

    /// Like [`preload`](Self::preload); cancellation yields `false`.
    pub async fn preload_with_cancel(
        &self,
        content_ids: &[ContentId],
        voice: &Voice,
        cancel: &CancellationToken,
    ) -> bool {
        self.preload_detailed(content_ids, voice, cancel)
            .await
            .success
    }

    #[instrument(skip(self, content_ids, cancel), fields(items = content_ids.len(), voice = %voice))]
    pub async fn preload_detailed(
        &self,
        content_ids: &[ContentId],
        voice: &Voice,
        cancel: &CancellationToken,
    ) -> PreloadReport {
        let mut pending: Vec<ContentId> = Vec::with_capacity(content_ids.len());
        for id in content_ids {
            if !pending.contains(id) {
                pending.push(id.clone());
            }
        }

        let max_attempts = self.settings.max_attempts;
        let mut rounds: u32 = 0;

        while !pending.is_empty() {
            if cancel.is_cancelled() {
                return self.cancelled(rounds, pending);
            }

            rounds += 1;
            debug!("Preload round {} with {} items", rounds, pending.len());
            self.emit(PreloadEvent::RoundStarted {
                round: rounds,
                pending: pending.len(),
            });

            let mut still_pending = Vec::new();
            let mut queue = pending.into_iter();
            while let Some(id) = queue.next() {
                if cancel.is_cancelled() {
                    still_pending.push(id);
                    still_pending.extend(queue);
                    return self.cancelled(rounds, still_pending);
                }

                match self.client.fetch_audio(&id, voice, DownloadPriority::Low).await {
                    DownloadOutcome::Ready(_) => {}
                    DownloadOutcome::Pending => still_pending.push(id),
                    DownloadOutcome::Failed(e) => {
                        if e.is_retryable() {
                            debug!("Preload of {} failed this round: {}", id, e);
                        } else {
                            warn!("Preload of {} failed and is unlikely to recover: {}", id, e);
                        }
                        still_pending.push(id);
                    }
                }
            }
            pending = still_pending;

            self.emit(PreloadEvent::RoundCompleted {
                round: rounds,
                remaining: pending.len(),
            });

            if pending.is_empty() {
                break;
            }
            if rounds >= max_attempts {
                warn!(
                    "Preload gave up after {} rounds with {} items outstanding",
                    rounds,
                    pending.len()
                );
                return self.finish(false, rounds, pending);
            }

            let delay = self.settings.delay_after_round(rounds - 1);
            if !delay.is_zero() {
                debug!("Waiting {:?} before next preload round", delay);
                if cancel.run_until_cancelled(sleep(delay)).await.is_none() {
                    return self.cancelled(rounds, pending);
                }
            }
        }

        info!("Preload complete after {} rounds", rounds);
        self.finish(true, rounds, pending)
    }

    fn finish(&self, success: bool, rounds: u32, remaining: Vec<ContentId>) -> PreloadReport {
        self.emit(PreloadEvent::Finished {
            success,
            rounds,
            remaining: remaining.iter().map(ToString::to_string).collect(),
        });
        PreloadReport {
            success,
            rounds,
            remaining,
            cancelled: false,
        }
    }

    fn cancelled(&self, rounds: u32, remaining: Vec<ContentId>) -> PreloadReport {
        info!("Preload cancelled after {} rounds", rounds);
        self.emit(PreloadEvent::Cancelled { rounds });
        PreloadReport {
            success: false,
            rounds,
            remaining,
            cancelled: true,
        }
    }

    fn emit(&self, event: PreloadEvent) {
        if let Some(bus) = &self.event_bus {
            let _ = bus.emit(CoreEvent::Preload(event));
        }
    }
}
