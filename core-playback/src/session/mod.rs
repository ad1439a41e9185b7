//! # Playback Session
//!
//! State machine driving one narrated item through a host player:
//!
//! ```text
//!            play(item)          audio ready
//! Stopped ─────────────> Loading ───────────> Playing ⇄ Paused
//!    ^                      │                    │        │
//!    └──────────────────────┴── stop() / error ──┴────────┘
//! ```
//!
//! All mutations go through one async mutex. Background work (download,
//! progress timer, interruption listener, player-event pump) runs on spawned
//! tasks that hold a `Weak` reference to the session and compare a
//! generation counter before touching state, so work belonging to a torn
//! down item is discarded instead of applied.
//!
//! Observers either poll [`PlaybackSession::snapshot`], watch
//! [`PlaybackSession::subscribe`], or listen for [`PlaybackEvent`]s on the
//! event bus.

mod state;

pub use state::{format_time, PlaybackState, ScrubState, SessionSnapshot, DURATION_SENTINEL};

use bridge_traits::{
    player_event_channel, AudioInterruption, AudioSource, InterruptionSource, InterruptionStream,
    NowPlayingCenter, NowPlayingInfo, PlaybackAdapter, PlaybackMetadata, PlaybackRequest,
    PlaybackSessionId, PlayerEvent, PlayerEventReceiver,
};
use core_async::runtime::Handle;
use core_async::sync::{watch, Mutex};
use core_async::task::{spawn, JoinHandle};
use core_async::time::{interval, MissedTickBehavior};
use core_runtime::config::{ResourcePolicy, MIN_PROGRESS_INTERVAL};
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use core_runtime::logging::redact_query_token;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use crate::config::SessionSettings;
use crate::download::DownloadClient;
use crate::error::{DownloadError, DownloadErrorKind, PlaybackError};
use crate::types::{ContentId, DownloadOutcome, DownloadPriority, NarrationItem, Voice};

/// Shown while the server is still synthesizing and nothing can be streamed.
pub const AUDIO_PENDING_MESSAGE: &str = "Your audio is being generated.";
/// Shown for every other resource or player failure.
pub const AUDIO_ERROR_MESSAGE: &str = "Error generating audio.";

/// Collaborators a session needs.
#[derive(Clone)]
pub struct SessionDeps {
    pub download_client: Arc<DownloadClient>,
    pub adapter: Arc<dyn PlaybackAdapter>,
    pub now_playing: Option<Arc<dyn NowPlayingCenter>>,
    pub interruptions: Option<Arc<dyn InterruptionSource>>,
    pub event_bus: Option<EventBus>,
}

impl SessionDeps {
    pub fn new(download_client: Arc<DownloadClient>, adapter: Arc<dyn PlaybackAdapter>) -> Self {
        Self {
            download_client,
            adapter,
            now_playing: None,
            interruptions: None,
            event_bus: None,
        }
    }

    pub fn with_now_playing(mut self, center: Arc<dyn NowPlayingCenter>) -> Self {
        self.now_playing = Some(center);
        self
    }

    pub fn with_interruption_source(mut self, source: Arc<dyn InterruptionSource>) -> Self {
        self.interruptions = Some(source);
        self
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }
}

/// Owner of a single narrated item's playback.
///
/// Dropping the session tears it down like [`stop`](Self::stop).
pub struct PlaybackSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    deps: SessionDeps,
    settings: SessionSettings,
    core: Mutex<SessionCore>,
    snapshot: watch::Sender<SessionSnapshot>,
    tasks: parking_lot::Mutex<SessionTasks>,
    generation: AtomicU64,
}

struct SessionCore {
    state: PlaybackState,
    item: Option<NarrationItem>,
    player: Option<PlaybackSessionId>,
    time_elapsed: Duration,
    duration: Duration,
    duration_known: bool,
    scrub: ScrubState,
}

impl Default for SessionCore {
    fn default() -> Self {
        Self {
            state: PlaybackState::Stopped,
            item: None,
            player: None,
            time_elapsed: Duration::ZERO,
            duration: DURATION_SENTINEL,
            duration_known: false,
            scrub: ScrubState::Reset,
        }
    }
}

impl SessionCore {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            item: self.item.clone(),
            time_elapsed: self.time_elapsed,
            duration: self.duration,
            time_elapsed_string: format_time(self.time_elapsed),
            duration_string: format_time(self.duration),
            scrub_state: self.scrub,
        }
    }

    fn content_id(&self) -> String {
        self.item
            .as_ref()
            .map(|item| item.id.to_string())
            .unwrap_or_default()
    }
}

#[derive(Default)]
struct SessionTasks {
    download: Option<JoinHandle<()>>,
    timer: Option<JoinHandle<()>>,
    interruptions: Option<JoinHandle<()>>,
    player_events: Option<JoinHandle<()>>,
}

impl SessionTasks {
    fn abort_all(self) {
        for handle in [
            self.download,
            self.timer,
            self.interruptions,
            self.player_events,
        ]
        .into_iter()
        .flatten()
        {
            handle.abort();
        }
    }
}

impl PlaybackSession {
    /// Progress intervals shorter than [`MIN_PROGRESS_INTERVAL`] are raised to
    /// it.
    pub fn new(deps: SessionDeps, mut settings: SessionSettings) -> Self {
        if settings.progress_interval < MIN_PROGRESS_INTERVAL {
            warn!(
                "Progress interval {:?} is too short; using {:?}",
                settings.progress_interval, MIN_PROGRESS_INTERVAL
            );
            settings.progress_interval = MIN_PROGRESS_INTERVAL;
        }
        let (snapshot, _) = watch::channel(SessionSnapshot::default());
        Self {
            inner: Arc::new(SessionInner {
                deps,
                settings,
                core: Mutex::new(SessionCore::default()),
                snapshot,
                tasks: parking_lot::Mutex::new(SessionTasks::default()),
                generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn voice(&self) -> &Voice {
        &self.inner.settings.voice
    }

    /// Latest published state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.snapshot.borrow().clone()
    }

    /// Receiver notified on every observable change.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.snapshot.subscribe()
    }

    pub fn state(&self) -> PlaybackState {
        self.inner.snapshot.borrow().state
    }

    pub fn item(&self) -> Option<NarrationItem> {
        self.inner.snapshot.borrow().item.clone()
    }

    pub fn time_elapsed(&self) -> Duration {
        self.inner.snapshot.borrow().time_elapsed
    }

    pub fn duration(&self) -> Duration {
        self.inner.snapshot.borrow().duration
    }

    pub fn time_elapsed_string(&self) -> String {
        self.inner.snapshot.borrow().time_elapsed_string.clone()
    }

    pub fn duration_string(&self) -> String {
        self.inner.snapshot.borrow().duration_string.clone()
    }

    pub fn is_loading_item(&self, id: &ContentId) -> bool {
        self.inner.snapshot.borrow().is_loading_item(id)
    }

    pub fn is_playing_item(&self, id: &ContentId) -> bool {
        self.inner.snapshot.borrow().is_playing_item(id)
    }

    /// Replace whatever is loaded with `item` and start resolving its audio.
    ///
    /// Returns once the session is `Loading`; playback starts in the
    /// background when the audio is ready.
    #[instrument(skip(self, item), fields(content_id = %item.id))]
    pub async fn play(&self, item: NarrationItem) {
        let inner = &self.inner;
        let mut core = inner.core.lock().await;
        inner.teardown(&mut core, None).await;

        let generation = inner.generation.load(Ordering::SeqCst);
        info!("Loading narration");
        core.item = Some(item.clone());
        core.state = PlaybackState::Loading;
        inner.publish(&core);
        inner.emit(PlaybackEvent::Loading {
            content_id: item.id.to_string(),
        });

        let weak = Arc::downgrade(inner);
        let listener = match &inner.deps.interruptions {
            Some(source) => match source.subscribe().await {
                Ok(stream) => Some(spawn(listen_for_interruptions(
                    weak.clone(),
                    generation,
                    stream,
                ))),
                Err(e) => {
                    warn!("Failed to subscribe to audio interruptions: {}", e);
                    None
                }
            },
            None => None,
        };
        let download = spawn(resolve_and_start(weak, generation, item));

        let mut tasks = inner.tasks.lock();
        tasks.interruptions = listener;
        tasks.download = Some(download);
    }

    /// Cancel everything and return to `Stopped`. Safe to call repeatedly.
    #[instrument(skip(self))]
    pub async fn stop(&self) {
        self.inner.stop().await;
    }

    /// Pause the player. `false` when no player exists.
    pub async fn pause(&self) -> bool {
        let mut core = self.inner.core.lock().await;
        self.inner.pause_locked(&mut core).await
    }

    /// Resume the player. `false` when no player exists.
    pub async fn unpause(&self) -> bool {
        self.play_audio().await
    }

    pub async fn play_audio(&self) -> bool {
        let mut core = self.inner.core.lock().await;
        self.inner.resume_locked(&mut core).await
    }

    /// Seek to an absolute position. No-op without a player.
    pub async fn seek(&self, to: Duration) {
        let mut core = self.inner.core.lock().await;
        self.inner.seek_locked(&mut core, to).await;
    }

    /// Seek forward by `by`, stopping at the end of the item.
    pub async fn skip_forward(&self, by: Duration) {
        let mut core = self.inner.core.lock().await;
        let Some(position) = self.inner.current_position(&core).await else {
            return;
        };
        let mut target = position.saturating_add(by);
        if core.duration_known {
            target = target.min(core.duration);
        }
        self.inner.seek_locked(&mut core, target).await;
    }

    /// Seek backwards by `by`, stopping at the start of the item.
    pub async fn skip_backwards(&self, by: Duration) {
        let mut core = self.inner.core.lock().await;
        let Some(position) = self.inner.current_position(&core).await else {
            return;
        };
        self.inner
            .seek_locked(&mut core, position.saturating_sub(by))
            .await;
    }

    /// Apply a slider interaction.
    ///
    /// While `ScrubStarted` is active the progress timer leaves
    /// `time_elapsed` alone. `ScrubEnded(t)` seeks to `t` and resets.
    pub async fn set_scrub_state(&self, scrub: ScrubState) {
        let mut core = self.inner.core.lock().await;
        match scrub {
            ScrubState::Reset | ScrubState::ScrubStarted => {
                core.scrub = scrub;
                self.inner.publish(&core);
            }
            ScrubState::ScrubEnded(position) => {
                core.scrub = scrub;
                self.inner.seek_locked(&mut core, position).await;
                core.scrub = ScrubState::Reset;
                self.inner.publish(&core);
            }
        }
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        std::mem::take(&mut *self.inner.tasks.lock()).abort_all();

        // Player and now-playing cleanup are async; finish them in the
        // background when a runtime is around.
        if let Ok(handle) = Handle::try_current() {
            let inner = Arc::clone(&self.inner);
            handle.spawn(async move {
                inner.stop().await;
            });
        }
    }
}

impl SessionInner {
    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn publish(&self, core: &SessionCore) {
        let next = core.snapshot();
        self.snapshot.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    fn emit(&self, event: PlaybackEvent) {
        if let Some(bus) = &self.deps.event_bus {
            let _ = bus.emit(CoreEvent::Playback(event));
        }
    }

    async fn stop(&self) {
        let mut core = self.core.lock().await;
        self.teardown(&mut core, None).await;
    }

    /// Return to `Stopped`, reporting `error` to listeners when given.
    ///
    /// Task handles are aborted last: teardown may run on one of those tasks
    /// and must not cancel itself before cleanup is done.
    async fn teardown(&self, core: &mut SessionCore, error: Option<String>) {
        self.generation.fetch_add(1, Ordering::SeqCst);

        let previous = core.item.take();
        let was_active = previous.is_some() || core.state != PlaybackState::Stopped;

        if let Some(player) = core.player.take() {
            if let Err(e) = self.deps.adapter.unload(player).await {
                warn!("Failed to unload player: {}", e);
            }
        }

        *core = SessionCore::default();
        self.publish(core);
        self.clear_now_playing().await;

        let content_id = previous.map(|item| item.id.to_string());
        if let Some(message) = error {
            self.emit(PlaybackEvent::Error {
                content_id: content_id.clone(),
                message,
                recoverable: false,
            });
        }
        if was_active {
            debug!("Session stopped");
            self.emit(PlaybackEvent::Stopped { content_id });
        }

        std::mem::take(&mut *self.tasks.lock()).abort_all();
    }

    async fn start_player(
        self: &Arc<Self>,
        core: &mut SessionCore,
        generation: u64,
        item: &NarrationItem,
        source: AudioSource,
    ) {
        let remote = source.is_remote();
        let (events_tx, events_rx) = player_event_channel();
        let request = PlaybackRequest::new(source).with_metadata(PlaybackMetadata {
            content_id: Some(item.id.to_string()),
            title: Some(item.display_title().to_string()),
            artist: Some(item.display_author().to_string()),
        });

        let player = match self.deps.adapter.prepare(request, events_tx).await {
            Ok(player) => player,
            Err(e) => {
                warn!("Player could not be prepared: {}", e);
                self.teardown(core, Some(AUDIO_ERROR_MESSAGE.to_string()))
                    .await;
                return;
            }
        };
        core.player = Some(player);

        if let Err(e) = self.deps.adapter.play(player).await {
            warn!("Player refused to start: {}", e);
            self.teardown(core, Some(AUDIO_ERROR_MESSAGE.to_string()))
                .await;
            return;
        }

        core.state = PlaybackState::Playing;
        core.time_elapsed = Duration::ZERO;
        self.refresh_duration(core, player).await;
        self.publish(core);
        self.update_now_playing(core).await;

        info!(remote, "Narration playing");
        self.emit(PlaybackEvent::Started {
            content_id: item.id.to_string(),
            title: item.display_title().to_string(),
        });

        let weak = Arc::downgrade(self);
        let timer = spawn(run_progress_timer(
            weak.clone(),
            generation,
            self.settings.progress_interval,
        ));
        let pump = spawn(pump_player_events(weak, generation, events_rx));

        let mut tasks = self.tasks.lock();
        tasks.download = None;
        tasks.timer = Some(timer);
        tasks.player_events = Some(pump);
    }

    async fn pause_locked(&self, core: &mut SessionCore) -> bool {
        let Some(player) = core.player else {
            return false;
        };
        if let Err(e) = self.deps.adapter.pause(player).await {
            warn!("Failed to pause player: {}", e);
            return false;
        }

        core.state = PlaybackState::Paused;
        self.publish(core);
        self.emit(PlaybackEvent::Paused {
            content_id: core.content_id(),
            position_ms: millis(core.time_elapsed),
        });
        true
    }

    async fn resume_locked(&self, core: &mut SessionCore) -> bool {
        let Some(player) = core.player else {
            return false;
        };
        if let Err(e) = self.deps.adapter.play(player).await {
            warn!("Failed to resume player: {}", e);
            return false;
        }

        core.state = PlaybackState::Playing;
        self.publish(core);
        self.emit(PlaybackEvent::Resumed {
            content_id: core.content_id(),
            position_ms: millis(core.time_elapsed),
        });
        true
    }

    async fn seek_locked(&self, core: &mut SessionCore, to: Duration) {
        let Some(player) = core.player else {
            debug!("Seek ignored without a player");
            return;
        };
        if let Err(e) = self.deps.adapter.seek(player, to).await {
            warn!("Failed to seek to {:?}: {}", to, e);
            return;
        }

        core.time_elapsed = to;
        self.publish(core);
        self.update_now_playing(core).await;
        self.emit(PlaybackEvent::Seeked {
            content_id: core.content_id(),
            position_ms: millis(to),
        });
    }

    async fn current_position(&self, core: &SessionCore) -> Option<Duration> {
        let player = core.player?;
        match self.deps.adapter.get_position(player).await {
            Ok(position) => Some(position),
            Err(e) => {
                debug!("Falling back to last sampled position: {}", e);
                Some(core.time_elapsed)
            }
        }
    }

    async fn refresh_duration(&self, core: &mut SessionCore, player: PlaybackSessionId) {
        match self.deps.adapter.get_duration(player).await {
            Ok(Some(duration)) if !duration.is_zero() => {
                core.duration = duration;
                core.duration_known = true;
            }
            Ok(_) => {}
            Err(e) => debug!("Duration unavailable: {}", e),
        }
    }

    /// One progress tick. Returns `false` once the timer should stop.
    async fn sample_progress(&self, generation: u64) -> bool {
        let mut core = self.core.lock().await;
        if !self.is_current(generation) {
            return false;
        }
        if core.state != PlaybackState::Playing || core.scrub != ScrubState::Reset {
            return true;
        }
        let Some(player) = core.player else {
            return true;
        };

        match self.deps.adapter.get_position(player).await {
            Ok(position) => core.time_elapsed = position,
            Err(e) => {
                debug!("Position unavailable: {}", e);
                return true;
            }
        }
        self.refresh_duration(&mut core, player).await;
        self.publish(&core);
        self.update_now_playing(&core).await;
        self.emit(PlaybackEvent::PositionChanged {
            content_id: core.content_id(),
            position_ms: millis(core.time_elapsed),
            duration_ms: millis(core.duration),
        });
        true
    }

    /// Apply one player callback. Returns `false` once the pump should stop.
    async fn handle_player_event(&self, generation: u64, event: PlayerEvent) -> bool {
        let mut core = self.core.lock().await;
        if !self.is_current(generation) {
            return false;
        }
        let Some(player) = core.player else {
            return false;
        };

        match event {
            PlayerEvent::ReadyToPlay => {
                if core.state == PlaybackState::Playing {
                    if let Err(e) = self.deps.adapter.play(player).await {
                        warn!("Failed to start ready player: {}", e);
                    }
                }
            }
            PlayerEvent::DownloadProgress {
                bytes_downloaded,
                total_bytes,
            } => {
                self.emit(PlaybackEvent::Buffering {
                    content_id: core.content_id(),
                    bytes_downloaded,
                    total_bytes,
                });
            }
            PlayerEvent::DownloadFinished { bytes } => {
                debug!("Stream fully buffered ({} bytes)", bytes);
            }
            PlayerEvent::Stalled => {
                warn!("Playback stalled");
                self.emit(PlaybackEvent::Stalled {
                    content_id: core.content_id(),
                });
            }
            PlayerEvent::Finished => {
                if let Err(e) = self.deps.adapter.pause(player).await {
                    debug!("Pause at end of item failed: {}", e);
                }
                if let Err(e) = self.deps.adapter.seek(player, Duration::ZERO).await {
                    debug!("Rewind at end of item failed: {}", e);
                }
                core.state = PlaybackState::Paused;
                core.time_elapsed = Duration::ZERO;
                self.publish(&core);
                self.update_now_playing(&core).await;
                info!("Narration finished");
                self.emit(PlaybackEvent::Completed {
                    content_id: core.content_id(),
                });
            }
            PlayerEvent::Failed { message } => {
                warn!("Player failed: {}", message);
                self.teardown(&mut core, Some(AUDIO_ERROR_MESSAGE.to_string()))
                    .await;
                return false;
            }
        }
        true
    }

    async fn handle_interruption(&self, generation: u64, interruption: AudioInterruption) {
        let mut core = self.core.lock().await;
        if !self.is_current(generation) {
            return;
        }

        let (changed, active) = match interruption {
            AudioInterruption::Began => (self.pause_locked(&mut core).await, true),
            AudioInterruption::Ended {
                should_resume: true,
            } => (self.resume_locked(&mut core).await, false),
            AudioInterruption::Ended {
                should_resume: false,
            } => {
                debug!("Interruption ended without resume hint; staying paused");
                (false, false)
            }
        };

        if changed {
            self.emit(PlaybackEvent::Interrupted {
                content_id: core.content_id(),
                active,
            });
        }
    }

    async fn update_now_playing(&self, core: &SessionCore) {
        let (Some(center), Some(item)) = (&self.deps.now_playing, &core.item) else {
            return;
        };
        let info = NowPlayingInfo {
            title: item.display_title().to_string(),
            artist: item.display_author().to_string(),
            duration: core.duration,
            elapsed: core.time_elapsed,
        };
        if let Err(e) = center.update(info).await {
            debug!("Failed to update now playing info: {}", e);
        }
    }

    async fn clear_now_playing(&self) {
        if let Some(center) = &self.deps.now_playing {
            if let Err(e) = center.clear().await {
                debug!("Failed to clear now playing info: {}", e);
            }
        }
    }
}

/// Resolve the item's audio, then start the player unless the session moved on.
async fn resolve_and_start(weak: Weak<SessionInner>, generation: u64, item: NarrationItem) {
    let (client, settings) = match weak.upgrade() {
        Some(inner) => (
            Arc::clone(&inner.deps.download_client),
            inner.settings.clone(),
        ),
        None => return,
    };

    let resolved = resolve_source(&client, &settings, &item.id).await;

    let Some(inner) = weak.upgrade() else {
        return;
    };
    let mut core = inner.core.lock().await;
    let still_wanted = core.item.as_ref().map(|current| &current.id) == Some(&item.id);
    if !inner.is_current(generation) || !still_wanted {
        debug!("Discarding audio for superseded item {}", item.id);
        return;
    }

    match resolved {
        Ok(source) => {
            inner
                .start_player(&mut core, generation, &item, source)
                .await
        }
        Err(e) => {
            if e.is_transient() {
                warn!("No audio for {} yet: {}", item.id, e);
            } else {
                error!("No audio for {}: {}", item.id, e);
            }
            inner.teardown(&mut core, Some(user_message(&e))).await;
        }
    }
}

async fn resolve_source(
    client: &DownloadClient,
    settings: &SessionSettings,
    content_id: &ContentId,
) -> Result<AudioSource, PlaybackError> {
    match settings.resource_policy {
        ResourcePolicy::StreamOnly => stream_source(settings).ok_or_else(|| {
            PlaybackError::AudioUnavailable("streaming endpoint not configured".to_string())
        }),
        ResourcePolicy::CacheFirst => {
            match client
                .fetch_audio(content_id, &settings.voice, DownloadPriority::High)
                .await
            {
                DownloadOutcome::Ready(path) => Ok(AudioSource::LocalFile { path }),
                DownloadOutcome::Pending => stream_source(settings).ok_or_else(|| {
                    DownloadError::new(
                        DownloadErrorKind::PendingNotReady,
                        "audio is still being generated",
                    )
                    .into()
                }),
                DownloadOutcome::Failed(e) => Err(e.into()),
            }
        }
    }
}

fn stream_source(settings: &SessionSettings) -> Option<AudioSource> {
    let url = settings.stream_url()?;
    info!(url = %redact_query_token(url.as_str()), "Streaming narration");
    Some(AudioSource::RemoteStream {
        url: url.to_string(),
        headers: HashMap::new(),
    })
}

fn user_message(error: &PlaybackError) -> String {
    match error {
        PlaybackError::Download(e) if e.kind == DownloadErrorKind::PendingNotReady => {
            AUDIO_PENDING_MESSAGE.to_string()
        }
        _ => AUDIO_ERROR_MESSAGE.to_string(),
    }
}

async fn run_progress_timer(weak: Weak<SessionInner>, generation: u64, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let Some(inner) = weak.upgrade() else {
            break;
        };
        if !inner.sample_progress(generation).await {
            break;
        }
    }
}

async fn pump_player_events(
    weak: Weak<SessionInner>,
    generation: u64,
    mut events: PlayerEventReceiver,
) {
    while let Some(event) = events.recv().await {
        let Some(inner) = weak.upgrade() else {
            break;
        };
        if !inner.handle_player_event(generation, event).await {
            break;
        }
    }
}

async fn listen_for_interruptions(
    weak: Weak<SessionInner>,
    generation: u64,
    mut stream: Box<dyn InterruptionStream>,
) {
    while let Some(interruption) = stream.next().await {
        let Some(inner) = weak.upgrade() else {
            break;
        };
        if !inner.is_current(generation) {
            break;
        }
        debug!("Audio interruption: {:?}", interruption);
        inner.handle_interruption(generation, interruption).await;
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
