//! Core service façade and bootstrap helpers.
//!
//! This crate wires a validated [`CoreConfig`] (host bridges plus tuning
//! values) into the narration core: one cache, one download client, one
//! preloader and one playback session sharing a single event bus. Desktop
//! apps typically enable the `desktop-shims` feature, which lets the config
//! builder fall back to the `bridge-desktop` HTTP client and filesystem.
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use core_service::NarrationService;
//!
//! let config = CoreConfig::builder()
//!     .server_base_url("https://api.example.com")
//!     .playback_adapter(player)
//!     .build()?;
//! let service = NarrationService::new(config).await?;
//!
//! service.preload(&ids).await;
//! service.play(item).await;
//! ```

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use core_async::sync::CancellationToken;
use core_playback::{
    CacheStore, ContentId, DownloadClient, DownloadOutcome, DownloadPriority, DownloadSettings,
    NarrationItem, PlaybackSession, PreloadReport, PreloadSettings, Preloader, SessionDeps,
    SessionSettings, Voice,
};
use core_runtime::config::CoreConfig;
use core_runtime::events::{EventBus, EventStream};
use tracing::{info, instrument};

/// Primary façade exposed to host applications.
pub struct NarrationService {
    config: CoreConfig,
    event_bus: EventBus,
    store: Arc<CacheStore>,
    download_client: Arc<DownloadClient>,
    preloader: Preloader,
    session: PlaybackSession,
    voice: Voice,
}

impl NarrationService {
    /// Validate `config`, open the cache and assemble the components.
    #[instrument(skip(config))]
    pub async fn new(config: CoreConfig) -> Result<Self> {
        config.validate()?;

        let event_bus = EventBus::new(config.event_buffer_size);
        let store = Arc::new(
            CacheStore::open(config.file_system.clone(), &config.audio_directory)
                .await
                .map_err(|e| CoreError::InitializationFailed(e.to_string()))?,
        );

        let download_client = Arc::new(
            DownloadClient::new(
                config.http_client.clone(),
                Arc::clone(&store),
                DownloadSettings::from_core_config(&config),
            )
            .with_event_bus(event_bus.clone()),
        );

        let preloader = Preloader::new(
            Arc::clone(&download_client),
            PreloadSettings::from_core_config(&config),
        )
        .with_event_bus(event_bus.clone());

        let mut deps = SessionDeps::new(
            Arc::clone(&download_client),
            config.playback_adapter.clone(),
        )
        .with_event_bus(event_bus.clone());
        if let Some(center) = &config.now_playing {
            deps = deps.with_now_playing(center.clone());
        }
        if let Some(source) = &config.interruption_source {
            deps = deps.with_interruption_source(source.clone());
        }
        let session = PlaybackSession::new(deps, SessionSettings::from_core_config(&config));

        info!(
            "Narration service ready (voice {}, policy {:?})",
            config.voice, config.resource_policy
        );

        Ok(Self {
            voice: Voice::new(config.voice.clone()),
            config,
            event_bus,
            store,
            download_client,
            preloader,
            session,
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn voice(&self) -> &Voice {
        &self.voice
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn subscribe_events(&self) -> EventStream {
        self.event_bus.stream()
    }

    pub fn cache(&self) -> &CacheStore {
        &self.store
    }

    pub fn download_client(&self) -> &DownloadClient {
        &self.download_client
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    /// Fetch one item with the configured voice.
    pub async fn fetch_audio(
        &self,
        content_id: &ContentId,
        priority: DownloadPriority,
    ) -> DownloadOutcome {
        self.download_client
            .fetch_audio(content_id, &self.voice, priority)
            .await
    }

    pub async fn preload(&self, content_ids: &[ContentId]) -> bool {
        self.preloader.preload(content_ids, &self.voice).await
    }

    pub async fn preload_with_cancel(
        &self,
        content_ids: &[ContentId],
        cancel: &CancellationToken,
    ) -> PreloadReport {
        self.preloader
            .preload_detailed(content_ids, &self.voice, cancel)
            .await
    }

    pub async fn is_cached(&self, content_id: &ContentId) -> bool {
        self.store.is_cached(content_id, &self.voice).await
    }

    /// Delete the cached audio for one item. Returns whether a file existed.
    pub async fn remove_cached(&self, content_id: &ContentId) -> Result<bool> {
        Ok(self.store.remove(content_id, &self.voice).await?)
    }

    pub async fn play(&self, item: NarrationItem) {
        self.session.play(item).await;
    }

    pub async fn stop(&self) {
        self.session.stop().await;
    }
}
