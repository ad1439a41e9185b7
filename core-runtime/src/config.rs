//! # Core Configuration Module
//!
//! Builder-based configuration for the narration audio core.
//!
//! ## Overview
//!
//! [`CoreConfigBuilder`] collects the host bridges and tuning values and
//! validates them up front, so a misconfigured host fails at startup with an
//! actionable message instead of on the first download.
//!
//! ## Required
//!
//! - `server_base_url` - Origin of the synthesis API
//! - `PlaybackAdapter` - Host audio engine
//!
//! ## Optional (with platform defaults)
//!
//! - `HttpClient` - desktop default: reqwest
//! - `FileSystemAccess` - desktop default: tokio fs under the platform documents dir
//! - `NowPlayingCenter`, `InterruptionSource` - skipped when absent
//!
//! When the `desktop-shims` feature is enabled, the desktop defaults are
//! injected automatically if not provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .server_base_url("https://api.example.com")
//!     .playback_adapter(Arc::new(MyPlayer))
//!     .default_header("Authorization", token.clone())
//!     .auth_token(token)
//!     .streaming_url("https://stream.example.com/audio.mp3")
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{
    FileSystemAccess, HttpClient, InterruptionSource, NowPlayingCenter, PlaybackAdapter,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Voice used when the host does not pick one.
pub const DEFAULT_VOICE: &str = "en-US-JennyNeural";
/// Directory below the documents directory holding cached narration audio.
pub const DEFAULT_AUDIO_DIRECTORY: &str = "narration_audio";
/// Synthesis can take minutes for long articles.
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);
pub const DEFAULT_PRELOAD_MAX_ATTEMPTS: u32 = 6;
pub const DEFAULT_PRELOAD_BASE_DELAY: Duration = Duration::from_secs(2);
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(1);
/// Shortest progress sampling period a session accepts.
pub const MIN_PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

/// How a playback session obtains its audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourcePolicy {
    /// Download and verify into the cache, then play the local file. While
    /// the server is still synthesizing, fall back to the streaming endpoint
    /// when one is configured.
    #[default]
    CacheFirst,
    /// Always play from the streaming endpoint.
    StreamOnly,
}

/// Core configuration for the narration audio core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Origin of the synthesis API, e.g. `https://api.example.com`
    pub server_base_url: Url,
    /// Progressive MP3 endpoint; the session appends `?token=..&q=1`
    pub streaming_url: Option<Url>,
    /// Token used for the streaming endpoint
    pub auth_token: Option<String>,
    /// Headers sent with every download request
    pub default_headers: HashMap<String, String>,
    pub voice: String,
    /// Directory name below the documents directory
    pub audio_directory: String,
    pub download_timeout: Duration,
    pub preload_max_attempts: u32,
    pub preload_base_delay: Duration,
    pub progress_interval: Duration,
    pub resource_policy: ResourcePolicy,
    pub event_buffer_size: usize,

    pub http_client: Arc<dyn HttpClient>,
    pub file_system: Arc<dyn FileSystemAccess>,
    pub playback_adapter: Arc<dyn PlaybackAdapter>,
    pub now_playing: Option<Arc<dyn NowPlayingCenter>>,
    pub interruption_source: Option<Arc<dyn InterruptionSource>>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("server_base_url", &self.server_base_url.as_str())
            .field("streaming_url", &self.streaming_url.as_ref().map(Url::as_str))
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("default_headers", &self.default_headers.keys().collect::<Vec<_>>())
            .field("voice", &self.voice)
            .field("audio_directory", &self.audio_directory)
            .field("download_timeout", &self.download_timeout)
            .field("preload_max_attempts", &self.preload_max_attempts)
            .field("preload_base_delay", &self.preload_base_delay)
            .field("progress_interval", &self.progress_interval)
            .field("resource_policy", &self.resource_policy)
            .field("has_now_playing", &self.now_playing.is_some())
            .field("has_interruption_source", &self.interruption_source.is_some())
            .finish()
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates value ranges and cross-field consistency.
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.server_base_url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "Server base URL must use http or https, got '{}'",
                self.server_base_url.scheme()
            )));
        }

        if self.server_base_url.cannot_be_a_base() {
            return Err(Error::Config(
                "Server base URL cannot carry a path".to_string(),
            ));
        }

        if self.voice.trim().is_empty() {
            return Err(Error::Config("Voice cannot be empty".to_string()));
        }

        if self.audio_directory.trim().is_empty()
            || self.audio_directory.contains(['/', '\\'])
            || self.audio_directory == ".."
        {
            return Err(Error::Config(format!(
                "Audio directory must be a single path component, got '{}'",
                self.audio_directory
            )));
        }

        if self.download_timeout.is_zero() {
            return Err(Error::Config(
                "Download timeout must be greater than zero".to_string(),
            ));
        }

        if self.preload_max_attempts == 0 {
            return Err(Error::Config(
                "Preload max attempts must be at least 1".to_string(),
            ));
        }

        if self.progress_interval < MIN_PROGRESS_INTERVAL {
            return Err(Error::Config(
                "Progress interval must be at least 100ms".to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if self.resource_policy == ResourcePolicy::StreamOnly
            && (self.streaming_url.is_none() || self.auth_token.is_none())
        {
            return Err(Error::Config(
                "StreamOnly playback requires both streaming_url and auth_token. \
                 Set them or use ResourcePolicy::CacheFirst."
                    .to_string(),
            ));
        }

        Ok(())
    }
}

fn playback_adapter_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "PlaybackAdapter".to_string(),
        message: "A PlaybackAdapter implementation is required to play narration audio. \
                 Inject the host audio engine (AVPlayer, ExoPlayer, rodio, ...) with \
                 .playback_adapter()."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::with_timeout(timeout)
        .map_err(|e| Error::Internal(format!("Failed to create default HttpClient: {}", e)))?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(_timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    Err(Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "No HTTP client implementation provided. \
                 Desktop: enable the 'desktop-shims' feature. \
                 Mobile: inject the platform-native adapter with .http_client()."
            .to_string(),
    })
}

#[cfg(feature = "desktop-shims")]
fn provide_default_file_system() -> Result<Arc<dyn FileSystemAccess>> {
    Ok(Arc::new(bridge_desktop::TokioFileSystem::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_file_system() -> Result<Arc<dyn FileSystemAccess>> {
    Err(Error::CapabilityMissing {
        capability: "FileSystemAccess".to_string(),
        message: "No file system implementation provided. \
                 Desktop: enable the 'desktop-shims' feature. \
                 Mobile: inject sandboxed storage with .file_system()."
            .to_string(),
    })
}

/// Builder for [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    server_base_url: Option<String>,
    streaming_url: Option<String>,
    auth_token: Option<String>,
    default_headers: HashMap<String, String>,
    voice: Option<String>,
    audio_directory: Option<String>,
    download_timeout: Option<Duration>,
    preload_max_attempts: Option<u32>,
    preload_base_delay: Option<Duration>,
    progress_interval: Option<Duration>,
    resource_policy: ResourcePolicy,
    event_buffer_size: Option<usize>,
    http_client: Option<Arc<dyn HttpClient>>,
    file_system: Option<Arc<dyn FileSystemAccess>>,
    playback_adapter: Option<Arc<dyn PlaybackAdapter>>,
    now_playing: Option<Arc<dyn NowPlayingCenter>>,
    interruption_source: Option<Arc<dyn InterruptionSource>>,
}

impl CoreConfigBuilder {
    /// Sets the synthesis API origin (required).
    pub fn server_base_url(mut self, url: impl Into<String>) -> Self {
        self.server_base_url = Some(url.into());
        self
    }

    /// Sets the progressive streaming endpoint.
    pub fn streaming_url(mut self, url: impl Into<String>) -> Self {
        self.streaming_url = Some(url.into());
        self
    }

    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Adds a header sent with every download request.
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    pub fn voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    pub fn audio_directory(mut self, name: impl Into<String>) -> Self {
        self.audio_directory = Some(name.into());
        self
    }

    pub fn download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = Some(timeout);
        self
    }

    /// Total download attempts per item during a preload batch.
    pub fn preload_max_attempts(mut self, attempts: u32) -> Self {
        self.preload_max_attempts = Some(attempts);
        self
    }

    /// Delay unit between preload rounds; round `n` waits `n * delay`.
    pub fn preload_base_delay(mut self, delay: Duration) -> Self {
        self.preload_base_delay = Some(delay);
        self
    }

    pub fn progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = Some(interval);
        self
    }

    pub fn resource_policy(mut self, policy: ResourcePolicy) -> Self {
        self.resource_policy = policy;
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn file_system(mut self, fs: Arc<dyn FileSystemAccess>) -> Self {
        self.file_system = Some(fs);
        self
    }

    /// Sets the host audio engine (required).
    pub fn playback_adapter(mut self, adapter: Arc<dyn PlaybackAdapter>) -> Self {
        self.playback_adapter = Some(adapter);
        self
    }

    pub fn now_playing(mut self, center: Arc<dyn NowPlayingCenter>) -> Self {
        self.now_playing = Some(center);
        self
    }

    pub fn interruption_source(mut self, source: Arc<dyn InterruptionSource>) -> Self {
        self.interruption_source = Some(source);
        self
    }

    /// Builds and validates the final `CoreConfig`.
    ///
    /// # Errors
    ///
    /// - `Error::Config` for missing or out-of-range values
    /// - `Error::CapabilityMissing` when a required bridge is absent and no
    ///   platform default exists
    pub fn build(self) -> Result<CoreConfig> {
        let raw_base = self.server_base_url.ok_or_else(|| {
            Error::Config(
                "Server base URL is required. Use .server_base_url() to set it.".to_string(),
            )
        })?;
        let server_base_url = Url::parse(&raw_base)
            .map_err(|e| Error::Config(format!("Invalid server base URL '{}': {}", raw_base, e)))?;

        let streaming_url = self
            .streaming_url
            .map(|raw| {
                Url::parse(&raw)
                    .map_err(|e| Error::Config(format!("Invalid streaming URL '{}': {}", raw, e)))
            })
            .transpose()?;

        let playback_adapter = self
            .playback_adapter
            .ok_or_else(playback_adapter_missing_error)?;

        let download_timeout = self.download_timeout.unwrap_or(DEFAULT_DOWNLOAD_TIMEOUT);

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client(download_timeout)?,
        };

        let file_system = match self.file_system {
            Some(fs) => fs,
            None => provide_default_file_system()?,
        };

        let config = CoreConfig {
            server_base_url,
            streaming_url,
            auth_token: self.auth_token,
            default_headers: self.default_headers,
            voice: self.voice.unwrap_or_else(|| DEFAULT_VOICE.to_string()),
            audio_directory: self
                .audio_directory
                .unwrap_or_else(|| DEFAULT_AUDIO_DIRECTORY.to_string()),
            download_timeout,
            preload_max_attempts: self
                .preload_max_attempts
                .unwrap_or(DEFAULT_PRELOAD_MAX_ATTEMPTS),
            preload_base_delay: self
                .preload_base_delay
                .unwrap_or(DEFAULT_PRELOAD_BASE_DELAY),
            progress_interval: self.progress_interval.unwrap_or(DEFAULT_PROGRESS_INTERVAL),
            resource_policy: self.resource_policy,
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
            http_client,
            file_system,
            playback_adapter,
            now_playing: self.now_playing,
            interruption_source: self.interruption_source,
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::{
        HttpRequest, HttpResponse, PlaybackRequest, PlaybackSessionId, PlayerEventSender,
    };
    use bytes::Bytes;
    use std::path::{Path, PathBuf};

    struct NullHttp;

    #[async_trait]
    impl HttpClient for NullHttp {
        async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
            Ok(HttpResponse::new(204))
        }
    }

    struct NullFs;

    #[async_trait]
    impl FileSystemAccess for NullFs {
        async fn get_cache_directory(&self) -> BridgeResult<PathBuf> {
            Ok(PathBuf::from("/tmp"))
        }
        async fn get_documents_directory(&self) -> BridgeResult<PathBuf> {
            Ok(PathBuf::from("/tmp"))
        }
        async fn exists(&self, _path: &Path) -> BridgeResult<bool> {
            Ok(false)
        }
        async fn create_dir_all(&self, _path: &Path) -> BridgeResult<()> {
            Ok(())
        }
        async fn read_file(&self, _path: &Path) -> BridgeResult<Bytes> {
            Ok(Bytes::new())
        }
        async fn write_file(&self, _path: &Path, _data: Bytes) -> BridgeResult<()> {
            Ok(())
        }
        async fn delete_file(&self, _path: &Path) -> BridgeResult<()> {
            Ok(())
        }
        async fn rename(&self, _from: &Path, _to: &Path) -> BridgeResult<()> {
            Ok(())
        }
        async fn list_directory(&self, _path: &Path) -> BridgeResult<Vec<PathBuf>> {
            Ok(Vec::new())
        }
    }

    struct NullPlayer;

    #[async_trait]
    impl PlaybackAdapter for NullPlayer {
        async fn prepare(
            &self,
            _request: PlaybackRequest,
            _events: PlayerEventSender,
        ) -> BridgeResult<PlaybackSessionId> {
            Ok(PlaybackSessionId::new())
        }
        async fn play(&self, _session: PlaybackSessionId) -> BridgeResult<()> {
            Ok(())
        }
        async fn pause(&self, _session: PlaybackSessionId) -> BridgeResult<()> {
            Ok(())
        }
        async fn seek(&self, _session: PlaybackSessionId, _position: Duration) -> BridgeResult<()> {
            Ok(())
        }
        async fn get_position(&self, _session: PlaybackSessionId) -> BridgeResult<Duration> {
            Ok(Duration::ZERO)
        }
        async fn get_duration(&self, _session: PlaybackSessionId) -> BridgeResult<Option<Duration>> {
            Ok(None)
        }
        async fn unload(&self, _session: PlaybackSessionId) -> BridgeResult<()> {
            Ok(())
        }
    }

    fn complete_builder() -> CoreConfigBuilder {
        CoreConfig::builder()
            .server_base_url("https://api.example.com")
            .http_client(Arc::new(NullHttp))
            .file_system(Arc::new(NullFs))
            .playback_adapter(Arc::new(NullPlayer))
    }

    #[test]
    fn test_builder_applies_defaults() {
        let config = complete_builder().build().unwrap();

        assert_eq!(config.voice, DEFAULT_VOICE);
        assert_eq!(config.audio_directory, DEFAULT_AUDIO_DIRECTORY);
        assert_eq!(config.download_timeout, Duration::from_secs(600));
        assert_eq!(config.preload_max_attempts, 6);
        assert_eq!(config.preload_base_delay, Duration::from_secs(2));
        assert_eq!(config.progress_interval, Duration::from_secs(1));
        assert_eq!(config.resource_policy, ResourcePolicy::CacheFirst);
        assert_eq!(config.event_buffer_size, DEFAULT_EVENT_BUFFER_SIZE);
        assert!(config.now_playing.is_none());
    }

    #[test]
    fn test_builder_requires_server_base_url() {
        let result = CoreConfig::builder()
            .playback_adapter(Arc::new(NullPlayer))
            .build();

        match result {
            Err(Error::Config(message)) => assert!(message.contains("server_base_url")),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_builder_requires_playback_adapter() {
        let result = CoreConfig::builder()
            .server_base_url("https://api.example.com")
            .http_client(Arc::new(NullHttp))
            .file_system(Arc::new(NullFs))
            .build();

        match result {
            Err(Error::CapabilityMissing { capability, .. }) => {
                assert_eq!(capability, "PlaybackAdapter")
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_builder_rejects_invalid_urls() {
        assert!(matches!(
            complete_builder().server_base_url("not a url").build(),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            complete_builder().server_base_url("ftp://example.com").build(),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            complete_builder().streaming_url("::::").build(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_validate_rejects_out_of_range_values() {
        assert!(complete_builder().preload_max_attempts(0).build().is_err());
        assert!(complete_builder().download_timeout(Duration::ZERO).build().is_err());
        assert!(complete_builder()
            .progress_interval(Duration::from_millis(10))
            .build()
            .is_err());
        assert!(complete_builder().audio_directory("a/b").build().is_err());
        assert!(complete_builder().voice("  ").build().is_err());
        assert!(complete_builder().event_buffer_size(0).build().is_err());
    }

    #[test]
    fn test_stream_only_requires_streaming_endpoint() {
        let result = complete_builder()
            .resource_policy(ResourcePolicy::StreamOnly)
            .build();
        assert!(matches!(result, Err(Error::Config(_))));

        let config = complete_builder()
            .resource_policy(ResourcePolicy::StreamOnly)
            .streaming_url("https://stream.example.com/audio.mp3")
            .auth_token("tok")
            .build()
            .unwrap();
        assert_eq!(config.resource_policy, ResourcePolicy::StreamOnly);
    }

    #[test]
    fn test_debug_output_redacts_token() {
        let config = complete_builder().auth_token("super-secret").build().unwrap();
        let debug = format!("{:?}", config);

        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_desktop_defaults_fill_missing_bridges() {
        let config = CoreConfig::builder()
            .server_base_url("https://api.example.com")
            .playback_adapter(Arc::new(NullPlayer))
            .build();

        assert!(config.is_ok());
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_missing_http_client_without_desktop_shims() {
        let result = CoreConfig::builder()
            .server_base_url("https://api.example.com")
            .file_system(Arc::new(NullFs))
            .playback_adapter(Arc::new(NullPlayer))
            .build();

        assert!(matches!(
            result,
            Err(Error::CapabilityMissing { ref capability, .. }) if capability == "HttpClient"
        ));
    }
}
