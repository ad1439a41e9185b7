//! # Component Settings
//!
//! Per-component views of [`CoreConfig`]. Each component takes only the values
//! it needs so it can be built and tested without a full configuration.

use core_runtime::config::{
    CoreConfig, ResourcePolicy, DEFAULT_DOWNLOAD_TIMEOUT, DEFAULT_PRELOAD_BASE_DELAY,
    DEFAULT_PRELOAD_MAX_ATTEMPTS, DEFAULT_PROGRESS_INTERVAL,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

use crate::types::Voice;

/// Settings for [`DownloadClient`](crate::download::DownloadClient).
#[derive(Debug, Clone)]
pub struct DownloadSettings {
    /// Base URL the `api/article/...` path is appended to.
    pub base_url: Url,
    /// Headers sent with every request.
    pub headers: HashMap<String, String>,
    /// Added as `Authorization: Bearer ...` unless `headers` already
    /// carries an authorization header.
    pub auth_token: Option<String>,
    /// Per-request deadline. Synthesis can be slow, so this is long.
    pub timeout: Duration,
}

impl DownloadSettings {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            headers: HashMap::new(),
            auth_token: None,
            timeout: DEFAULT_DOWNLOAD_TIMEOUT,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_core_config(config: &CoreConfig) -> Self {
        Self {
            base_url: config.server_base_url.clone(),
            headers: config.default_headers.clone(),
            auth_token: config.auth_token.clone(),
            timeout: config.download_timeout,
        }
    }

    /// Headers for one request, including the bearer token when applicable.
    pub fn request_headers(&self) -> HashMap<String, String> {
        let mut headers = self.headers.clone();
        let has_auth = headers
            .keys()
            .any(|key| key.eq_ignore_ascii_case("authorization"));
        if let (Some(token), false) = (&self.auth_token, has_auth) {
            headers.insert("Authorization".to_string(), format!("Bearer {}", token));
        }
        headers
    }
}

/// Settings for [`Preloader`](crate::preload::Preloader).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreloadSettings {
    /// Maximum download attempts per item, first round included.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Unit of the linear back-off between rounds.
    ///
    /// After the round with 0-based index `n` the orchestrator sleeps
    /// `n * base_delay`, so the first retry is immediate.
    #[serde(default = "default_base_delay")]
    pub base_delay: Duration,
}

impl Default for PreloadSettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay: default_base_delay(),
        }
    }
}

impl PreloadSettings {
    pub fn from_core_config(config: &CoreConfig) -> Self {
        Self {
            max_attempts: config.preload_max_attempts,
            base_delay: config.preload_base_delay,
        }
    }

    /// Delay before the round following the round with 0-based index `round`.
    pub fn delay_after_round(&self, round: u32) -> Duration {
        self.base_delay.saturating_mul(round)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be >= 1".to_string());
        }
        Ok(())
    }
}

fn default_max_attempts() -> u32 {
    DEFAULT_PRELOAD_MAX_ATTEMPTS
}

fn default_base_delay() -> Duration {
    DEFAULT_PRELOAD_BASE_DELAY
}

/// Settings for [`PlaybackSession`](crate::session::PlaybackSession).
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub voice: Voice,
    /// How often the session samples position and duration while playing.
    pub progress_interval: Duration,
    pub resource_policy: ResourcePolicy,
    /// Streaming endpoint used by [`ResourcePolicy::StreamOnly`] and as the
    /// fallback while the server is still synthesizing.
    pub streaming_url: Option<Url>,
    /// Bearer token appended to the streaming URL.
    pub auth_token: Option<String>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            voice: Voice::default(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            resource_policy: ResourcePolicy::default(),
            streaming_url: None,
            auth_token: None,
        }
    }
}

impl SessionSettings {
    pub fn from_core_config(config: &CoreConfig) -> Self {
        Self {
            voice: Voice::new(config.voice.clone()),
            progress_interval: config.progress_interval,
            resource_policy: config.resource_policy,
            streaming_url: config.streaming_url.clone(),
            auth_token: config.auth_token.clone(),
        }
    }

    pub fn with_voice(mut self, voice: impl Into<Voice>) -> Self {
        self.voice = voice.into();
        self
    }

    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn with_resource_policy(mut self, policy: ResourcePolicy) -> Self {
        self.resource_policy = policy;
        self
    }

    pub fn with_streaming(mut self, url: Url, token: impl Into<String>) -> Self {
        self.streaming_url = Some(url);
        self.auth_token = Some(token.into());
        self
    }

    /// `<streaming_url>?token=<token>&q=1`, or `None` when streaming is not
    /// configured.
    pub fn stream_url(&self) -> Option<Url> {
        let mut url = self.streaming_url.clone()?;
        let token = self.auth_token.as_deref()?;
        url.query_pairs_mut()
            .append_pair("token", token)
            .append_pair("q", "1");
        Some(url)
    }
}
