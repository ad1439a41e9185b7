//! # Download Client
//!
//! Turns `(content_id, voice, priority)` into verified audio on disk with
//! exactly one network request and no retries. Retrying is the caller's
//! business (see [`Preloader`](crate::preload::Preloader)).
//!
//! ```text
//! fetch_audio
//!   ├── canonical file exists ──────────────> Ready(path)
//!   ├── GET <base>/api/article/{id}/mp3/{priority}/{voice}
//!   │     ├── transport error / non-2xx ────> Failed
//!   │     ├── 202 Accepted ─────────────────> Pending
//!   │     └── 2xx + body
//!   │           ├── digest mismatch ────────> Failed(IntegrityMismatch)
//!   │           └── temp write + publish ───> Ready(path)
//! ```

use bridge_traits::{HttpClient, HttpRequest};
use core_runtime::events::{CoreEvent, DownloadEvent, EventBus};
use core_runtime::logging::strip_path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::cache::{CacheStore, ExpectedDigest, IntegrityVerifier};
use crate::config::DownloadSettings;
use crate::error::DownloadError;
use crate::types::{ContentId, DownloadOutcome, DownloadPriority, DownloadType, Voice};

pub struct DownloadClient {
    http: Arc<dyn HttpClient>,
    store: Arc<CacheStore>,
    settings: DownloadSettings,
    event_bus: Option<EventBus>,
}

impl DownloadClient {
    pub fn new(http: Arc<dyn HttpClient>, store: Arc<CacheStore>, settings: DownloadSettings) -> Self {
        Self {
            http,
            store,
            settings,
            event_bus: None,
        }
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    /// `<base>/api/article/{id}/{type}/{priority}/{voice}`, each segment
    /// percent-encoded.
    pub fn endpoint(
        &self,
        content_id: &ContentId,
        voice: &Voice,
        download_type: DownloadType,
        priority: DownloadPriority,
    ) -> Result<Url, DownloadError> {
        if content_id.as_str().is_empty() {
            return Err(DownloadError::invalid_endpoint("content id is empty"));
        }
        if voice.as_str().is_empty() {
            return Err(DownloadError::invalid_endpoint("voice is empty"));
        }

        let mut url = self.settings.base_url.clone();
        url.set_query(None);
        url.set_fragment(None);
        url.path_segments_mut()
            .map_err(|_| {
                DownloadError::invalid_endpoint(format!(
                    "{} cannot be used as a base URL",
                    self.settings.base_url
                ))
            })?
            .pop_if_empty()
            .extend([
                "api",
                "article",
                content_id.as_str(),
                download_type.as_str(),
                priority.as_str(),
                voice.as_str(),
            ]);
        Ok(url)
    }

    /// Make `(content_id, voice)` available locally, if possible.
    #[instrument(skip(self), fields(content_id = %content_id, voice = %voice, priority = %priority))]
    pub async fn fetch_audio(
        &self,
        content_id: &ContentId,
        voice: &Voice,
        priority: DownloadPriority,
    ) -> DownloadOutcome {
        let path = self.store.path(content_id, voice);
        if self.store.exists(&path).await {
            debug!("Narration already cached");
            self.emit(DownloadEvent::CacheHit {
                content_id: content_id.to_string(),
                voice: voice.to_string(),
            });
            return DownloadOutcome::Ready(path);
        }

        let url = match self.endpoint(content_id, voice, DownloadType::Mp3, priority) {
            Ok(url) => url,
            Err(e) => return self.fail(content_id, voice, e),
        };

        self.emit(DownloadEvent::Started {
            content_id: content_id.to_string(),
            voice: voice.to_string(),
            priority: priority.to_string(),
        });

        let request = HttpRequest::get(url.as_str())
            .headers(self.settings.request_headers())
            .timeout(self.settings.timeout);

        let response = match self.http.execute(request).await {
            Ok(response) => response,
            Err(e) => return self.fail(content_id, voice, DownloadError::transport(e.to_string())),
        };

        if !response.is_success() {
            return self.fail(content_id, voice, DownloadError::bad_status(response.status));
        }

        if response.is_accepted() {
            info!("Narration is still being generated");
            self.emit(DownloadEvent::Pending {
                content_id: content_id.to_string(),
                voice: voice.to_string(),
            });
            return DownloadOutcome::Pending;
        }

        if response.body.is_empty() {
            return self.fail(content_id, voice, DownloadError::empty_body(response.status));
        }

        let expected = ExpectedDigest::from_headers(&response);
        if expected.is_none() {
            debug!("Response carries no recognized digest; skipping verification");
        }
        if let Err(e) = IntegrityVerifier::check(&response.body, expected.as_ref()) {
            return self.fail(content_id, voice, e);
        }

        let bytes = response.body.len() as u64;
        let temp = match self.store.write_temp(response.body).await {
            Ok(temp) => temp,
            Err(e) => return self.fail(content_id, voice, DownloadError::storage(e.to_string())),
        };

        if let Err(e) = self.store.publish(&temp, &path).await {
            return self.fail(content_id, voice, DownloadError::storage(e.to_string()));
        }

        info!(
            file = %strip_path(&path.to_string_lossy()),
            "Downloaded {} bytes of narration", bytes
        );
        self.emit(DownloadEvent::Completed {
            content_id: content_id.to_string(),
            voice: voice.to_string(),
            bytes,
        });
        DownloadOutcome::Ready(path)
    }

    fn fail(&self, content_id: &ContentId, voice: &Voice, error: DownloadError) -> DownloadOutcome {
        warn!("Narration download failed: {}", error);
        self.emit(DownloadEvent::Failed {
            content_id: content_id.to_string(),
            voice: voice.to_string(),
            kind: error.kind.to_string(),
            message: error.detail.clone(),
        });
        DownloadOutcome::Failed(error)
    }

    fn emit(&self, event: DownloadEvent) {
        if let Some(bus) = &self.event_bus {
            let _ = bus.emit(CoreEvent::Download(event));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::{BridgeError, FileSystemAccess, HttpResponse};
    use bytes::Bytes;
    use std::path::{Path, PathBuf};

    struct NoHttp;

    #[async_trait]
    impl HttpClient for NoHttp {
        async fn execute(&self, _request: HttpRequest) -> bridge_traits::error::Result<HttpResponse> {
            Err(BridgeError::NotAvailable("offline".into()))
        }
    }

    struct NoFs;

    #[async_trait]
    impl FileSystemAccess for NoFs {
        async fn get_cache_directory(&self) -> bridge_traits::error::Result<PathBuf> {
            Ok(PathBuf::from("/cache"))
        }
        async fn get_documents_directory(&self) -> bridge_traits::error::Result<PathBuf> {
            Ok(PathBuf::from("/documents"))
        }
        async fn exists(&self, _path: &Path) -> bridge_traits::error::Result<bool> {
            Ok(false)
        }
        async fn create_dir_all(&self, _path: &Path) -> bridge_traits::error::Result<()> {
            Ok(())
        }
        async fn read_file(&self, _path: &Path) -> bridge_traits::error::Result<Bytes> {
            Ok(Bytes::new())
        }
        async fn write_file(&self, _path: &Path, _data: Bytes) -> bridge_traits::error::Result<()> {
            Ok(())
        }
        async fn delete_file(&self, _path: &Path) -> bridge_traits::error::Result<()> {
            Ok(())
        }
        async fn rename(&self, _from: &Path, _to: &Path) -> bridge_traits::error::Result<()> {
            Ok(())
        }
        async fn list_directory(&self, _path: &Path) -> bridge_traits::error::Result<Vec<PathBuf>> {
            Ok(Vec::new())
        }
    }

    fn client(base: &str) -> DownloadClient {
        let store = Arc::new(CacheStore::new(Arc::new(NoFs), PathBuf::from("/documents/audio")));
        DownloadClient::new(
            Arc::new(NoHttp),
            store,
            DownloadSettings::new(Url::parse(base).unwrap()),
        )
    }

    #[test]
    fn endpoint_layout() {
        let url = client("https://api.example.com")
            .endpoint(
                &ContentId::new("abc"),
                &Voice::default(),
                DownloadType::Mp3,
                DownloadPriority::High,
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/api/article/abc/mp3/high/en-US-JennyNeural"
        );
    }

    #[test]
    fn endpoint_keeps_base_path_and_encodes_segments() {
        let url = client("https://api.example.com/prefix/?x=1")
            .endpoint(
                &ContentId::new("a/b c"),
                &Voice::new("v"),
                DownloadType::Mp3,
                DownloadPriority::Low,
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/prefix/api/article/a%2Fb%20c/mp3/low/v"
        );
    }

    #[test]
    fn empty_id_is_invalid_endpoint() {
        let err = client("https://api.example.com")
            .endpoint(
                &ContentId::new(""),
                &Voice::default(),
                DownloadType::Mp3,
                DownloadPriority::Low,
            )
            .unwrap_err();
        assert_eq!(err.kind, crate::error::DownloadErrorKind::InvalidEndpoint);
    }

    #[test]
    fn non_base_url_is_invalid_endpoint() {
        let err = client("mailto:someone@example.com")
            .endpoint(
                &ContentId::new("abc"),
                &Voice::default(),
                DownloadType::Mp3,
                DownloadPriority::Low,
            )
            .unwrap_err();
        assert_eq!(err.kind, crate::error::DownloadErrorKind::InvalidEndpoint);
    }

    #[tokio::test]
    async fn transport_error_is_failed_outcome() {
        let outcome = client("https://api.example.com")
            .fetch_audio(&ContentId::new("abc"), &Voice::default(), DownloadPriority::High)
            .await;
        match outcome {
            DownloadOutcome::Failed(err) => {
                assert_eq!(err.kind, crate::error::DownloadErrorKind::NetworkTransport)
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }
}
