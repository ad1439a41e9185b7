//! # Cache Store
//!
//! Deterministic file layout for narration audio and the temp-write +
//! rename protocol that keeps canonical files complete.

use bridge_traits::{BridgeError, FileSystemAccess};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::{PlaybackError, Result};
use crate::types::{ContentId, Voice};

/// Sub-directory of the audio directory holding in-flight downloads.
pub const PARTIAL_DIRECTORY: &str = ".partial";

const AUDIO_EXTENSION: &str = "mp3";
const PARTIAL_EXTENSION: &str = "part";

/// File-backed narration cache.
pub struct CacheStore {
    fs: Arc<dyn FileSystemAccess>,
    audio_dir: PathBuf,
    partial_dir: PathBuf,
}

impl CacheStore {
    /// Create a store rooted at `audio_dir` without touching the filesystem.
    pub fn new(fs: Arc<dyn FileSystemAccess>, audio_dir: PathBuf) -> Self {
        let partial_dir = audio_dir.join(PARTIAL_DIRECTORY);
        Self {
            fs,
            audio_dir,
            partial_dir,
        }
    }

    /// Resolve `<documents>/<audio_directory>`, create it, and sweep temp
    /// files left behind by an interrupted run.
    #[instrument(skip(fs))]
    pub async fn open(fs: Arc<dyn FileSystemAccess>, audio_directory: &str) -> Result<Self> {
        let documents = fs.get_documents_directory().await.map_err(|e| {
            PlaybackError::CacheUnavailable(format!("Failed to get documents directory: {}", e))
        })?;

        let store = Self::new(fs, documents.join(audio_directory));
        store.prepare().await?;

        info!("Narration cache opened at {:?}", store.audio_dir);
        Ok(store)
    }

    /// Create the audio and temp directories and clear stale temp files.
    pub async fn prepare(&self) -> Result<()> {
        for dir in [&self.audio_dir, &self.partial_dir] {
            self.fs.create_dir_all(dir).await.map_err(|e| {
                PlaybackError::CacheUnavailable(format!("Failed to create {:?}: {}", dir, e))
            })?;
        }
        self.clear_partials().await?;
        Ok(())
    }

    pub fn audio_dir(&self) -> &Path {
        &self.audio_dir
    }

    /// Canonical file name for a `(content_id, voice)` pair.
    ///
    /// Both components are percent-encoded, so `+` only ever appears as the
    /// separator and distinct pairs never collide.
    pub fn file_name(content_id: &ContentId, voice: &Voice) -> String {
        format!(
            "{}+{}.{}",
            urlencoding::encode(content_id.as_str()),
            urlencoding::encode(voice.as_str()),
            AUDIO_EXTENSION
        )
    }

    /// Canonical cache path. Pure; performs no I/O.
    pub fn path(&self, content_id: &ContentId, voice: &Voice) -> PathBuf {
        self.audio_dir.join(Self::file_name(content_id, voice))
    }

    /// Whether a file exists at `path`. Errors count as "not there".
    pub async fn exists(&self, path: &Path) -> bool {
        match self.fs.exists(path).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!("Failed to check {:?}: {}", path, e);
                false
            }
        }
    }

    pub async fn is_cached(&self, content_id: &ContentId, voice: &Voice) -> bool {
        self.exists(&self.path(content_id, voice)).await
    }

    /// Fresh, unique temp path on the same volume as the canonical files.
    pub fn temp_path(&self) -> PathBuf {
        self.partial_dir
            .join(format!("{}.{}", Uuid::new_v4(), PARTIAL_EXTENSION))
    }

    /// Write `data` to a new temp file and return its path.
    ///
    /// A failed write leaves nothing behind.
    pub async fn write_temp(&self, data: Bytes) -> Result<PathBuf> {
        let temp = self.temp_path();
        debug!("Writing {} bytes to {:?}", data.len(), temp);

        if let Err(e) = self.fs.write_file(&temp, data).await {
            self.discard(&temp).await;
            return Err(PlaybackError::Storage(format!(
                "Failed to write temp file {:?}: {}",
                temp, e
            )));
        }
        Ok(temp)
    }

    /// Move a verified temp file to its canonical location.
    ///
    /// Any previous file at `final_path` is removed first. On failure the
    /// temp file is discarded and `final_path` holds either nothing or the
    /// previous complete file, never a partial one.
    #[instrument(skip(self))]
    pub async fn publish(&self, temp: &Path, final_path: &Path) -> Result<()> {
        match self.fs.delete_file(final_path).await {
            Ok(()) => debug!("Replaced existing cache file {:?}", final_path),
            Err(e) if is_not_found(&e) => {}
            Err(e) => debug!("Could not remove {:?} before publish: {}", final_path, e),
        }

        if let Err(e) = self.fs.rename(temp, final_path).await {
            self.discard(temp).await;
            return Err(PlaybackError::Storage(format!(
                "Failed to publish {:?}: {}",
                final_path, e
            )));
        }

        debug!("Published {:?}", final_path);
        Ok(())
    }

    /// Best-effort removal of a temp file.
    pub async fn discard(&self, temp: &Path) {
        match self.fs.delete_file(temp).await {
            Ok(()) => debug!("Discarded temp file {:?}", temp),
            Err(e) if is_not_found(&e) => {}
            Err(e) => warn!("Failed to discard temp file {:?}: {}", temp, e),
        }
    }

    /// Delete the cached file for one pair. Returns whether a file was removed.
    #[instrument(skip(self), fields(content_id = %content_id, voice = %voice))]
    pub async fn remove(&self, content_id: &ContentId, voice: &Voice) -> Result<bool> {
        let path = self.path(content_id, voice);
        match self.fs.delete_file(&path).await {
            Ok(()) => {
                info!("Removed cached narration {:?}", path);
                Ok(true)
            }
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) => Err(PlaybackError::Storage(format!(
                "Failed to remove {:?}: {}",
                path, e
            ))),
        }
    }

    /// Remove every file in the temp directory. Returns how many were removed.
    #[instrument(skip(self))]
    pub async fn clear_partials(&self) -> Result<usize> {
        if !self.exists(&self.partial_dir).await {
            return Ok(0);
        }

        let entries = self.fs.list_directory(&self.partial_dir).await.map_err(|e| {
            PlaybackError::Storage(format!("Failed to list {:?}: {}", self.partial_dir, e))
        })?;

        let mut cleared = 0;
        for entry in entries {
            match self.fs.delete_file(&entry).await {
                Ok(()) => cleared += 1,
                Err(e) => warn!("Failed to remove stale temp file {:?}: {}", entry, e),
            }
        }

        if cleared > 0 {
            info!("Cleared {} stale temp files", cleared);
        }
        Ok(cleared)
    }
}

fn is_not_found(err: &BridgeError) -> bool {
    matches!(err, BridgeError::Io(io) if io.kind() == std::io::ErrorKind::NotFound)
}
