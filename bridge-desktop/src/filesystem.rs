//! File System Access Implementation using Tokio

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::FileSystemAccess,
};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

const APP_DIR: &str = "narration-audio-core";

/// Tokio-based file system implementation
///
/// Directories default to the platform locations reported by `dirs`, each
/// with an application subdirectory.
pub struct TokioFileSystem {
    cache_dir: PathBuf,
    documents_dir: PathBuf,
}

impl TokioFileSystem {
    pub fn new() -> Self {
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(APP_DIR);

        let documents_dir = dirs::document_dir()
            .or_else(dirs::data_dir)
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".local")
                    .join("share")
            })
            .join(APP_DIR);

        Self {
            cache_dir,
            documents_dir,
        }
    }

    /// Create a file system accessor rooted at custom directories.
    pub fn with_directories(cache_dir: PathBuf, documents_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            documents_dir,
        }
    }

    fn map_io_error(e: std::io::Error) -> BridgeError {
        BridgeError::Io(e)
    }

    async fn ensure_dir(&self, dir: &Path) -> Result<PathBuf> {
        if !fs::try_exists(dir).await.map_err(Self::map_io_error)? {
            fs::create_dir_all(dir).await.map_err(Self::map_io_error)?;
            debug!(path = ?dir, "Created directory");
        }
        Ok(dir.to_path_buf())
    }
}

impl Default for TokioFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileSystemAccess for TokioFileSystem {
    async fn get_cache_directory(&self) -> Result<PathBuf> {
        self.ensure_dir(&self.cache_dir).await
    }

    async fn get_documents_directory(&self) -> Result<PathBuf> {
        self.ensure_dir(&self.documents_dir).await
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        fs::try_exists(path).await.map_err(Self::map_io_error)
    }

    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).await.map_err(Self::map_io_error)?;
        debug!(path = ?path, "Created directory");
        Ok(())
    }

    async fn read_file(&self, path: &Path) -> Result<Bytes> {
        let data = fs::read(path).await.map_err(Self::map_io_error)?;
        debug!(path = ?path, size = data.len(), "Read file");
        Ok(Bytes::from(data))
    }

    async fn write_file(&self, path: &Path, data: Bytes) -> Result<()> {
        if let Some(parent) = path.parent() {
            self.create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(path).await.map_err(Self::map_io_error)?;
        file.write_all(data.as_ref())
            .await
            .map_err(Self::map_io_error)?;
        // Data must be durable before a later rename publishes it.
        file.sync_all().await.map_err(Self::map_io_error)?;

        debug!(path = ?path, size = data.len(), "Wrote file");
        Ok(())
    }

    async fn delete_file(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).await.map_err(Self::map_io_error)?;
        debug!(path = ?path, "Deleted file");
        Ok(())
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        fs::rename(from, to).await.map_err(Self::map_io_error)?;
        debug!(from = ?from, to = ?to, "Renamed file");
        Ok(())
    }

    async fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        let mut read_dir = fs::read_dir(path).await.map_err(Self::map_io_error)?;

        while let Some(entry) = read_dir.next_entry().await.map_err(Self::map_io_error)? {
            entries.push(entry.path());
        }

        debug!(path = ?path, count = entries.len(), "Listed directory");
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fs_in(dir: &tempfile::TempDir) -> TokioFileSystem {
        TokioFileSystem::with_directories(dir.path().join("cache"), dir.path().join("docs"))
    }

    #[tokio::test]
    async fn test_directories_are_created_on_demand() {
        let dir = tempfile::tempdir().unwrap();
        let fs = fs_in(&dir);

        let docs = fs.get_documents_directory().await.unwrap();
        assert_eq!(docs, dir.path().join("docs"));
        assert!(docs.is_dir());
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let fs = fs_in(&dir);
        let file = dir.path().join("nested").join("clip.mp3");

        let data = Bytes::from_static(b"ID3 fake mp3");
        fs.write_file(&file, data.clone()).await.unwrap();

        assert!(fs.exists(&file).await.unwrap());
        assert_eq!(fs.read_file(&file).await.unwrap(), data);
    }

    #[tokio::test]
    async fn test_rename_replaces_target() {
        let dir = tempfile::tempdir().unwrap();
        let fs = fs_in(&dir);
        let from = dir.path().join("a.part");
        let to = dir.path().join("a.mp3");

        fs.write_file(&to, Bytes::from_static(b"old")).await.unwrap();
        fs.write_file(&from, Bytes::from_static(b"new")).await.unwrap();
        fs.rename(&from, &to).await.unwrap();

        assert!(!fs.exists(&from).await.unwrap());
        assert_eq!(fs.read_file(&to).await.unwrap(), Bytes::from_static(b"new"));
    }

    #[tokio::test]
    async fn test_delete_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let fs = fs_in(&dir);

        let err = fs.delete_file(&dir.path().join("missing")).await.unwrap_err();
        match err {
            BridgeError::Io(io) => assert_eq!(io.kind(), std::io::ErrorKind::NotFound),
            other => panic!("unexpected error: {other}"),
        }
    }
}
