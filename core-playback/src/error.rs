//! # Playback Error Types
//!
//! Error types for narration download, caching and session control.

use bridge_traits::BridgeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Coarse classification of a failed download attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadErrorKind {
    /// DNS, TLS, socket or deadline failure below HTTP.
    NetworkTransport,
    /// Server answered with a non-2xx status, or a 2xx without payload.
    BadStatus,
    /// Server accepted the request but the audio is still being synthesized.
    PendingNotReady,
    /// Payload digest did not match the digest advertised by the server.
    IntegrityMismatch,
    /// Payload could not be written or published into the cache.
    StorageWrite,
    /// Endpoint URL could not be assembled from the configured base.
    InvalidEndpoint,
}

impl DownloadErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadErrorKind::NetworkTransport => "network_transport",
            DownloadErrorKind::BadStatus => "bad_status",
            DownloadErrorKind::PendingNotReady => "pending_not_ready",
            DownloadErrorKind::IntegrityMismatch => "integrity_mismatch",
            DownloadErrorKind::StorageWrite => "storage_write",
            DownloadErrorKind::InvalidEndpoint => "invalid_endpoint",
        }
    }

    /// Whether trying the same request later can reasonably succeed.
    ///
    /// Integrity mismatches count as retryable: a truncated transfer is the
    /// usual cause.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DownloadErrorKind::NetworkTransport
                | DownloadErrorKind::BadStatus
                | DownloadErrorKind::PendingNotReady
                | DownloadErrorKind::IntegrityMismatch
        )
    }
}

impl fmt::Display for DownloadErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed download attempt: what went wrong and the details.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {detail}")]
pub struct DownloadError {
    pub kind: DownloadErrorKind,
    pub detail: String,
}

impl DownloadError {
    pub fn new(kind: DownloadErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn transport(detail: impl Into<String>) -> Self {
        Self::new(DownloadErrorKind::NetworkTransport, detail)
    }

    pub fn bad_status(status: u16) -> Self {
        Self::new(
            DownloadErrorKind::BadStatus,
            format!("server returned HTTP {}", status),
        )
    }

    pub fn empty_body(status: u16) -> Self {
        Self::new(
            DownloadErrorKind::BadStatus,
            format!("server returned HTTP {} without a body", status),
        )
    }

    pub fn integrity(algorithm: &str, expected: &str, computed: &str) -> Self {
        Self::new(
            DownloadErrorKind::IntegrityMismatch,
            format!(
                "{} digest mismatch (expected {}, computed {})",
                algorithm, expected, computed
            ),
        )
    }

    pub fn storage(detail: impl Into<String>) -> Self {
        Self::new(DownloadErrorKind::StorageWrite, detail)
    }

    pub fn invalid_endpoint(detail: impl Into<String>) -> Self {
        Self::new(DownloadErrorKind::InvalidEndpoint, detail)
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Cache Errors
    // ========================================================================
    /// Reading, writing or publishing a cache file failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Cache directory could not be resolved or created.
    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    // ========================================================================
    // Download Errors
    // ========================================================================
    #[error("Download failed: {0}")]
    Download(#[from] DownloadError),

    // ========================================================================
    // Session Errors
    // ========================================================================
    /// Attempted operation when no item is loaded.
    #[error("No item loaded")]
    NoItemLoaded,

    /// No audio resource could be resolved for the item.
    #[error("Audio unavailable: {0}")]
    AudioUnavailable(String),

    /// Operation was cancelled before completion.
    #[error("Operation cancelled")]
    Cancelled,

    // ========================================================================
    // Platform/Adapter Errors
    // ========================================================================
    /// Host bridge reported a failure.
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlaybackError {
    /// Returns `true` if this error is transient and the operation can be retried.
    pub fn is_transient(&self) -> bool {
        match self {
            PlaybackError::Download(err) => err.is_retryable(),
            PlaybackError::Bridge(err) => err.is_transport(),
            _ => false,
        }
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_kinds() {
        assert!(DownloadErrorKind::NetworkTransport.is_retryable());
        assert!(DownloadErrorKind::PendingNotReady.is_retryable());
        assert!(!DownloadErrorKind::StorageWrite.is_retryable());
        assert!(!DownloadErrorKind::InvalidEndpoint.is_retryable());
    }

    #[test]
    fn download_error_display_includes_kind() {
        let err = DownloadError::bad_status(500);
        assert_eq!(err.to_string(), "bad_status: server returned HTTP 500");
    }

    #[test]
    fn playback_error_classification() {
        let err = PlaybackError::from(DownloadError::transport("connection reset"));
        assert!(err.is_transient());

        let err = PlaybackError::Storage("disk full".into());
        assert!(!err.is_transient());
    }
}
