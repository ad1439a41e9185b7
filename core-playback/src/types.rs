//! Domain types shared by the download, preload and session components.

use crate::error::DownloadError;
use core_runtime::config::DEFAULT_VOICE;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Title shown when an item carries no title of its own.
pub const FALLBACK_TITLE: &str = "Your Omnivore Article";
/// Artist shown when an item carries no author.
pub const FALLBACK_AUTHOR: &str = "Omnivore";

/// Opaque, stable identifier of a narrated content item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ContentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Synthesis voice name, part of the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Voice(String);

impl Voice {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Voice {
    fn default() -> Self {
        Self::new(DEFAULT_VOICE)
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Voice {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Priority hint forwarded to the synthesis service.
///
/// The client never reorders its own work by priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadPriority {
    Low,
    High,
}

impl DownloadPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadPriority::Low => "low",
            DownloadPriority::High => "high",
        }
    }
}

impl fmt::Display for DownloadPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Asset type segment of the download endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DownloadType {
    #[default]
    Mp3,
    SpeechMarks,
}

impl DownloadType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadType::Mp3 => "mp3",
            DownloadType::SpeechMarks => "speechMarks",
        }
    }
}

impl fmt::Display for DownloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The part of an article the audio core needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrationItem {
    pub id: ContentId,
    pub title: Option<String>,
    pub author: Option<String>,
}

impl NarrationItem {
    pub fn new(id: impl Into<ContentId>) -> Self {
        Self {
            id: id.into(),
            title: None,
            author: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn display_title(&self) -> &str {
        non_empty(self.title.as_deref()).unwrap_or(FALLBACK_TITLE)
    }

    pub fn display_author(&self) -> &str {
        non_empty(self.author.as_deref()).unwrap_or(FALLBACK_AUTHOR)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Result of a single download attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Verified audio is at the canonical cache path.
    Ready(PathBuf),
    /// Server is still synthesizing; try again later.
    Pending,
    Failed(DownloadError),
}

impl DownloadOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, DownloadOutcome::Ready(_))
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            DownloadOutcome::Ready(path) => Some(path),
            _ => None,
        }
    }
}
