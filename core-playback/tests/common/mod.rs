//! Shared fakes for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::{
    BridgeError, FileSystemAccess, HttpClient, HttpRequest, HttpResponse, PlaybackAdapter,
    PlaybackRequest, PlaybackSessionId, PlayerEvent, PlayerEventSender,
};
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// In-memory filesystem; keeps tests off the blocking pool so the paused
/// clock only advances when every task is idle.
#[derive(Default)]
pub struct MemoryFs {
    files: Mutex<BTreeMap<PathBuf, Bytes>>,
}

impl MemoryFs {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn contents(&self, path: &Path) -> Option<Bytes> {
        self.files.lock().get(path).cloned()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.lock().keys().cloned().collect()
    }
}

fn not_found(path: &Path) -> BridgeError {
    BridgeError::Io(io::Error::new(
        io::ErrorKind::NotFound,
        format!("{:?} not found", path),
    ))
}

#[async_trait]
impl FileSystemAccess for MemoryFs {
    async fn get_cache_directory(&self) -> Result<PathBuf> {
        Ok(PathBuf::from("/cache"))
    }

    async fn get_documents_directory(&self) -> Result<PathBuf> {
        Ok(PathBuf::from("/documents"))
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let files = self.files.lock();
        Ok(files.contains_key(path) || files.keys().any(|p| p.starts_with(path)))
    }

    async fn create_dir_all(&self, _path: &Path) -> Result<()> {
        Ok(())
    }

    async fn read_file(&self, path: &Path) -> Result<Bytes> {
        self.contents(path).ok_or_else(|| not_found(path))
    }

    async fn write_file(&self, path: &Path, data: Bytes) -> Result<()> {
        self.files.lock().insert(path.to_path_buf(), data);
        Ok(())
    }

    async fn delete_file(&self, path: &Path) -> Result<()> {
        self.files
            .lock()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| not_found(path))
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let mut files = self.files.lock();
        let data = files.remove(from).ok_or_else(|| not_found(from))?;
        files.insert(to.to_path_buf(), data);
        Ok(())
    }

    async fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>> {
        Ok(self
            .files
            .lock()
            .keys()
            .filter(|p| p.parent() == Some(path))
            .cloned()
            .collect())
    }
}

/// Scripted HTTP server keyed by content id. Each id answers with its queued
/// statuses in order and repeats the last one forever.
#[derive(Default)]
pub struct ScriptedHttp {
    scripts: Mutex<HashMap<String, VecDeque<u16>>>,
    calls: Mutex<Vec<String>>,
    body: Bytes,
}

impl ScriptedHttp {
    pub fn new(body: &'static [u8]) -> Self {
        Self {
            body: Bytes::from_static(body),
            ..Default::default()
        }
    }

    pub fn script(self, content_id: &str, statuses: &[u16]) -> Self {
        self.scripts
            .lock()
            .insert(content_id.to_string(), statuses.iter().copied().collect());
        self
    }

    /// Content ids requested, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn calls_for(&self, content_id: &str) -> usize {
        self.calls.lock().iter().filter(|c| *c == content_id).count()
    }
}

#[async_trait]
impl HttpClient for ScriptedHttp {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        // .../api/article/{id}/mp3/{priority}/{voice}
        let segments: Vec<&str> = request.url.rsplit('/').collect();
        let content_id = segments
            .get(3)
            .map(|s| s.to_string())
            .unwrap_or_default();
        self.calls.lock().push(content_id.clone());

        let status = {
            let mut scripts = self.scripts.lock();
            match scripts.get_mut(&content_id) {
                Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(200),
                Some(queue) => queue.front().copied().unwrap_or(200),
                None => 200,
            }
        };

        let response = HttpResponse::new(status);
        Ok(if status == 200 {
            response.with_body(self.body.clone())
        } else {
            response
        })
    }
}

/// Command observed by [`FakePlayer`].
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCall {
    Prepare(bridge_traits::AudioSource),
    Play,
    Pause,
    Seek(Duration),
    Unload,
}

#[derive(Default)]
struct FakePlayerState {
    calls: Vec<PlayerCall>,
    position: Duration,
    duration: Option<Duration>,
    events: Option<PlayerEventSender>,
    fail_prepare: bool,
}

/// Recording playback adapter with a settable position.
#[derive(Default)]
pub struct FakePlayer {
    state: Mutex<FakePlayerState>,
}

impl FakePlayer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_duration(duration: Duration) -> Arc<Self> {
        let player = Self::default();
        player.state.lock().duration = Some(duration);
        Arc::new(player)
    }

    pub fn failing() -> Arc<Self> {
        let player = Self::default();
        player.state.lock().fail_prepare = true;
        Arc::new(player)
    }

    pub fn calls(&self) -> Vec<PlayerCall> {
        self.state.lock().calls.clone()
    }

    pub fn count(&self, call: &PlayerCall) -> usize {
        self.state.lock().calls.iter().filter(|c| *c == call).count()
    }

    pub fn set_position(&self, position: Duration) {
        self.state.lock().position = position;
    }

    /// Deliver a player callback to the session, as the host would.
    pub fn send(&self, event: PlayerEvent) -> bool {
        match &self.state.lock().events {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }
}

#[async_trait]
impl PlaybackAdapter for FakePlayer {
    async fn prepare(
        &self,
        request: PlaybackRequest,
        events: PlayerEventSender,
    ) -> Result<PlaybackSessionId> {
        let mut state = self.state.lock();
        state.calls.push(PlayerCall::Prepare(request.source));
        if state.fail_prepare {
            return Err(BridgeError::OperationFailed("decoder unavailable".into()));
        }
        state.events = Some(events);
        state.position = Duration::ZERO;
        Ok(PlaybackSessionId::new())
    }

    async fn play(&self, _session: PlaybackSessionId) -> Result<()> {
        self.state.lock().calls.push(PlayerCall::Play);
        Ok(())
    }

    async fn pause(&self, _session: PlaybackSessionId) -> Result<()> {
        self.state.lock().calls.push(PlayerCall::Pause);
        Ok(())
    }

    async fn seek(&self, _session: PlaybackSessionId, position: Duration) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(PlayerCall::Seek(position));
        state.position = position;
        Ok(())
    }

    async fn get_position(&self, _session: PlaybackSessionId) -> Result<Duration> {
        Ok(self.state.lock().position)
    }

    async fn get_duration(&self, _session: PlaybackSessionId) -> Result<Option<Duration>> {
        Ok(self.state.lock().duration)
    }

    async fn unload(&self, _session: PlaybackSessionId) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(PlayerCall::Unload);
        state.events = None;
        Ok(())
    }
}
