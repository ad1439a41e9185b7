//! Task spawning.
//!
//! Spawned futures must be `Send + 'static`; background work owned by a
//! playback session holds only weak references back to it.

pub use tokio::task::{spawn_blocking, yield_now, AbortHandle, JoinError, JoinHandle};

/// Spawns a future onto the current runtime.
///
/// # Panics
///
/// Panics when called outside a tokio runtime.
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::task::spawn(future)
}

/// Result type for awaited join handles.
pub type Result<T> = std::result::Result<T, JoinError>;
