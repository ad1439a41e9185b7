//! Async facade for the narration audio core.
//!
//! Every `core-*` and `bridge-*` crate goes through this crate for task
//! spawning, timers, synchronization and cancellation instead of naming tokio
//! directly. Swapping the executor then only touches this crate.
//!
//! # Modules
//!
//! - `task`: task spawning and join handles
//! - `time`: sleep, interval, timeout, durations
//! - `sync`: async locks, channels, cancellation tokens
//! - `runtime`: blocking entry points for synchronous hosts
//!
//! # Examples
//!
//! ```rust
//! use core_async::task;
//! use core_async::time::{sleep, Duration};
//!
//! async fn example() {
//!     let handle = task::spawn(async {
//!         sleep(Duration::from_millis(10)).await;
//!         42
//!     });
//!     assert_eq!(handle.await.unwrap(), 42);
//! }
//! ```

pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;

pub use sync::CancellationToken;
pub use task::spawn;
pub use time::{sleep, Duration, Instant};
