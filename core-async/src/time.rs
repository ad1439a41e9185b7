//! Time utilities.
//!
//! Re-exports tokio timers so that tests can drive them with a paused clock
//! (`tokio::time::pause` / `advance`).

pub use std::time::{Duration, SystemTime, UNIX_EPOCH};
pub use tokio::time::{
    interval, sleep, sleep_until, timeout, Instant, Interval, MissedTickBehavior, Sleep, Timeout,
};

/// Error returned by [`timeout`] when the deadline elapses first.
pub use tokio::time::error::Elapsed as TimeoutError;
