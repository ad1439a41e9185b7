//! Integration tests for the core-async facade.

use core_async::{runtime, sync, task, time};
use std::sync::Arc;

#[tokio::test]
async fn test_task_spawn() {
    let handle = task::spawn(async { 42 });
    assert_eq!(handle.await.unwrap(), 42);
}

#[tokio::test]
async fn test_abort_spawned_task() {
    let handle = task::spawn(async {
        time::sleep(time::Duration::from_secs(3600)).await;
    });
    handle.abort();
    let err = handle.await.unwrap_err();
    assert!(err.is_cancelled());
}

#[tokio::test(start_paused = true)]
async fn test_sleep_with_paused_clock() {
    let start = time::Instant::now();
    time::sleep(time::Duration::from_secs(4)).await;
    assert!(start.elapsed() >= time::Duration::from_secs(4));
}

#[tokio::test(start_paused = true)]
async fn test_timeout_failure() {
    let result = time::timeout(time::Duration::from_millis(10), async {
        time::sleep(time::Duration::from_millis(100)).await;
        42
    })
    .await;

    assert!(result.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_interval_ticks() {
    let mut interval = time::interval(time::Duration::from_secs(1));
    let start = time::Instant::now();

    // First tick completes immediately.
    interval.tick().await;
    for _ in 0..3 {
        interval.tick().await;
    }

    assert!(start.elapsed() >= time::Duration::from_secs(3));
}

#[tokio::test]
async fn test_mutex_across_tasks() {
    let counter = Arc::new(sync::Mutex::new(0));
    let mut handles = vec![];

    for _ in 0..10 {
        let counter = counter.clone();
        handles.push(task::spawn(async move {
            *counter.lock().await += 1;
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(*counter.lock().await, 10);
}

#[tokio::test]
async fn test_cancellation_token_wakes_waiter() {
    let token = sync::CancellationToken::new();
    let child = token.child_token();

    let waiter = task::spawn(async move {
        child.cancelled().await;
        "cancelled"
    });

    token.cancel();
    assert_eq!(waiter.await.unwrap(), "cancelled");
}

#[tokio::test]
async fn test_watch_channel_latest_value() {
    let (tx, mut rx) = sync::watch::channel(0);

    task::spawn(async move {
        for i in 1..=5 {
            tx.send(i).unwrap();
            task::yield_now().await;
        }
    });

    let mut last_value = 0;
    while rx.changed().await.is_ok() {
        last_value = *rx.borrow();
        if last_value >= 5 {
            break;
        }
    }

    assert_eq!(last_value, 5);
}

#[test]
fn test_block_on_runs_future() {
    let value = runtime::block_on(async { 7 }).unwrap();
    assert_eq!(value, 7);
}
