//! # Scan Scheduler Unit Tests / 扫描调度器单元测试
//!
//! This module contains unit tests for the `scheduler.rs` module: same-key
//! coalescing, exactly-once notification, and global FIFO serialization
//! across keys.
//!
//! 此模块包含 `scheduler.rs` 模块的单元测试：同键合并、
//! 恰好一次通知以及跨键的全局 FIFO 序列化。

use cascade_runner::core::scheduler::ScanScheduler;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[cfg(test)]
mod single_flight_tests {
    use super::*;

    #[tokio::test]
    async fn test_job_runs_and_notifies() {
        let scheduler = ScanScheduler::new();
        let ran = Arc::new(AtomicUsize::new(0));
        let ran_clone = Arc::clone(&ran);

        let rx = scheduler
            .schedule("a", async move {
                ran_clone.fetch_add(1, Ordering::SeqCst);
            })
            .await;
        rx.await.expect("waiter must be notified");
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_same_key_coalesces_onto_one_job() {
        let scheduler = ScanScheduler::new();
        let ran = Arc::new(AtomicUsize::new(0));

        // The first job sleeps long enough for the second request to arrive
        // while it is active or queued.
        let ran_a = Arc::clone(&ran);
        let rx1 = scheduler
            .schedule("a", async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                ran_a.fetch_add(1, Ordering::SeqCst);
            })
            .await;
        let ran_b = Arc::clone(&ran);
        let rx2 = scheduler
            .schedule("a", async move {
                ran_b.fetch_add(1, Ordering::SeqCst);
            })
            .await;

        rx1.await.expect("first waiter notified");
        rx2.await.expect("second waiter notified");
        // The second job body never ran; its waiter rode on the first walk.
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_distinct_keys_run_serially_in_order() {
        let scheduler = ScanScheduler::new();
        let order = Arc::new(tokio::sync::Mutex::new(Vec::new()));

        let mut receivers = Vec::new();
        for key in ["a", "b", "c"] {
            let order = Arc::clone(&order);
            let rx = scheduler
                .schedule(key, async move {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    order.lock().await.push(key);
                })
                .await;
            receivers.push(rx);
        }
        for rx in receivers {
            rx.await.expect("waiter notified");
        }
        assert_eq!(*order.lock().await, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_scheduler_drains_and_accepts_new_work() {
        let scheduler = ScanScheduler::new();
        let ran = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let ran = Arc::clone(&ran);
            let rx = scheduler
                .schedule("a", async move {
                    ran.fetch_add(1, Ordering::SeqCst);
                })
                .await;
            rx.await.expect("waiter notified");
        }
        // Each round drained fully before the next was scheduled, so every
        // job ran on a fresh drain task.
        assert_eq!(ran.load(Ordering::SeqCst), 3);
    }
}
