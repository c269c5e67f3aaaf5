//! # Scan Scheduler Module / 扫描调度器模块
//!
//! A single-flight-per-key concurrency guard that serializes directory
//! scans. Directory walks can open hundreds of file descriptors;
//! uncoordinated concurrent walks (e.g. triggered by rapid successive
//! file-watch events) risk `EMFILE`. The scheduler guarantees:
//!
//! - at most one scan in flight per collection key at any time, with
//!   concurrent requests for that key coalescing onto the in-flight walk;
//! - a single global FIFO queue that drains one scan at a time
//!   system-wide, independent of how many collections exist.
//!
//! 按键单飞的并发保护，用于序列化目录扫描。
//! 目录遍历可能打开数百个文件描述符；
//! 不协调的并发遍历（例如由快速连续的文件监视事件触发）有 `EMFILE` 风险。
//! 调度器保证：每个集合键同时最多一个扫描在途，同键的并发请求
//! 合并到在途遍历上；一个全局 FIFO 队列在系统范围内一次排空一个扫描。

use futures::future::BoxFuture;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{Mutex, oneshot};

type ScanJob = BoxFuture<'static, ()>;

struct QueuedScan {
    key: String,
    job: ScanJob,
    waiters: Vec<oneshot::Sender<()>>,
}

struct ActiveScan {
    key: String,
    waiters: Vec<oneshot::Sender<()>>,
}

#[derive(Default)]
struct SchedulerState {
    active: Option<ActiveScan>,
    queue: VecDeque<QueuedScan>,
}

/// Owned scheduler instance with explicit state (active slot + FIFO queue),
/// injected into the registry and collections rather than held as a
/// module-level global.
/// 拥有显式状态（活动槽 + FIFO 队列）的调度器实例，
/// 注入到注册表和集合中，而不是作为模块级全局持有。
#[derive(Clone, Default)]
pub struct ScanScheduler {
    state: Arc<Mutex<SchedulerState>>,
}

impl ScanScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `job` under `key` and returns a completion receiver.
    ///
    /// If a scan for `key` is already in flight or queued, the receiver is
    /// attached to that scan and no second physical walk happens. Otherwise
    /// the job enters the global FIFO queue; queued jobs for different keys
    /// run back-to-back but never concurrently with each other.
    ///
    /// 在 `key` 下调度 `job` 并返回完成接收器。
    /// 如果该键的扫描已在途或已排队，接收器会附加到该扫描上，
    /// 不会发生第二次物理遍历。
    pub async fn schedule<F>(&self, key: &str, job: F) -> oneshot::Receiver<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let mut state = self.state.lock().await;

        if let Some(active) = state.active.as_mut() {
            if active.key == key {
                active.waiters.push(tx);
                return rx;
            }
        }
        if let Some(queued) = state.queue.iter_mut().find(|q| q.key == key) {
            queued.waiters.push(tx);
            return rx;
        }

        state.queue.push_back(QueuedScan {
            key: key.to_string(),
            job: Box::pin(job),
            waiters: vec![tx],
        });
        // The drain task exits whenever the queue empties; restart it only
        // when nothing is active and this push is the sole queued item.
        let start_drain = state.active.is_none() && state.queue.len() == 1;
        drop(state);

        if start_drain {
            self.spawn_drain();
        }
        rx
    }

    fn spawn_drain(&self) {
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            loop {
                let job = {
                    let mut guard = state.lock().await;
                    match guard.queue.pop_front() {
                        Some(queued) => {
                            guard.active = Some(ActiveScan {
                                key: queued.key,
                                waiters: queued.waiters,
                            });
                            queued.job
                        }
                        None => break,
                    }
                };

                job.await;

                let waiters = {
                    let mut guard = state.lock().await;
                    let waiters = guard
                        .active
                        .take()
                        .map(|active| active.waiters)
                        .unwrap_or_default();
                    if guard.queue.is_empty() {
                        // Breaking while holding no active slot lets the next
                        // `schedule` call observe an idle scheduler and spawn
                        // a fresh drain task.
                        drop(guard);
                        for tx in waiters {
                            let _ = tx.send(());
                        }
                        return;
                    }
                    waiters
                };
                for tx in waiters {
                    let _ = tx.send(());
                }
            }
        });
    }
}
