//! # Run Handle Module / 运行句柄模块
//!
//! A `Run` is the per-invocation value threaded through every nested level
//! of an execution (test → module → suite). It carries the trace buffer and
//! the cooperative stop signal so that cancellation and run-scoped
//! identifiers never rely on shared mutable globals.
//!
//! `Run` 是贯穿执行的每个嵌套级别（测试 → 模块 → 套件）的每次调用值。
//! 它携带轨迹缓冲区和协作式停止信号，
//! 使取消和运行范围的标识符永远不依赖共享的可变全局状态。

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tokio_util::sync::CancellationToken;

static NEXT_RUN_ID: AtomicU64 = AtomicU64::new(1);

/// Lifecycle state of one orchestrator invocation.
/// 一次编排器调用的生命周期状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunState {
    Running,
    /// An external signal asked the run to stop; honored between leaves,
    /// never mid-action.
    /// 外部信号请求停止运行；在叶子之间生效，绝不在动作中途生效。
    StopRequested,
    Stopped,
    Completed,
}

/// One timestamped entry of the run trace.
/// 运行轨迹中带时间戳的一条记录。
#[derive(Debug, Clone, Serialize)]
pub struct TraceEntry {
    pub at: DateTime<Utc>,
    pub label: String,
    pub detail: String,
}

/// Per-invocation handle: incrementing id, trace recorder, and cooperative
/// stop signaling.
/// 每次调用的句柄：递增 id、轨迹记录器和协作式停止信号。
#[derive(Debug)]
pub struct Run {
    pub id: u64,
    state: RwLock<RunState>,
    trace: Mutex<Vec<TraceEntry>>,
    cancel: CancellationToken,
}

impl Run {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            id: NEXT_RUN_ID.fetch_add(1, Ordering::Relaxed),
            state: RwLock::new(RunState::Running),
            trace: Mutex::new(Vec::new()),
            cancel: CancellationToken::new(),
        })
    }

    pub fn state(&self) -> RunState {
        *self.state.read().expect("run state lock poisoned")
    }

    /// Asks the run to stop after the current leaf completes.
    /// 请求运行在当前叶子完成后停止。
    pub fn request_stop(&self) {
        let mut state = self.state.write().expect("run state lock poisoned");
        if *state == RunState::Running {
            *state = RunState::StopRequested;
        }
        self.cancel.cancel();
    }

    pub fn stop_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Marks the run finished. `stopped` distinguishes a deliberate halt
    /// from a completed run.
    pub fn finish(&self, stopped: bool) {
        let mut state = self.state.write().expect("run state lock poisoned");
        *state = if stopped {
            RunState::Stopped
        } else {
            RunState::Completed
        };
    }

    /// Appends a timestamped entry to the trace buffer.
    pub fn record(&self, label: impl Into<String>, detail: impl Into<String>) {
        self.trace
            .lock()
            .expect("run trace lock poisoned")
            .push(TraceEntry {
                at: Utc::now(),
                label: label.into(),
                detail: detail.into(),
            });
    }

    /// Snapshot of the trace recorded so far.
    pub fn trace(&self) -> Vec<TraceEntry> {
        self.trace.lock().expect("run trace lock poisoned").clone()
    }

}
