//! # Data Models Module / 数据模型模块
//!
//! This module defines the run request shape accepted by the orchestrator
//! and the immutable result records emitted at every execution level
//! (test, action, module, suite).
//!
//! 此模块定义了编排器接受的运行请求格式，
//! 以及在每个执行级别（测试、动作、模块、套件）发出的不可变结果记录。

use crate::infra::t;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// The public orchestration request. Exactly one of `test`, `action`,
/// `module`, `suite` must be present; dispatch priority is in that order.
///
/// 公共编排请求。`test`、`action`、`module`、`suite` 中必须恰好有一个存在；
/// 调度优先级按该顺序。
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub suite: Option<String>,
    pub module: Option<String>,
    pub test: Option<String>,
    pub action: Option<String>,
    /// Restricts a suite run to these modules. Unknown names fail the run.
    /// 将套件运行限制为这些模块。未知名称会使运行失败。
    pub modules: Option<Vec<String>>,
    /// Half-open index range into a module's ordered test list.
    /// 模块有序测试列表的半开索引区间。
    pub range: Option<(usize, usize)>,
    /// Overrides the configured platform for this run.
    pub platform: Option<String>,
    /// Whether fallback resolution may consult the suite's `common` module.
    pub accept_common: bool,
    /// Whether fallback resolution may consult the `global` suite.
    pub accept_global: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            suite: None,
            module: None,
            test: None,
            action: None,
            modules: None,
            range: None,
            platform: None,
            accept_common: true,
            accept_global: true,
        }
    }
}

/// The execution level a result record was emitted at.
/// 结果记录发出时所处的执行级别。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportLevel {
    Action,
    Test,
    Module,
    Suite,
}

impl ReportLevel {
    pub fn label(&self) -> &'static str {
        match self {
            ReportLevel::Action => "action",
            ReportLevel::Test => "test",
            ReportLevel::Module => "module",
            ReportLevel::Suite => "suite",
        }
    }
}

/// Aggregated counters for one execution level. At the test level the unit
/// is an action; at the module level a test; at the suite level a module.
/// `stopped` counts units that never ran because the queue was halted.
///
/// 一个执行级别的聚合计数器。测试级别的单位是动作；
/// 模块级别是测试；套件级别是模块。
/// `stopped` 统计因队列中止而从未运行的单位。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub stopped: usize,
}

/// Captured failure aids associated with a result record.
/// 与结果记录关联的已捕获失败辅助信息。
#[derive(Debug, Clone, Default, Serialize)]
pub struct Artifacts {
    pub screenshot: Option<PathBuf>,
    pub trace: Option<PathBuf>,
}

/// The immutable result record emitted at the end of one execution level.
/// A `stopped` run was deliberately halted (interactive stop,
/// stop-on-failure); a failed run means assertions did not pass.
///
/// 在一个执行级别结束时发出的不可变结果记录。
/// `stopped` 表示运行被有意中止（交互式停止、失败即停）；
/// 失败表示断言未通过。
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub level: ReportLevel,
    pub name: String,
    pub suite: Option<String>,
    pub module: Option<String>,
    pub passed: bool,
    pub stopped: bool,
    pub duration: Duration,
    pub counts: Counts,
    /// Ordered, human-readable failure messages.
    /// 有序的、人类可读的失败消息。
    pub reasons: Vec<String>,
    pub artifacts: Artifacts,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn is_failure(&self) -> bool {
        !self.passed
    }

    /// Localized status string for display.
    /// 用于显示的本地化状态字符串。
    pub fn status_str(&self, locale: &str) -> String {
        if self.stopped {
            t!("report.status_stopped", locale = locale).to_string()
        } else if self.passed {
            t!("report.status_passed", locale = locale).to_string()
        } else {
            t!("report.status_failed", locale = locale).to_string()
        }
    }
}
