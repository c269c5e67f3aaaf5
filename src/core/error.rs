//! # Error Taxonomy Module / 错误分类模块
//!
//! Structural errors surfaced by the resolution engine and the orchestrator.
//! Per-test and per-action failures are data (result records), never errors;
//! only malformed requests and unresolvable structure reach this taxonomy.
//!
//! 解析引擎和编排器抛出的结构性错误。
//! 每个测试和每个动作的失败是数据（结果记录），绝不是错误；
//! 只有畸形请求和无法解析的结构才会到达此分类。

use std::fmt;

/// The recoverable error taxonomy of the orchestration core.
/// 编排核心的可恢复错误分类。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorError {
    /// A named suite, module, or asset could not be resolved.
    /// Note: a merely-absent asset during fallback resolution is `Ok(None)`,
    /// not this error; this covers structurally unknown names.
    /// 无法解析指定的套件、模块或资产。
    AssetNotFound(String),
    /// The request shape was malformed (e.g. none of test/action/module/suite
    /// present). Surfaced immediately, never retried.
    /// 请求格式畸形。立即抛出，绝不重试。
    InvalidArguments(String),
    /// The orchestrator was invoked before an automation backend was attached.
    /// 在附加自动化后端之前调用了编排器。
    NoFrameworkStarted,
    /// A second run was requested while one is already in progress.
    /// 在一次运行仍在进行时请求了第二次运行。
    TestingInProgress,
}

impl fmt::Display for OrchestratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrchestratorError::AssetNotFound(what) => write!(f, "Asset not found: {what}"),
            OrchestratorError::InvalidArguments(what) => write!(f, "Invalid arguments: {what}"),
            OrchestratorError::NoFrameworkStarted => {
                write!(f, "No automation backend has been started")
            }
            OrchestratorError::TestingInProgress => write!(f, "Testing is already in progress"),
        }
    }
}

impl std::error::Error for OrchestratorError {}

impl OrchestratorError {
    /// Checks whether an `anyhow::Error` wraps an `AssetNotFound`.
    pub fn is_asset_not_found(err: &anyhow::Error) -> bool {
        matches!(
            err.downcast_ref::<OrchestratorError>(),
            Some(OrchestratorError::AssetNotFound(_))
        )
    }
}
