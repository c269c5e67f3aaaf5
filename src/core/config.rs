//! # Runner Configuration Module / 运行器配置模块
//!
//! This module defines the explicit configuration struct passed into the
//! orchestrator and asset layer at construction time, loaded from a
//! `Cascade.toml` file.
//!
//! 此模块定义了在构造时传入编排器和资产层的显式配置结构体，
//! 从 `Cascade.toml` 文件加载。

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default name of the configuration file at a project root.
pub const DEFAULT_CONFIG_FILE: &str = "Cascade.toml";

/// Behavior switches for scanning and orchestration.
/// All fields have sensible defaults so a missing or partial configuration
/// file is never fatal.
///
/// 扫描和编排的行为开关。
/// 所有字段都有合理的默认值，因此配置文件缺失或不完整永远不是致命的。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// The language for the runner's output messages (e.g., "en", "zh-CN").
    /// 运行器输出消息的语言（例如 "en"、"zh-CN"）。
    pub language: String,
    /// The platform assets are resolved for when a request does not name one.
    /// 当请求未指定平台时解析资产所用的平台。
    pub platform: String,
    /// The active execution environment checked against `meta.environments`.
    /// 与 `meta.environments` 核对的活动执行环境。
    pub environment: String,
    /// When `true`, a failing test halts the remaining queue of its module
    /// immediately and the module ends with stopped semantics.
    /// 为 `true` 时，失败的测试立即中止其模块的剩余队列，模块以停止语义结束。
    pub stop_on_failure: bool,
    /// When `true`, every evaluated action is recorded into the run trace.
    /// 为 `true` 时，每个已评估的动作都会记录到运行轨迹中。
    pub trace_interactions: bool,
    /// When `true`, a failing test asks the backend for a screenshot artifact.
    /// 为 `true` 时，失败的测试会向后端请求截图产物。
    pub take_screenshot_on_failure: bool,
    /// Maximum directory depth the scanner descends to before pruning a
    /// branch with a warning. Fails safe on malformed project layouts.
    /// 扫描器在发出警告并剪枝前下降的最大目录深度。在畸形项目布局上安全失败。
    pub max_file_scan_depth: usize,
    /// Directory names the scanner skips entirely.
    /// 扫描器完全跳过的目录名称。
    pub ignore_test_directories: Vec<String>,
    /// Whether to install a recursive file watcher after loading a collection.
    /// 加载集合后是否安装递归文件监视器。
    pub watch: bool,
    /// Directory (relative to the project root) for result and trace files.
    /// 结果和轨迹文件的目录（相对于项目根目录）。
    pub results_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            platform: "web".to_string(),
            environment: "default".to_string(),
            stop_on_failure: false,
            trace_interactions: true,
            take_screenshot_on_failure: true,
            max_file_scan_depth: 8,
            ignore_test_directories: vec![
                ".git".to_string(),
                "node_modules".to_string(),
                "target".to_string(),
                "results".to_string(),
            ],
            watch: true,
            results_dir: PathBuf::from("results"),
        }
    }
}

/// Loads a `RunnerConfig` from a TOML file.
/// 从 TOML 文件加载 `RunnerConfig`。
pub fn load_runner_config(path: &Path) -> Result<RunnerConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: RunnerConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    Ok(config)
}
