//! # Automation Backend Contract Module / 自动化后端契约模块
//!
//! The capability contract the orchestrator drives and the result
//! persistence contract it reports into. The concrete browser/device
//! drivers (Selenium, Puppeteer, Perfecto, Instruments) live outside this
//! crate; the in-tree `DryRunBackend` walks action lists without a device
//! so the pipeline can run end-to-end.
//!
//! 编排器驱动的能力契约及其报告的结果持久化契约。
//! 具体的浏览器/设备驱动（Selenium、Puppeteer、Perfecto、Instruments）
//! 位于此 crate 之外；树内的 `DryRunBackend` 在没有设备的情况下
//! 遍历动作列表，使流水线可以端到端运行。

use crate::core::models::RunReport;
use crate::core::run::TraceEntry;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Value, json};
use std::path::PathBuf;

/// The asynchronous capability contract of an automation backend.
/// All calls report errors through `Result`; an action error is recorded as
/// the test's failure reason, never a crash of the orchestrator.
///
/// 自动化后端的异步能力契约。
/// 所有调用通过 `Result` 报告错误；动作错误被记录为测试的失败原因，
/// 绝不会使编排器崩溃。
#[async_trait]
pub trait AutomationBackend: Send + Sync {
    async fn start(&self, options: &Value) -> Result<()>;
    async fn stop(&self) -> Result<()>;
    async fn restart(&self) -> Result<()>;

    /// Whether this backend requires an explicit app stop/restart cycle
    /// before every test (certain mobile backends do).
    /// 此后端是否要求在每次测试前进行显式的应用停止/重启循环
    /// （某些移动后端需要）。
    fn needs_restart(&self) -> bool {
        false
    }

    async fn navigate(&self, url: &str) -> Result<()>;
    async fn click(&self, elements: &Value, options: &Value) -> Result<()>;
    async fn set_value(&self, elements: &Value, options: &Value) -> Result<()>;
    async fn scroll_to_visible(&self, elements: &Value, options: &Value) -> Result<()>;
    async fn get_source_tree(&self) -> Result<Value>;
    async fn take_screenshot(&self, options: &Value) -> Result<PathBuf>;
}

/// Context handed to the result sink alongside a trace.
/// 与轨迹一起交给结果接收器的上下文。
#[derive(Debug, Clone)]
pub struct TraceContext {
    pub run_id: u64,
    pub suite: Option<String>,
    pub module: Option<String>,
    pub name: String,
}

/// The result persistence contract. The core calls it but does not define
/// a storage format.
/// 结果持久化契约。核心调用它，但不定义存储格式。
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn save_results(&self, report: &RunReport) -> Result<()>;
    async fn save_trace(&self, trace: &[TraceEntry], context: &TraceContext) -> Result<PathBuf>;
}

/// A backend that accepts every action without driving a device. Used by
/// the CLI when no device driver is attached, and by tests.
/// 一个不驱动设备即接受所有动作的后端。
/// 当未附加设备驱动时由 CLI 使用，也用于测试。
#[derive(Debug)]
pub struct DryRunBackend {
    screenshot_dir: PathBuf,
}

impl DryRunBackend {
    pub fn new(screenshot_dir: PathBuf) -> Self {
        Self { screenshot_dir }
    }
}

#[async_trait]
impl AutomationBackend for DryRunBackend {
    async fn start(&self, _options: &Value) -> Result<()> {
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        Ok(())
    }

    async fn restart(&self) -> Result<()> {
        Ok(())
    }

    async fn navigate(&self, _url: &str) -> Result<()> {
        Ok(())
    }

    async fn click(&self, _elements: &Value, _options: &Value) -> Result<()> {
        Ok(())
    }

    async fn set_value(&self, _elements: &Value, _options: &Value) -> Result<()> {
        Ok(())
    }

    async fn scroll_to_visible(&self, _elements: &Value, _options: &Value) -> Result<()> {
        Ok(())
    }

    async fn get_source_tree(&self) -> Result<Value> {
        Ok(json!({ "root": {} }))
    }

    async fn take_screenshot(&self, _options: &Value) -> Result<PathBuf> {
        let file = self
            .screenshot_dir
            .join(format!("screenshot-{}.png", Utc::now().timestamp_millis()));
        tokio::fs::create_dir_all(&self.screenshot_dir)
            .await
            .with_context(|| {
                format!(
                    "Failed to create screenshot directory: {}",
                    self.screenshot_dir.display()
                )
            })?;
        tokio::fs::write(&file, b"dry-run screenshot placeholder")
            .await
            .with_context(|| format!("Failed to write screenshot: {}", file.display()))?;
        Ok(file)
    }
}
