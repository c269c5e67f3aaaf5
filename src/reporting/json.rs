//! # JSON Result Sink Module / JSON 结果接收器模块
//!
//! A [`ResultSink`] that persists result records and interaction traces as
//! pretty-printed JSON files under a results directory.
//!
//! 将结果记录和交互轨迹作为格式化 JSON 文件持久化到结果目录的
//! [`ResultSink`]。

use crate::core::backend::{ResultSink, TraceContext};
use crate::core::models::RunReport;
use crate::core::run::TraceEntry;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;

/// Writes one file per record: `run-<level>-<name>-<millis>.json` for
/// reports, `trace-<run id>-<name>.json` for traces.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    async fn write_pretty<T: serde::Serialize>(&self, file_name: &str, value: &T) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create results directory: {}", self.dir.display()))?;
        let path = self.dir.join(file_name);
        let content =
            serde_json::to_string_pretty(value).context("Failed to serialize result record")?;
        tokio::fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write result file: {}", path.display()))?;
        Ok(path)
    }
}

#[async_trait]
impl ResultSink for JsonFileSink {
    async fn save_results(&self, report: &RunReport) -> Result<()> {
        let file_name = format!(
            "run-{}-{}-{}.json",
            report.level.label(),
            report.name,
            Utc::now().timestamp_millis()
        );
        self.write_pretty(&file_name, report).await?;
        Ok(())
    }

    async fn save_trace(&self, trace: &[TraceEntry], context: &TraceContext) -> Result<PathBuf> {
        let file_name = format!("trace-{}-{}.json", context.run_id, context.name);
        self.write_pretty(&file_name, &trace).await
    }
}
