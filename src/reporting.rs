//! # Reporting Module / 报告模块
//!
//! This module handles the display and persistence of run reports.
//! It provides colorful, formatted console summaries with
//! internationalization support, and a JSON file sink for the
//! machine-readable result records and interaction traces.
//!
//! 此模块处理运行报告的显示和持久化。
//! 它提供支持国际化的彩色格式化控制台摘要，
//! 以及用于机器可读结果记录和交互轨迹的 JSON 文件接收器。

pub mod console;
pub mod json;

// Re-export common reporting functions
pub use console::{print_failure_details, print_summary};
pub use json::JsonFileSink;
