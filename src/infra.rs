//! # Infrastructure Module / 基础设施模块
//!
//! This module provides infrastructure services for the cascade runner,
//! including file system helpers, file watching, and i18n support.
//!
//! 此模块为级联运行器提供基础设施服务，
//! 包括文件系统辅助功能、文件监视和国际化支持。

pub mod fs;
pub mod watch;

// Re-export i18n functions for easier access
pub use rust_i18n::t;
