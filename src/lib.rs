//! # Cascade Runner Library / Cascade Runner 库
//!
//! This library provides the core functionality for the Cascade Runner tool,
//! a multi-platform UI test orchestrator driven by a hierarchical asset tree.
//!
//! 此库为 Cascade Runner 工具提供核心功能，
//! 这是一个由分层资产树驱动的多平台 UI 测试编排器。
//!
//! ## Modules / 模块
//!
//! - `core` - Asset model, resolution engine and test execution orchestrator
//! - `infra` - Infrastructure services like file system operations and file watching
//! - `reporting` - Run result reporting and persistence
//! - `cli` - Command-line interface and commands
//!
//! - `core` - 资产模型、解析引擎和测试执行编排器
//! - `infra` - 基础设施服务，如文件系统操作和文件监视
//! - `reporting` - 运行结果报告和持久化
//! - `cli` - 命令行接口和命令

pub mod cli;
pub mod core;
pub mod infra;
pub mod reporting;

// Re-export commonly used items
pub use core::collection;
pub use core::config;
pub use core::models;
pub use core::registry;
pub use core::runner;

/// Initializes the application's internationalization (i18n) based on the system locale.
///
/// This function detects the user's system locale and sets the appropriate
/// language for the application's user interface. It attempts to match the full
/// locale (e.g., "zh-CN"), then just the language code (e.g., "en"), and
/// finally falls back to the default language ("en").
pub fn init() {
    // Detect system locale and set it for i18n.
    // Fallback to "en" if detection fails.
    let locale = sys_locale::get_locale().unwrap_or_else(|| "en".to_string());
    let available_locales = rust_i18n::available_locales!();

    // Try to match the full locale first (e.g., "zh-CN")
    // Then try to match the language part only (e.g., "en" from "en-US")
    // Finally, fall back to "en"
    let lang = if available_locales.contains(&locale.as_str()) {
        &locale
    } else {
        locale
            .split('-')
            .next()
            .filter(|lang_code| available_locales.contains(lang_code))
            .unwrap_or("en")
    };

    rust_i18n::set_locale(lang);
}

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");
