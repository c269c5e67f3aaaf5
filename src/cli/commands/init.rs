//! # Project Initialization Module / 项目初始化模块
//!
//! This module provides functionality for initializing a new asset project
//! through an interactive command-line wizard. It helps users create a
//! `Cascade.toml` file and the canonical suite/module directory skeleton,
//! optionally with a sample test.
//!
//! 此模块通过交互式命令行向导提供初始化新资产项目的功能。
//! 它帮助用户创建 `Cascade.toml` 文件和规范的套件/模块目录骨架，
//! 并可选地创建一个示例测试。

use anyhow::{Context, Result};
use colored::*;
use dialoguer::{Confirm, Input, theme::ColorfulTheme};
use serde_json::json;
use std::fs;
use std::path::Path;

use crate::core::assets::AssetKind;
use crate::core::collection::AssetCollection;
use crate::core::config::{DEFAULT_CONFIG_FILE, RunnerConfig};
use crate::core::scheduler::ScanScheduler;
use crate::infra::{fs as infra_fs, t};

/// The commented configuration template written by the wizard.
/// 向导写出的带注释配置模板。
const DEFAULT_CONFIG: &str = r#"# Cascade Runner configuration / Cascade Runner 配置

# UI language for console output / 控制台输出的界面语言
language = "en"

# Default execution platform / 默认执行平台
platform = "web"

# Active test environment / 当前测试环境
environment = "default"

# Halt the current queue on the first failure / 首次失败时中止当前队列
stop_on_failure = false

# Record every backend interaction into the run trace / 将每次后端交互记录到运行轨迹
trace_interactions = true

# Capture a screenshot when a test fails / 测试失败时截屏
take_screenshot_on_failure = true

# Maximum directory depth the scanner descends / 扫描器下降的最大目录深度
max_file_scan_depth = 8

# Directory names the scanner never enters / 扫描器永不进入的目录名
ignore_test_directories = [".git", "node_modules", "target", "results"]

# Keep the asset tree live with a file watcher / 使用文件监视器保持资产树的活性
watch = true

# Where result records and traces are written / 结果记录和轨迹的写入位置
results_dir = "results"
"#;

/// Runs the interactive wizard to scaffold a new asset project.
///
/// Creates `Cascade.toml`, one suite with its `common` module, one regular
/// module, and optionally a sample test, all at their canonical paths.
///
/// 运行交互式向导以搭建新的资产项目。
/// 在规范路径下创建 `Cascade.toml`、一个套件及其 `common` 模块、
/// 一个常规模块，并可选地创建一个示例测试。
pub fn run_init_wizard(project_dir: &Path, language: &str, non_interactive: bool) -> Result<()> {
    let config_path = project_dir.join(DEFAULT_CONFIG_FILE);
    let theme = ColorfulTheme::default();

    if !non_interactive {
        println!(
            "\n{}",
            t!("init.wizard_welcome", locale = language).cyan().bold()
        );
        println!("{}", t!("init.wizard_description", locale = language));
    }

    if config_path.exists() && !non_interactive {
        let confirmation = Confirm::with_theme(&theme)
            .with_prompt(
                t!(
                    "init.overwrite_prompt",
                    locale = language,
                    path = config_path.display()
                )
                .to_string(),
            )
            .default(false)
            .interact()
            .context(t!("init.user_confirmation_failed", locale = language).to_string())?;
        if !confirmation {
            println!("{}", t!("init.aborted", locale = language));
            return Ok(());
        }
    }

    let (suite_name, module_name, with_sample) = if non_interactive {
        ("app".to_string(), "home".to_string(), true)
    } else {
        let suite_name: String = Input::with_theme(&theme)
            .with_prompt(t!("init.suite_prompt", locale = language).to_string())
            .default("app".to_string())
            .interact_text()
            .context(t!("init.user_confirmation_failed", locale = language).to_string())?;
        let module_name: String = Input::with_theme(&theme)
            .with_prompt(t!("init.module_prompt", locale = language).to_string())
            .default("home".to_string())
            .interact_text()
            .context(t!("init.user_confirmation_failed", locale = language).to_string())?;
        let with_sample = Confirm::with_theme(&theme)
            .with_prompt(t!("init.sample_test_prompt", locale = language).to_string())
            .default(true)
            .interact()
            .context(t!("init.user_confirmation_failed", locale = language).to_string())?;
        (suite_name, module_name, with_sample)
    };

    fs::create_dir_all(project_dir)
        .with_context(|| format!("Failed to create directory: {}", project_dir.display()))?;
    fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write config: {}", config_path.display()))?;

    let config = RunnerConfig {
        watch: false,
        ..RunnerConfig::default()
    };
    let collection = AssetCollection::new(
        infra_fs::absolute_path(project_dir)?,
        config.clone(),
        ScanScheduler::default(),
    );
    collection.make_suite(&suite_name)?;
    collection.make_module(&suite_name, &module_name)?;

    if with_sample {
        let asset = collection.make_asset(
            AssetKind::Test,
            "sampleTest",
            &suite_name,
            &module_name,
            &config.platform,
        )?;
        let mut document = asset.document().unwrap_or_else(|| json!({}));
        document["actions"] = json!([
            { "action": "navigate", "value": "https://example.com" },
            { "action": "screenshot" },
        ]);
        infra_fs::write_json_pretty(&asset.path, &document)?;
    }

    println!(
        "{}",
        t!(
            "init.done",
            locale = language,
            path = config_path.display(),
            suite = suite_name,
            module = module_name
        )
        .green()
        .bold()
    );
    Ok(())
}
