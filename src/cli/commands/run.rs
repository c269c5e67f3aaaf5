// src/cli/commands/run.rs

use anyhow::{Context, Result, anyhow, bail};
use colored::*;
use serde_json::Value;
use std::path::PathBuf;
use tokio::signal;

use crate::core::backend::DryRunBackend;
use crate::core::config::{self, RunnerConfig};
use crate::core::models::RunOptions;
use crate::core::registry::Assets;
use crate::core::runner::TestRunner;
use crate::infra::{fs as infra_fs, t};
use crate::reporting::{JsonFileSink, print_failure_details, print_summary};

/// The run subcommand's request, straight from the parsed arguments.
/// 直接来自已解析参数的 run 子命令请求。
#[derive(Debug, Default)]
pub struct RunRequest {
    pub suite: Option<String>,
    pub module: Option<String>,
    pub test: Option<String>,
    pub action: Option<String>,
    pub modules: Option<Vec<String>>,
    pub range: Option<String>,
    pub platform: Option<String>,
    pub stop_on_failure: bool,
    pub no_watch: bool,
}

pub async fn execute(project_dir: PathBuf, config: PathBuf, request: RunRequest) -> Result<()> {
    let project_root = infra_fs::absolute_path(&project_dir)?;
    let config_path = if config.is_absolute() {
        config
    } else {
        project_root.join(config)
    };

    let mut runner_config = if config_path.exists() {
        config::load_runner_config(&config_path)?
    } else {
        RunnerConfig::default()
    };
    if std::env::args().all(|arg| arg != "--lang") {
        rust_i18n::set_locale(&runner_config.language);
    }
    let locale = rust_i18n::locale().to_string();
    if request.stop_on_failure {
        runner_config.stop_on_failure = true;
    }
    if request.no_watch {
        runner_config.watch = false;
    }

    println!(
        "{}",
        t!(
            "cli.project_root_detected",
            locale = locale,
            path = project_root.display()
        )
    );

    let results_dir = project_root.join(&runner_config.results_dir);
    let registry = Assets::new(runner_config.clone());
    let runner = TestRunner::new(runner_config, registry, project_root);
    runner
        .start_framework(
            std::sync::Arc::new(DryRunBackend::new(results_dir.join("screenshots"))),
            &Value::Null,
        )
        .await?;
    runner.set_sink(std::sync::Arc::new(JsonFileSink::new(results_dir)));

    let options = RunOptions {
        suite: request.suite,
        module: request.module,
        test: request.test,
        action: request.action,
        modules: request.modules,
        range: request.range.as_deref().map(parse_range).transpose()?,
        platform: request.platform,
        ..RunOptions::default()
    };

    let handle = runner.run(options)?;
    wire_signal_handler(std::sync::Arc::clone(&handle.run), &locale);
    let report = handle.wait().await;
    runner.stop_framework().await?;
    let report = report?;

    print_summary(&report, &locale);
    print_failure_details(&report, &locale);

    if report.is_failure() {
        bail!(t!("cli.run_failed", locale = locale).to_string());
    }
    println!("{}", t!("cli.run_passed", locale = locale).green().bold());
    Ok(())
}

/// Parses a half-open `START..END` index range.
fn parse_range(raw: &str) -> Result<(usize, usize)> {
    let (start, end) = raw
        .split_once("..")
        .ok_or_else(|| anyhow!("Invalid range '{raw}', expected START..END"))?;
    let start: usize = start
        .trim()
        .parse()
        .with_context(|| format!("Invalid range start in '{raw}'"))?;
    let end: usize = end
        .trim()
        .parse()
        .with_context(|| format!("Invalid range end in '{raw}'"))?;
    Ok((start, end))
}

fn wire_signal_handler(run: std::sync::Arc<crate::core::run::Run>, locale: &str) {
    let locale = locale.to_string();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            println!("\n{}", t!("cli.shutdown_signal", locale = &locale).yellow());
            run.request_stop();
        }
    });
}
