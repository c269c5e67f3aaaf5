//! # Console Reporting Module / 控制台报告模块
//!
//! This module prints formatted run summaries to the console.
//! It provides colorful, formatted output with internationalization support.
//!
//! 此模块在控制台打印格式化的运行摘要。
//! 它提供支持国际化的彩色格式化输出。

use crate::core::models::{ReportLevel, RunReport};
use crate::infra::t;
use colored::*;

/// Prints a formatted summary of one run report to the console.
/// Displays the level, name, status, counters and duration, using color
/// coding to highlight the outcome.
///
/// 在控制台打印一次运行报告的格式化摘要。
/// 显示级别、名称、状态、计数器和持续时间，使用颜色编码突出结果。
///
/// # Arguments / 参数
/// * `report` - The top-level report to summarize
///              要总结的顶层报告
/// * `locale` - The language locale to use for messages
///              用于消息的语言区域设置
pub fn print_summary(report: &RunReport, locale: &str) {
    println!("\n{}", t!("report.summary_banner", locale = locale).bold());

    let status_str = report.status_str(locale);
    let status_colored = if report.stopped {
        status_str.yellow()
    } else if report.passed {
        status_str.green()
    } else {
        status_str.red()
    };

    let unit = match report.level {
        ReportLevel::Suite => t!("report.unit_modules", locale = locale),
        ReportLevel::Module => t!("report.unit_tests", locale = locale),
        ReportLevel::Test | ReportLevel::Action => t!("report.unit_actions", locale = locale),
    };

    println!(
        "  - {:<8} | {:<14} | {:<30} | {:>8.2?}",
        status_colored,
        report.level.label(),
        report.name,
        report.duration
    );
    println!(
        "  - {}",
        t!(
            "report.counts_line",
            locale = locale,
            total = report.counts.total,
            passed = report.counts.passed,
            failed = report.counts.failed,
            stopped = report.counts.stopped,
            unit = unit
        )
    );
}

/// Prints each recorded failure reason of a failed run, with the captured
/// artifacts when present. Returns early when the run passed.
///
/// 打印失败运行的每条失败原因，以及已捕获的辅助信息。
/// 运行通过时提前返回。
pub fn print_failure_details(report: &RunReport, locale: &str) {
    if !report.is_failure() {
        return;
    }

    println!(
        "\n{}",
        t!("report.failure_banner", locale = locale).red().bold()
    );
    println!("{}", "-".repeat(80));

    for (i, reason) in report.reasons.iter().enumerate() {
        println!("[{}/{}] {}", i + 1, report.reasons.len(), reason.red());
    }
    if let Some(screenshot) = &report.artifacts.screenshot {
        println!(
            "{}",
            t!(
                "report.screenshot_saved",
                locale = locale,
                path = screenshot.display()
            )
            .cyan()
        );
    }
    if let Some(trace) = &report.artifacts.trace {
        println!(
            "{}",
            t!("report.trace_saved", locale = locale, path = trace.display()).cyan()
        );
    }
    println!("{}", "-".repeat(80));
}
