//! # Config Module Unit Tests / Config 模块单元测试
//!
//! This module contains unit tests for the `config.rs` module, testing the
//! `RunnerConfig` structure, its defaults, and TOML loading.
//!
//! 此模块包含 `config.rs` 模块的单元测试，
//! 测试 `RunnerConfig` 结构体、其默认值和 TOML 加载。

use cascade_runner::core::config::{RunnerConfig, load_runner_config};
use std::fs;
use tempfile::tempdir;

#[cfg(test)]
mod default_tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RunnerConfig::default();
        assert_eq!(config.language, "en");
        assert_eq!(config.platform, "web");
        assert_eq!(config.environment, "default");
        assert!(!config.stop_on_failure);
        assert!(config.trace_interactions);
        assert!(config.take_screenshot_on_failure);
        assert_eq!(config.max_file_scan_depth, 8);
        assert!(config.watch);
        assert!(
            config
                .ignore_test_directories
                .iter()
                .any(|d| d == "node_modules")
        );
    }
}

#[cfg(test)]
mod loading_tests {
    use super::*;

    #[test]
    fn test_load_full_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Cascade.toml");
        fs::write(
            &path,
            r#"
language = "zh-CN"
platform = "ios"
environment = "qa"
stop_on_failure = true
trace_interactions = false
take_screenshot_on_failure = false
max_file_scan_depth = 3
ignore_test_directories = [".git"]
watch = false
results_dir = "out"
"#,
        )
        .unwrap();

        let config = load_runner_config(&path).unwrap();
        assert_eq!(config.language, "zh-CN");
        assert_eq!(config.platform, "ios");
        assert_eq!(config.environment, "qa");
        assert!(config.stop_on_failure);
        assert!(!config.trace_interactions);
        assert!(!config.take_screenshot_on_failure);
        assert_eq!(config.max_file_scan_depth, 3);
        assert_eq!(config.ignore_test_directories, vec![".git".to_string()]);
        assert!(!config.watch);
        assert_eq!(config.results_dir, std::path::PathBuf::from("out"));
    }

    #[test]
    fn test_partial_config_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Cascade.toml");
        fs::write(&path, "platform = \"android\"\n").unwrap();

        let config = load_runner_config(&path).unwrap();
        assert_eq!(config.platform, "android");
        assert_eq!(config.language, "en");
        assert_eq!(config.max_file_scan_depth, 8);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Cascade.toml");
        fs::write(&path, "platform = [broken\n").unwrap();

        let result = load_runner_config(&path);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("parse"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let result = load_runner_config(&dir.path().join("nope.toml"));
        assert!(result.is_err());
    }
}
