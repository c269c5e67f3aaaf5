//! # Scanner Unit Tests / 扫描器单元测试
//!
//! This module contains unit tests for the `scanner.rs` module: directory
//! classification, sidecar auto-fill with write-back, depth pruning, and
//! tolerance of malformed documents.
//!
//! 此模块包含 `scanner.rs` 模块的单元测试：目录分类、
//! 附属文件自动填充与写回、深度剪枝以及对畸形文档的容忍。

mod common;

use cascade_runner::core::assets::{AssetKind, SidecarMeta};
use cascade_runner::core::scanner::scan;
use common::{sample_project, test_config, write_asset};
use serde_json::json;
use std::fs;

#[cfg(test)]
mod tree_tests {
    use super::*;

    #[tokio::test]
    async fn test_scan_builds_the_expected_tree() {
        let project = sample_project();
        let outcome = scan(project.path(), &test_config()).await.unwrap();

        assert!(outcome.suites.contains_key("global"));
        assert!(outcome.suites.contains_key("acct"));

        let acct = &outcome.suites["acct"];
        assert!(acct.modules.contains_key("common"));
        assert!(acct.modules.contains_key("balances"));
        assert!(acct.modules.contains_key("transfers"));

        // 2 global + 2 common + 3 balances + 1 transfers
        assert_eq!(outcome.assets.len(), 8);
    }

    #[tokio::test]
    async fn test_global_assets_land_in_the_common_module() {
        let project = sample_project();
        let outcome = scan(project.path(), &test_config()).await.unwrap();

        let global = &outcome.suites["global"];
        let login = global.modules["common"].asset(AssetKind::Test, "login", "generic");
        assert!(login.is_some());
        assert_eq!(login.unwrap().suite, "global");
    }

    #[tokio::test]
    async fn test_module_ignore_list_is_read() {
        let project = sample_project();
        let outcome = scan(project.path(), &test_config()).await.unwrap();

        let transfers = &outcome.suites["acct"].modules["transfers"];
        assert!(transfers.is_ignored("ios"));
        assert!(!transfers.is_ignored("web"));
    }

    #[tokio::test]
    async fn test_rescan_is_idempotent() {
        let project = sample_project();
        let config = test_config();

        let first = scan(project.path(), &config).await.unwrap();
        let second = scan(project.path(), &config).await.unwrap();
        assert_eq!(first.assets.len(), second.assets.len());
    }
}

#[cfg(test)]
mod sidecar_tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_sidecar_is_synthesized_and_written_back() {
        let project = sample_project();
        let root = project.path();
        write_asset(
            root,
            "ledger",
            "history",
            "generic",
            AssetKind::Test,
            "listEntries",
            json!([{ "action": "screenshot" }]),
        );

        scan(root, &test_config()).await.unwrap();

        let suite_sidecar = root.join("ledger/suite.json");
        assert!(suite_sidecar.exists());
        let meta: SidecarMeta =
            serde_json::from_str(&fs::read_to_string(&suite_sidecar).unwrap()).unwrap();
        assert_eq!(meta.name, "Ledger");
        assert_eq!(meta.description, "Description of Ledger");
        assert!(!meta.id.is_empty());
        assert!(meta.created.is_some());

        let module_sidecar = root.join("ledger/modules/history/module.json");
        assert!(module_sidecar.exists());
        let meta: SidecarMeta =
            serde_json::from_str(&fs::read_to_string(&module_sidecar).unwrap()).unwrap();
        assert_eq!(meta.name, "History");
    }

    #[tokio::test]
    async fn test_existing_sidecar_is_not_rewritten() {
        let project = sample_project();
        let sidecar = project.path().join("acct/suite.json");
        let before = fs::read_to_string(&sidecar).unwrap();

        scan(project.path(), &test_config()).await.unwrap();

        let after = fs::read_to_string(&sidecar).unwrap();
        assert_eq!(before, after);
    }
}

#[cfg(test)]
mod robustness_tests {
    use super::*;

    #[tokio::test]
    async fn test_malformed_asset_is_skipped_not_fatal() {
        let project = sample_project();
        let bad = project.path().join("acct/modules/balances/tests/bad.json");
        fs::write(&bad, "{ not json").unwrap();

        let outcome = scan(project.path(), &test_config()).await.unwrap();
        assert!(!outcome.assets.contains_key(&bad));
        // The rest of the tree still loads.
        assert_eq!(outcome.assets.len(), 8);
    }

    #[tokio::test]
    async fn test_ignored_directories_are_pruned() {
        let project = sample_project();
        let hidden = project.path().join("node_modules/phantom/tests");
        fs::create_dir_all(&hidden).unwrap();
        fs::write(hidden.join("ghost.json"), "{\"actions\": []}").unwrap();

        let outcome = scan(project.path(), &test_config()).await.unwrap();
        assert!(!outcome.suites.contains_key("node_modules"));
        assert_eq!(outcome.assets.len(), 8);
    }

    #[tokio::test]
    async fn test_depth_guard_prunes_deep_branches() {
        let project = sample_project();
        let config = cascade_runner::core::config::RunnerConfig {
            max_file_scan_depth: 2,
            watch: false,
            ..Default::default()
        };

        let outcome = scan(project.path(), &config).await.unwrap();
        // Depth 2 reaches <suite>/common but not the kind directories below,
        // so no assets under modules/ survive the pruning.
        assert!(
            outcome
                .assets
                .keys()
                .all(|path| !path.to_string_lossy().contains("modules"))
        );
    }

    #[tokio::test]
    async fn test_empty_root_scans_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = scan(dir.path(), &test_config()).await.unwrap();
        assert!(outcome.suites.is_empty());
        assert!(outcome.assets.is_empty());
    }
}
