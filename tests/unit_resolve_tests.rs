//! # Resolution Engine Unit Tests / 解析引擎单元测试
//!
//! This module contains unit tests for the `collection.rs` module: the
//! fallback precedence chain, the structural error taxonomy, collection
//! accessors, CRUD, and the incremental change protocol.
//!
//! 此模块包含 `collection.rs` 模块的单元测试：回退优先级链、
//! 结构性错误分类、集合访问器、CRUD 以及增量变更协议。

mod common;

use cascade_runner::core::assets::{AssetKind, asset_path};
use cascade_runner::core::collection::{AssetCollection, ResolveCriteria};
use cascade_runner::core::error::OrchestratorError;
use cascade_runner::core::scheduler::ScanScheduler;
use cascade_runner::infra::watch::WatchEvent;
use common::{passing_actions, sample_project, test_config, write_asset};
use serde_json::json;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

async fn loaded_collection(project: &TempDir) -> Arc<AssetCollection> {
    let collection = AssetCollection::new(
        project.path().canonicalize().unwrap(),
        test_config(),
        ScanScheduler::new(),
    );
    collection.load().await.expect("collection must load");
    collection
}

#[cfg(test)]
mod precedence_tests {
    use super::*;

    #[tokio::test]
    async fn test_exact_platform_wins_over_generic() {
        let project = sample_project();
        let collection = loaded_collection(&project).await;

        let hit = collection
            .resolve(&ResolveCriteria::new(
                AssetKind::Test,
                "viewBalance",
                "acct",
                "balances",
                "web",
            ))
            .unwrap()
            .expect("viewBalance must resolve");
        assert_eq!(hit.platform, "web");
    }

    #[tokio::test]
    async fn test_generic_fallback_within_the_module() {
        let project = sample_project();
        let collection = loaded_collection(&project).await;

        let hit = collection
            .resolve(&ResolveCriteria::new(
                AssetKind::Test,
                "openAccount",
                "acct",
                "balances",
                "web",
            ))
            .unwrap()
            .expect("openAccount must resolve");
        assert_eq!(hit.platform, "generic");
        assert_eq!(hit.module, "balances");
    }

    #[tokio::test]
    async fn test_common_module_fallback() {
        let project = sample_project();
        let collection = loaded_collection(&project).await;

        let hit = collection
            .resolve(&ResolveCriteria::new(
                AssetKind::Action,
                "openMenu",
                "acct",
                "balances",
                "web",
            ))
            .unwrap()
            .expect("openMenu must resolve from common");
        assert_eq!(hit.module, "common");
        assert_eq!(hit.suite, "acct");
    }

    #[tokio::test]
    async fn test_global_suite_fallback() {
        let project = sample_project();
        let collection = loaded_collection(&project).await;

        let hit = collection
            .resolve(&ResolveCriteria::new(
                AssetKind::Action,
                "logout",
                "acct",
                "balances",
                "web",
            ))
            .unwrap()
            .expect("logout must resolve from global");
        assert_eq!(hit.suite, "global");
    }

    #[tokio::test]
    async fn test_fallback_can_be_disabled() {
        let project = sample_project();
        let collection = loaded_collection(&project).await;

        let mut criteria = ResolveCriteria::new(
            AssetKind::Action,
            "openMenu",
            "acct",
            "balances",
            "web",
        );
        criteria.accept_common = false;
        assert!(collection.resolve(&criteria).unwrap().is_none());

        let mut criteria =
            ResolveCriteria::new(AssetKind::Action, "logout", "acct", "balances", "web");
        criteria.accept_global = false;
        assert!(collection.resolve(&criteria).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_absent_asset_is_none_not_an_error() {
        let project = sample_project();
        let collection = loaded_collection(&project).await;

        let result = collection.resolve(&ResolveCriteria::new(
            AssetKind::Test,
            "doesNotExist",
            "acct",
            "balances",
            "web",
        ));
        assert!(matches!(result, Ok(None)));
    }

    #[tokio::test]
    async fn test_unknown_suite_and_module_are_structural_errors() {
        let project = sample_project();
        let collection = loaded_collection(&project).await;

        let err = collection
            .resolve(&ResolveCriteria::new(
                AssetKind::Test,
                "viewBalance",
                "ghost",
                "balances",
                "web",
            ))
            .unwrap_err();
        assert!(OrchestratorError::is_asset_not_found(&err));

        let err = collection
            .resolve(&ResolveCriteria::new(
                AssetKind::Test,
                "viewBalance",
                "acct",
                "ghost",
                "web",
            ))
            .unwrap_err();
        assert!(OrchestratorError::is_asset_not_found(&err));
    }
}

#[cfg(test)]
mod accessor_tests {
    use super::*;

    #[tokio::test]
    async fn test_module_tests_merge_platform_and_generic_tiers() {
        let project = sample_project();
        let collection = loaded_collection(&project).await;

        let tests = collection.module_tests("acct", "balances", "web").unwrap();
        let names: Vec<(String, String)> = tests
            .iter()
            .map(|t| (t.name.clone(), t.platform.clone()))
            .collect();
        // Deterministic (name, platform) order; both viewBalance tiers run.
        assert_eq!(
            names,
            vec![
                ("openAccount".to_string(), "generic".to_string()),
                ("viewBalance".to_string(), "generic".to_string()),
                ("viewBalance".to_string(), "web".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_suite_module_names_exclude_common() {
        let project = sample_project();
        let collection = loaded_collection(&project).await;

        let names = collection.suite_module_names("acct").unwrap();
        assert_eq!(names, vec!["balances".to_string(), "transfers".to_string()]);
    }

    #[tokio::test]
    async fn test_module_ignored() {
        let project = sample_project();
        let collection = loaded_collection(&project).await;

        assert!(collection.module_ignored("acct", "transfers", "ios").unwrap());
        assert!(!collection.module_ignored("acct", "transfers", "web").unwrap());
        assert!(collection.module_ignored("acct", "ghost", "web").is_err());
    }
}

#[cfg(test)]
mod crud_tests {
    use super::*;

    #[tokio::test]
    async fn test_make_suite_module_and_asset() {
        let project = sample_project();
        let collection = loaded_collection(&project).await;
        let root = collection.root().to_path_buf();

        collection.make_suite("ledger").unwrap();
        assert!(root.join("ledger/suite.json").exists());
        assert!(root.join("ledger/common/tests").exists());

        collection.make_module("ledger", "history").unwrap();
        assert!(root.join("ledger/modules/history/module.json").exists());
        assert!(root.join("ledger/modules/history/popups").exists());

        let asset = collection
            .make_asset(AssetKind::Test, "listEntries", "ledger", "history", "web")
            .unwrap();
        assert!(asset.path.exists());
        assert_eq!(asset.meta().human_name, "ListEntries");

        // The new asset is resolvable without a rescan.
        let hit = collection
            .resolve(&ResolveCriteria::new(
                AssetKind::Test,
                "listEntries",
                "ledger",
                "history",
                "web",
            ))
            .unwrap();
        assert!(hit.is_some());
    }

    #[tokio::test]
    async fn test_delete_asset_and_module() {
        let project = sample_project();
        let collection = loaded_collection(&project).await;

        collection
            .delete_asset(AssetKind::Test, "viewBalance", "acct", "balances", "web")
            .unwrap();
        let hit = collection
            .resolve(&ResolveCriteria::new(
                AssetKind::Test,
                "viewBalance",
                "acct",
                "balances",
                "web",
            ))
            .unwrap()
            .expect("generic tier must remain");
        assert_eq!(hit.platform, "generic");

        collection.delete_module("acct", "balances").unwrap();
        assert!(!collection.root().join("acct/modules/balances").exists());
        assert_eq!(
            collection.suite_module_names("acct").unwrap(),
            vec!["transfers".to_string()]
        );
    }

    #[tokio::test]
    async fn test_delete_suite() {
        let project = sample_project();
        let collection = loaded_collection(&project).await;

        collection.delete_suite("acct").unwrap();
        assert!(!collection.root().join("acct").exists());
        let err = collection
            .resolve(&ResolveCriteria::new(
                AssetKind::Test,
                "viewBalance",
                "acct",
                "balances",
                "web",
            ))
            .unwrap_err();
        assert!(OrchestratorError::is_asset_not_found(&err));
    }
}

#[cfg(test)]
mod change_protocol_tests {
    use super::*;

    #[tokio::test]
    async fn test_modified_event_patches_in_place_preserving_identity() {
        let project = sample_project();
        let collection = loaded_collection(&project).await;
        let path = asset_path(
            collection.root(),
            "acct",
            "balances",
            "web",
            AssetKind::Test,
            "viewBalance",
        );
        let before = collection.asset_at(&path).expect("asset indexed");

        let updated = json!({
            "meta": {
                "id": "test-viewBalance",
                "name": "viewBalance",
                "description": "updated",
                "syntax": { "name": "cascade-steps", "version": "1.0" },
                "environments": [],
            },
            "actions": [{ "action": "screenshot" }],
        });
        fs::write(&path, serde_json::to_string_pretty(&updated).unwrap()).unwrap();
        collection
            .apply_change(WatchEvent::Modified(path.clone()))
            .await
            .unwrap();

        let after = collection.asset_at(&path).expect("asset still indexed");
        // Same Arc: consumers holding the asset mid-test observe the patch.
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(after.actions().len(), 1);
        assert_eq!(after.meta().description, "updated");
    }

    #[tokio::test]
    async fn test_structural_event_triggers_a_full_reload() {
        let project = sample_project();
        let collection = loaded_collection(&project).await;

        write_asset(
            collection.root(),
            "acct",
            "balances",
            "web",
            AssetKind::Test,
            "brandNew",
            passing_actions(),
        );
        let new_path = asset_path(
            collection.root(),
            "acct",
            "balances",
            "web",
            AssetKind::Test,
            "brandNew",
        );
        collection
            .apply_change(WatchEvent::Structural(new_path.clone()))
            .await
            .unwrap();

        assert!(collection.asset_at(&new_path).is_some());
    }

    #[tokio::test]
    async fn test_modified_sidecar_patches_module_fields() {
        let project = sample_project();
        let collection = loaded_collection(&project).await;
        let sidecar = collection.root().join("acct/modules/balances/module.json");

        fs::write(
            &sidecar,
            serde_json::to_string_pretty(&json!({
                "id": "id-balances",
                "name": "Balances",
                "description": "Description of Balances",
                "created": 1_700_000_000_000i64,
                "ignore": ["web"],
                "mapping": {},
            }))
            .unwrap(),
        )
        .unwrap();
        collection
            .apply_change(WatchEvent::Modified(sidecar))
            .await
            .unwrap();

        assert!(collection.module_ignored("acct", "balances", "web").unwrap());
    }

    #[tokio::test]
    async fn test_events_under_results_and_ignored_dirs_are_discarded() {
        let project = sample_project();
        let collection = loaded_collection(&project).await;
        let before = collection.asset_count();

        // A new asset lands on disk; only a reload would pick it up.
        write_asset(
            collection.root(),
            "acct",
            "balances",
            "web",
            AssetKind::Test,
            "brandNew",
            passing_actions(),
        );
        let new_path = asset_path(
            collection.root(),
            "acct",
            "balances",
            "web",
            AssetKind::Test,
            "brandNew",
        );

        let record = collection.root().join("results/run-test-a_pass-1.json");
        fs::create_dir_all(record.parent().unwrap()).unwrap();
        fs::write(&record, "{}").unwrap();
        collection
            .apply_change(WatchEvent::Structural(record))
            .await
            .unwrap();

        let cached = collection.root().join("node_modules/pkg/index.json");
        fs::create_dir_all(cached.parent().unwrap()).unwrap();
        fs::write(&cached, "{}").unwrap();
        collection
            .apply_change(WatchEvent::Structural(cached))
            .await
            .unwrap();

        // Neither event reloaded the collection.
        assert_eq!(collection.asset_count(), before);
        assert!(collection.asset_at(&new_path).is_none());
    }
}
