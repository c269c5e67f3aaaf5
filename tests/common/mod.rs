// Shared test helpers for integration tests
#![allow(dead_code)]

use cascade_runner::core::assets::{AssetKind, asset_path};
use cascade_runner::core::config::RunnerConfig;
use serde_json::{Value, json};
use std::fs;
use std::path::Path;
use tempfile::{TempDir, tempdir};

/// A configuration suitable for tests: no file watcher, everything else
/// at defaults.
pub fn test_config() -> RunnerConfig {
    RunnerConfig {
        watch: false,
        ..RunnerConfig::default()
    }
}

/// Writes an asset document at its canonical path, creating directories as
/// needed.
pub fn write_asset(
    root: &Path,
    suite: &str,
    module: &str,
    platform: &str,
    kind: AssetKind,
    name: &str,
    actions: Value,
) {
    let path = asset_path(root, suite, module, platform, kind, name);
    let document = json!({
        "meta": {
            "id": format!("test-{name}"),
            "name": name,
            "description": format!("Test asset {name}"),
            "syntax": { "name": "cascade-steps", "version": "1.0" },
            "environments": [],
        },
        "actions": actions,
    });
    fs::create_dir_all(path.parent().unwrap()).expect("Failed to create asset directory");
    fs::write(&path, serde_json::to_string_pretty(&document).unwrap())
        .expect("Failed to write asset");
}

/// Writes a complete sidecar so scans never need to synthesize fields.
pub fn write_sidecar(dir: &Path, file_name: &str, name: &str) {
    let sidecar = json!({
        "id": format!("id-{name}"),
        "name": name,
        "description": format!("Description of {name}"),
        "created": 1_700_000_000_000i64,
        "ignore": [],
        "mapping": {},
    });
    fs::create_dir_all(dir).expect("Failed to create sidecar directory");
    fs::write(
        dir.join(file_name),
        serde_json::to_string_pretty(&sidecar).unwrap(),
    )
    .expect("Failed to write sidecar");
}

/// A navigate-then-screenshot action list every dry-run backend accepts.
pub fn passing_actions() -> Value {
    json!([
        { "action": "navigate", "value": "https://example.com" },
        { "action": "screenshot" },
    ])
}

/// An action list whose second step uses an unknown discriminator.
pub fn failing_actions() -> Value {
    json!([
        { "action": "navigate", "value": "https://example.com" },
        { "action": "detonate" },
        { "action": "screenshot" },
    ])
}

/// Builds the canonical sample project:
///
/// - `global/tests/login.json` and `global/actions/logout.json`
/// - suite `acct` with a `common` module (`commonFlow` test, `openMenu`
///   action) and modules `balances` (tests `viewBalance` for `web` and
///   `generic`, plus `openAccount`) and `transfers` (ignored on `ios`).
pub fn sample_project() -> TempDir {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let root = temp_dir.path();

    write_asset(
        root,
        "global",
        "common",
        "generic",
        AssetKind::Test,
        "login",
        passing_actions(),
    );
    write_asset(
        root,
        "global",
        "common",
        "generic",
        AssetKind::Action,
        "logout",
        passing_actions(),
    );

    write_sidecar(&root.join("acct"), "suite.json", "Acct");
    write_asset(
        root,
        "acct",
        "common",
        "generic",
        AssetKind::Test,
        "commonFlow",
        passing_actions(),
    );
    write_asset(
        root,
        "acct",
        "common",
        "generic",
        AssetKind::Action,
        "openMenu",
        passing_actions(),
    );

    write_sidecar(
        &root.join("acct/modules/balances"),
        "module.json",
        "Balances",
    );
    write_asset(
        root,
        "acct",
        "balances",
        "web",
        AssetKind::Test,
        "viewBalance",
        passing_actions(),
    );
    write_asset(
        root,
        "acct",
        "balances",
        "generic",
        AssetKind::Test,
        "viewBalance",
        passing_actions(),
    );
    write_asset(
        root,
        "acct",
        "balances",
        "generic",
        AssetKind::Test,
        "openAccount",
        passing_actions(),
    );

    let transfers = root.join("acct/modules/transfers");
    fs::create_dir_all(&transfers).unwrap();
    fs::write(
        transfers.join("module.json"),
        serde_json::to_string_pretty(&json!({
            "id": "id-transfers",
            "name": "Transfers",
            "description": "Description of Transfers",
            "created": 1_700_000_000_000i64,
            "ignore": ["ios"],
            "mapping": {},
        }))
        .unwrap(),
    )
    .unwrap();
    write_asset(
        root,
        "acct",
        "transfers",
        "web",
        AssetKind::Test,
        "sendMoney",
        passing_actions(),
    );

    temp_dir
}
