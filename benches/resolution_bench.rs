use cascade_runner::core::assets::{AssetKind, asset_path};
use cascade_runner::core::collection::{AssetCollection, ResolveCriteria};
use cascade_runner::core::config::RunnerConfig;
use cascade_runner::core::scheduler::ScanScheduler;
use criterion::{Criterion, criterion_group, criterion_main};
use serde_json::json;
use std::fs;
use std::sync::Arc;
use tokio::runtime::Runtime;

fn build_project(root: &std::path::Path) {
    for module_idx in 0..10 {
        let module = format!("module{module_idx}");
        let dir = root.join("bench").join("modules").join(&module);
        fs::create_dir_all(dir.join("tests")).unwrap();
        fs::write(
            dir.join("module.json"),
            serde_json::to_string(&json!({
                "id": format!("id-{module}"),
                "name": module,
                "description": "bench module",
                "created": 1_700_000_000_000i64,
            }))
            .unwrap(),
        )
        .unwrap();
        for test_idx in 0..20 {
            let name = format!("test{test_idx}");
            let path = asset_path(root, "bench", &module, "web", AssetKind::Test, &name);
            fs::write(
                &path,
                serde_json::to_string(&json!({
                    "meta": { "name": name, "environments": [] },
                    "actions": [{ "action": "screenshot" }],
                }))
                .unwrap(),
            )
            .unwrap();
        }
    }
    fs::write(
        root.join("bench").join("suite.json"),
        serde_json::to_string(&json!({
            "id": "id-bench",
            "name": "Bench",
            "description": "bench suite",
            "created": 1_700_000_000_000i64,
        }))
        .unwrap(),
    )
    .unwrap();
}

fn bench_resolution(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let dir = tempfile::tempdir().unwrap();
    build_project(dir.path());

    let config = RunnerConfig {
        watch: false,
        ..RunnerConfig::default()
    };
    let collection: Arc<AssetCollection> = rt.block_on(async {
        let collection = AssetCollection::new(
            dir.path().canonicalize().unwrap(),
            config,
            ScanScheduler::new(),
        );
        collection.load().await.unwrap();
        collection
    });

    c.bench_function("resolve_exact_hit", |b| {
        let criteria =
            ResolveCriteria::new(AssetKind::Test, "test7", "bench", "module3", "web");
        b.iter(|| collection.resolve(&criteria).unwrap());
    });

    c.bench_function("resolve_full_fallback_miss", |b| {
        let criteria =
            ResolveCriteria::new(AssetKind::Test, "absent", "bench", "module3", "web");
        b.iter(|| collection.resolve(&criteria).unwrap());
    });

    let scan_dir = dir.path().to_path_buf();
    c.bench_function("full_scan", |b| {
        b.to_async(&rt).iter(|| {
            let root = scan_dir.clone();
            async move {
                let _ = cascade_runner::core::scanner::scan(
                    &root,
                    &RunnerConfig {
                        watch: false,
                        ..RunnerConfig::default()
                    },
                )
                .await
                .unwrap();
            }
        });
    });
}

criterion_group!(benches, bench_resolution);
criterion_main!(benches);
