//! # Project Scanner Module / 项目扫描器模块
//!
//! Walks a project directory tree, classifying directories by well-known
//! names (`tests`/`actions`/`screens`/`menus`/`popups`, `suite.json` and
//! `module.json` boundaries, `common`, `global`) and building the asset
//! tree. The walk is a fan-out/fan-in over every directory level: sibling
//! directories scan concurrently and completion is reached only once every
//! entry and every asset content read has resolved.
//!
//! 遍历项目目录树，按知名名称分类目录并构建资产树。
//! 遍历是对每个目录级别的扇出/扇入——兄弟目录并发扫描，
//! 只有在每个条目和每个资产内容读取都完成后才算完成。

use crate::core::assets::{
    Asset, AssetKind, COMMON_MODULE, GLOBAL_SUITE, MODULE_SIDECAR, MODULES_DIR, SidecarMeta,
    Suite, SUITE_SIDECAR, split_asset_filename,
};
use crate::core::config::RunnerConfig;
use crate::infra::t;
use anyhow::{Context, Result};
use colored::*;
use futures::future::{BoxFuture, join_all};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// The in-memory product of one scan: the suite tree plus the flat
/// absolute-path index used for O(1) change application.
/// 一次扫描的内存产物：套件树加上用于 O(1) 变更应用的平面绝对路径索引。
#[derive(Default)]
pub struct ScanOutcome {
    pub suites: HashMap<String, Suite>,
    pub assets: HashMap<PathBuf, Arc<Asset>>,
}

impl ScanOutcome {
    fn insert_asset(&mut self, asset: Asset) {
        // Re-scanning must never duplicate an existing asset.
        if self.assets.contains_key(&asset.path) {
            return;
        }
        let asset = Arc::new(asset);
        self.suites
            .entry(asset.suite.clone())
            .or_insert_with(|| Suite::new(&asset.suite))
            .module_mut(&asset.module)
            .platform_mut(&asset.platform)
            .insert(Arc::clone(&asset));
        self.assets.insert(asset.path.clone(), asset);
    }
}

/// Walk context inherited from the parent directory.
#[derive(Debug, Clone, Default)]
struct ScanCtx {
    suite: Option<String>,
    module: Option<String>,
    kind: Option<AssetKind>,
    depth: usize,
}

/// Scans `root` and returns the discovered asset tree. Per-asset parse
/// failures and missing sidecars are logged as warnings and skipped;
/// discovery is best-effort and only an unreadable root is fatal.
///
/// 扫描 `root` 并返回发现的资产树。
/// 单个资产的解析失败和缺失的附属文件会记录警告并跳过；
/// 发现是尽力而为的，只有根目录不可读才是致命的。
pub async fn scan(root: &Path, config: &RunnerConfig) -> Result<ScanOutcome> {
    let shared = Arc::new(Mutex::new(ScanOutcome::default()));
    scan_dir(root.to_path_buf(), ScanCtx::default(), Arc::clone(&shared), config)
        .await
        .with_context(|| format!("Failed to scan project root: {}", root.display()))?;
    let outcome = Arc::try_unwrap(shared)
        .map_err(|_| anyhow::anyhow!("scan outcome still shared after walk completed"))?
        .into_inner();
    Ok(outcome)
}

/// Recursive concurrent walk. Children are awaited with a single `join_all`
/// barrier per level, which is the explicit form of the pending-count
/// fan-in: this level completes only after every child entry has.
fn scan_dir<'a>(
    dir: PathBuf,
    mut ctx: ScanCtx,
    shared: Arc<Mutex<ScanOutcome>>,
    config: &'a RunnerConfig,
) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        if ctx.depth > config.max_file_scan_depth {
            println!(
                "{}",
                t!("scan.depth_exceeded", path = dir.display(), depth = config.max_file_scan_depth)
                    .yellow()
            );
            return Ok(());
        }

        let dir_name = dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        if ctx.depth > 0 {
            if config.ignore_test_directories.iter().any(|d| d == &dir_name) {
                return Ok(());
            }
            classify(&dir, &dir_name, &mut ctx, &shared).await?;
        }

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) => {
                // Depth 0 is the project root; failing to read it is fatal.
                if ctx.depth == 0 {
                    return Err(e)
                        .with_context(|| format!("Failed to read directory: {}", dir.display()));
                }
                println!(
                    "{}",
                    t!("scan.dir_read_failed", path = dir.display(), error = e).yellow()
                );
                return Ok(());
            }
        };

        let mut children = Vec::new();
        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .with_context(|| format!("Failed to read directory entry in {}", dir.display()))?
        {
            let path = entry.path();
            if path.is_dir() {
                let child_ctx = ScanCtx {
                    depth: ctx.depth + 1,
                    ..ctx.clone()
                };
                children.push(scan_dir(path, child_ctx, Arc::clone(&shared), config));
            } else {
                files.push(path);
            }
        }

        let reads: Vec<_> = if ctx.kind.is_some() {
            files
                .into_iter()
                .map(|path| read_asset_file(path, ctx.clone(), Arc::clone(&shared)))
                .collect()
        } else {
            Vec::new()
        };

        // Fan-out over sibling directories and asset reads, fan-in here.
        let (dir_results, _) = futures::join!(join_all(children), join_all(reads));
        for result in dir_results {
            result?;
        }
        Ok(())
    })
}

/// Classifies the directory being entered, updating the walk context and
/// registering suite/module boundaries.
async fn classify(
    dir: &Path,
    dir_name: &str,
    ctx: &mut ScanCtx,
    shared: &Arc<Mutex<ScanOutcome>>,
) -> Result<()> {
    if ctx.suite.is_some() {
        if let Some(kind) = AssetKind::from_dir_name(dir_name) {
            ctx.kind = Some(kind);
            return Ok(());
        }
    }

    if ctx.suite.is_none() {
        if dir_name == GLOBAL_SUITE {
            ctx.suite = Some(GLOBAL_SUITE.to_string());
            ctx.module = Some(COMMON_MODULE.to_string());
            let mut outcome = shared.lock().await;
            outcome
                .suites
                .entry(GLOBAL_SUITE.to_string())
                .or_insert_with(|| Suite::new(GLOBAL_SUITE));
            return Ok(());
        }
        // Any other directory at suite depth is a suite boundary; a missing
        // sidecar is warned about and synthesized, not fatal.
        let sidecar_path = dir.join(SUITE_SIDECAR);
        if !sidecar_path.exists() {
            println!(
                "{}",
                t!("scan.missing_suite_sidecar", path = dir.display()).yellow()
            );
        }
        let meta = read_or_create_sidecar(dir, SUITE_SIDECAR).await?;
        ctx.suite = Some(dir_name.to_string());
        let mut outcome = shared.lock().await;
        let suite = outcome
            .suites
            .entry(dir_name.to_string())
            .or_insert_with(|| Suite::new(dir_name));
        suite.mapping = meta.mapping;
        return Ok(());
    }

    if ctx.module.is_none() {
        if dir_name == MODULES_DIR {
            return Ok(());
        }
        if dir_name == COMMON_MODULE {
            ctx.module = Some(COMMON_MODULE.to_string());
            return Ok(());
        }
        let sidecar_path = dir.join(MODULE_SIDECAR);
        if !sidecar_path.exists() {
            println!(
                "{}",
                t!("scan.missing_module_sidecar", path = dir.display()).yellow()
            );
        }
        let meta = read_or_create_sidecar(dir, MODULE_SIDECAR).await?;
        let suite_name = ctx.suite.clone().unwrap_or_default();
        ctx.module = Some(dir_name.to_string());
        let mut outcome = shared.lock().await;
        let module = outcome
            .suites
            .entry(suite_name.clone())
            .or_insert_with(|| Suite::new(&suite_name))
            .module_mut(dir_name);
        module.ignore = meta.ignore;
        module.mapping = meta.mapping;
    }
    Ok(())
}

/// Reads a sidecar metadata file, synthesizing missing fields and writing
/// the file back when anything was filled in.
/// 读取附属元数据文件，合成缺失字段，并在有填充时写回文件。
pub async fn read_or_create_sidecar(dir: &Path, file_name: &str) -> Result<SidecarMeta> {
    let path = dir.join(file_name);
    let mut meta = match tokio::fs::read_to_string(&path).await {
        Ok(content) => match serde_json::from_str::<SidecarMeta>(&content) {
            Ok(meta) => meta,
            Err(e) => {
                println!(
                    "{}",
                    t!("scan.sidecar_parse_failed", path = path.display(), error = e).yellow()
                );
                SidecarMeta::default()
            }
        },
        Err(_) => SidecarMeta::default(),
    };

    if meta.fill_missing(dir) {
        let content = serde_json::to_string_pretty(&meta)
            .context("Failed to serialize sidecar metadata")?;
        tokio::fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write sidecar: {}", path.display()))?;
    }
    Ok(meta)
}

/// Parses one leaf JSON file into an asset. A parse failure is logged and
/// the asset is skipped; it never aborts the scan.
async fn read_asset_file(path: PathBuf, ctx: ScanCtx, shared: Arc<Mutex<ScanOutcome>>) {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    if file_name == SUITE_SIDECAR || file_name == MODULE_SIDECAR {
        return;
    }
    let Some((name, platform)) = split_asset_filename(&file_name) else {
        return;
    };
    let (Some(kind), Some(suite)) = (ctx.kind, ctx.suite.clone()) else {
        return;
    };
    let module = ctx.module.unwrap_or_else(|| COMMON_MODULE.to_string());

    let document = match tokio::fs::read_to_string(&path).await {
        Ok(content) => match serde_json::from_str::<serde_json::Value>(&content) {
            Ok(doc) => doc,
            Err(e) => {
                println!(
                    "{}",
                    t!("scan.asset_parse_failed", path = path.display(), error = e).yellow()
                );
                return;
            }
        },
        Err(e) => {
            println!(
                "{}",
                t!("scan.asset_read_failed", path = path.display(), error = e).yellow()
            );
            return;
        }
    };

    let asset = Asset::new(suite, module, platform, kind, name, path);
    asset.set_document(document);
    shared.lock().await.insert_asset(asset);
}
