//! # Asset Collection Module / 资产集合模块
//!
//! An `AssetCollection` owns the full suite tree for one project root: it
//! loads the tree through the scan scheduler, answers precedence-ordered
//! `resolve` requests, keeps the tree live through file-watch events, and
//! provides CRUD that persists the canonical directory layout.
//!
//! `AssetCollection` 拥有一个项目根目录的完整套件树：
//! 它通过扫描调度器加载树，回答按优先级排序的 `resolve` 请求，
//! 通过文件监视事件保持树的活性，并提供持久化规范目录布局的 CRUD。

use crate::core::assets::{
    Asset, AssetKind, COMMON_MODULE, GLOBAL_SUITE, MODULE_SIDECAR, MODULES_DIR, SidecarMeta,
    Suite, SUITE_SIDECAR, asset_path, capitalize, path_id,
};
use crate::core::config::RunnerConfig;
use crate::core::error::OrchestratorError;
use crate::core::scanner;
use crate::core::scheduler::ScanScheduler;
use crate::infra::watch::{WatchEvent, WatchHandle, watch_tree};
use crate::infra::{fs as infra_fs, t};
use anyhow::{Context, Result, anyhow};
use colored::*;
use serde_json::json;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// The lookup request answered by [`AssetCollection::resolve`].
/// 由 [`AssetCollection::resolve`] 回答的查找请求。
#[derive(Debug, Clone)]
pub struct ResolveCriteria {
    pub kind: AssetKind,
    pub name: String,
    pub suite: String,
    pub module: String,
    pub platform: String,
    /// Whether the suite's `common` module may satisfy the request.
    pub accept_common: bool,
    /// Whether the `global` suite may satisfy the request.
    pub accept_global: bool,
}

impl ResolveCriteria {
    pub fn new(
        kind: AssetKind,
        name: impl Into<String>,
        suite: impl Into<String>,
        module: impl Into<String>,
        platform: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            suite: suite.into(),
            module: module.into(),
            platform: platform.into(),
            accept_common: true,
            accept_global: true,
        }
    }
}

/// The live in-memory model for one root: the suite tree plus the flat
/// absolute-path index.
#[derive(Default)]
struct CollectionState {
    suites: HashMap<String, Suite>,
    assets: HashMap<PathBuf, Arc<Asset>>,
}

/// Owns one asset tree for one project root.
/// 拥有一个项目根目录的一棵资产树。
pub struct AssetCollection {
    root: PathBuf,
    key: String,
    config: RunnerConfig,
    scheduler: ScanScheduler,
    state: RwLock<CollectionState>,
    watcher: Mutex<Option<WatchHandle>>,
    /// Bumped on every (re)load; an incremental patch observed under an
    /// older generation is superseded and dropped.
    /// 每次（重新）加载时递增；在旧代观察到的增量补丁被取代并丢弃。
    generation: AtomicU64,
}

impl AssetCollection {
    pub fn new(root: PathBuf, config: RunnerConfig, scheduler: ScanScheduler) -> Arc<Self> {
        let key = root.to_string_lossy().to_string();
        Arc::new(Self {
            root,
            key,
            config,
            scheduler,
            state: RwLock::new(CollectionState::default()),
            watcher: Mutex::new(None),
            generation: AtomicU64::new(0),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Clears the current state, schedules a scan through the single-flight
    /// scheduler, and installs the recursive file watcher (unless disabled).
    /// Completion of the underlying walk is awaited here; concurrent load
    /// requests for the same root coalesce onto one walk.
    ///
    /// 清除当前状态，通过单飞调度器调度扫描，
    /// 并安装递归文件监视器（除非已禁用）。
    pub async fn load(self: &Arc<Self>) -> Result<()> {
        self.generation.fetch_add(1, Ordering::SeqCst);
        *self.state.write().expect("collection state lock poisoned") = CollectionState::default();

        let me = Arc::clone(self);
        let done = self
            .scheduler
            .schedule(&self.key, async move {
                match scanner::scan(&me.root, &me.config).await {
                    Ok(outcome) => {
                        let mut state =
                            me.state.write().expect("collection state lock poisoned");
                        state.suites = outcome.suites;
                        state.assets = outcome.assets;
                    }
                    Err(e) => {
                        println!(
                            "{}",
                            t!("scan.failed", path = me.root.display(), error = e).red()
                        );
                    }
                }
            })
            .await;
        let _ = done.await;

        if self.config.watch {
            self.ensure_watcher()?;
        }
        Ok(())
    }

    /// Re-runs `load`; used by the file-watch callback when a structural
    /// change is observed.
    pub async fn reload(self: &Arc<Self>) -> Result<()> {
        self.load().await
    }

    /// Drops the watcher and the in-memory tree.
    pub fn unload(&self) {
        *self.watcher.lock().expect("watcher lock poisoned") = None;
        *self.state.write().expect("collection state lock poisoned") = CollectionState::default();
    }

    fn ensure_watcher(self: &Arc<Self>) -> Result<()> {
        let mut guard = self.watcher.lock().expect("watcher lock poisoned");
        if guard.is_some() {
            return Ok(());
        }
        let (handle, rx) = watch_tree(self.root.clone())?;
        *guard = Some(handle);
        drop(guard);

        let weak: Weak<AssetCollection> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut events = UnboundedReceiverStream::new(rx);
            while let Some(event) = events.next().await {
                let Some(collection) = weak.upgrade() else { break };
                if let Err(e) = collection.apply_change(event).await {
                    println!("{}", t!("watch.apply_failed", error = e).yellow());
                }
            }
        });
        Ok(())
    }

    /// Resolves the best-matching concrete asset for `criteria` under the
    /// defined precedence order:
    ///
    /// exact(suite,module,platform) → exact(suite,module,generic) →
    /// common(suite,platform) → common(suite,generic) →
    /// global(platform) → global(generic).
    ///
    /// An unknown suite or module is a structural `AssetNotFound` error; a
    /// merely-absent asset is `Ok(None)`; absence is a normal outcome.
    ///
    /// 按定义的优先级顺序为 `criteria` 解析最佳匹配的具体资产。
    /// 未知的套件或模块是结构性 `AssetNotFound` 错误；
    /// 仅仅缺失的资产是 `Ok(None)`——缺失是正常结果。
    pub fn resolve(&self, criteria: &ResolveCriteria) -> Result<Option<Arc<Asset>>> {
        let state = self.state.read().expect("collection state lock poisoned");
        let suite = state.suites.get(&criteria.suite).ok_or_else(|| {
            anyhow!(OrchestratorError::AssetNotFound(format!(
                "suite '{}'",
                criteria.suite
            )))
        })?;
        let module = suite.modules.get(&criteria.module).ok_or_else(|| {
            anyhow!(OrchestratorError::AssetNotFound(format!(
                "module '{}' in suite '{}'",
                criteria.module, criteria.suite
            )))
        })?;

        if let Some(hit) = module.asset(criteria.kind, &criteria.name, &criteria.platform) {
            return Ok(Some(hit));
        }
        if criteria.accept_common {
            if let Some(hit) = suite
                .modules
                .get(COMMON_MODULE)
                .and_then(|m| m.asset(criteria.kind, &criteria.name, &criteria.platform))
            {
                return Ok(Some(hit));
            }
        }
        if criteria.accept_global {
            if let Some(hit) = state
                .suites
                .get(GLOBAL_SUITE)
                .and_then(|s| s.modules.get(COMMON_MODULE))
                .and_then(|m| m.asset(criteria.kind, &criteria.name, &criteria.platform))
            {
                return Ok(Some(hit));
            }
        }
        Ok(None)
    }

    /// Whether the module is marked ignored for `platform`. The caller
    /// decides whether that is a hard failure or a warned skip.
    pub fn module_ignored(&self, suite: &str, module: &str, platform: &str) -> Result<bool> {
        let state = self.state.read().expect("collection state lock poisoned");
        let module = Self::module_of(&state, suite, module)?;
        Ok(module.is_ignored(platform))
    }

    /// All tests of a module under `platform` plus the `generic` tier, in
    /// deterministic (name, platform) order. Both tiers run; a
    /// platform-specific test does not exclude a generic one.
    pub fn module_tests(
        &self,
        suite: &str,
        module: &str,
        platform: &str,
    ) -> Result<Vec<Arc<Asset>>> {
        let state = self.state.read().expect("collection state lock poisoned");
        let module = Self::module_of(&state, suite, module)?;
        Ok(module.assets_of_kind(AssetKind::Test, platform))
    }

    /// The module names of a suite, excluding `common`, sorted.
    pub fn suite_module_names(&self, suite: &str) -> Result<Vec<String>> {
        let state = self.state.read().expect("collection state lock poisoned");
        let suite = state.suites.get(suite).ok_or_else(|| {
            anyhow!(OrchestratorError::AssetNotFound(format!("suite '{suite}'")))
        })?;
        let mut names: Vec<String> = suite
            .modules
            .keys()
            .filter(|name| name.as_str() != COMMON_MODULE)
            .cloned()
            .collect();
        names.sort();
        Ok(names)
    }

    pub fn asset_count(&self) -> usize {
        self.state
            .read()
            .expect("collection state lock poisoned")
            .assets
            .len()
    }

    pub fn asset_at(&self, path: &Path) -> Option<Arc<Asset>> {
        self.state
            .read()
            .expect("collection state lock poisoned")
            .assets
            .get(path)
            .cloned()
    }

    fn module_of<'a>(
        state: &'a CollectionState,
        suite: &str,
        module: &str,
    ) -> Result<&'a crate::core::assets::Module> {
        let suite_entry = state.suites.get(suite).ok_or_else(|| {
            anyhow!(OrchestratorError::AssetNotFound(format!("suite '{suite}'")))
        })?;
        suite_entry.modules.get(module).ok_or_else(|| {
            anyhow!(OrchestratorError::AssetNotFound(format!(
                "module '{module}' in suite '{suite}'"
            )))
        })
    }

    /// Applies one observed filesystem change.
    ///
    /// A content modification of a sidecar patches only the in-memory
    /// `mapping`/`ignore` fields; a modification of a known asset merges the
    /// new document in place, preserving object identity for consumers
    /// holding the asset mid-test. Anything else (structural change,
    /// unknown path) falls back to a full reload, which supersedes any
    /// patch still in flight.
    ///
    /// 应用一次观察到的文件系统变更。
    /// 附属文件的内容修改只修补内存中的 `mapping`/`ignore` 字段；
    /// 已知资产的修改将新文档就地合并，为持有资产的测试消费者保留对象标识。
    /// 其他情况回退到完全重新加载，并取代仍在途的补丁。
    pub async fn apply_change(self: &Arc<Self>, event: WatchEvent) -> Result<()> {
        let (WatchEvent::Structural(path) | WatchEvent::Modified(path)) = &event;
        if self.change_ignored(path) {
            return Ok(());
        }
        match event {
            WatchEvent::Structural(_) => self.reload().await,
            WatchEvent::Modified(path) => {
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                match file_name.as_str() {
                    SUITE_SIDECAR => self.patch_sidecar(&path, true).await,
                    MODULE_SIDECAR => self.patch_sidecar(&path, false).await,
                    _ => self.patch_asset(&path).await,
                }
            }
        }
    }

    /// Whether a changed path lies in a subtree the scanner never enters:
    /// the results directory (the orchestrator's own record, screenshot, and
    /// trace writes land there) or any ignored directory. Such changes must
    /// not patch the model or trigger a reload.
    ///
    /// 变更路径是否位于扫描器从不进入的子树中：
    /// 结果目录或任何被忽略的目录。此类变更不得修补模型或触发重新加载。
    fn change_ignored(&self, path: &Path) -> bool {
        if path.starts_with(self.root.join(&self.config.results_dir)) {
            return true;
        }
        let Ok(relative) = path.strip_prefix(&self.root) else {
            return false;
        };
        relative.components().any(|component| {
            component.as_os_str().to_str().is_some_and(|name| {
                self.config
                    .ignore_test_directories
                    .iter()
                    .any(|ignored| ignored == name)
            })
        })
    }

    async fn patch_sidecar(&self, path: &Path, is_suite: bool) -> Result<()> {
        let Some(dir) = path.parent() else {
            return Ok(());
        };
        let leaf = dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read sidecar: {}", path.display()))?;
        let meta: SidecarMeta = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse sidecar: {}", path.display()))?;

        let mut state = self.state.write().expect("collection state lock poisoned");
        if is_suite {
            if let Some(suite) = state.suites.get_mut(&leaf) {
                suite.mapping = meta.mapping;
            }
        } else {
            // <suite>/modules/<module>/module.json, or <suite>/common/module.json
            let suite_name = dir
                .parent()
                .filter(|p| p.file_name().is_some_and(|n| n == MODULES_DIR))
                .and_then(Path::parent)
                .or(dir.parent())
                .and_then(Path::file_name)
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            if let Some(module) = state
                .suites
                .get_mut(&suite_name)
                .and_then(|s| s.modules.get_mut(&leaf))
            {
                module.ignore = meta.ignore;
                module.mapping = meta.mapping;
            }
        }
        Ok(())
    }

    async fn patch_asset(self: &Arc<Self>, path: &Path) -> Result<()> {
        let Some(asset) = self.asset_at(path) else {
            // The asset is unknown to the in-memory model; only a rescan can
            // place it correctly.
            return self.reload().await;
        };
        let generation = self.generation.load(Ordering::SeqCst);
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read asset: {}", path.display()))?;
        let document: serde_json::Value = match serde_json::from_str(&content) {
            Ok(doc) => doc,
            Err(e) => {
                println!(
                    "{}",
                    t!("scan.asset_parse_failed", path = path.display(), error = e).yellow()
                );
                return Ok(());
            }
        };
        if self.generation.load(Ordering::SeqCst) != generation {
            // A reload happened while we were reading; it supersedes this patch.
            return Ok(());
        }
        asset.merge_document(&document);
        Ok(())
    }

    /// Creates the on-disk skeleton for a new suite (`modules/` plus a
    /// `common` module with the five asset directories) and persists its
    /// sidecar with synthesized metadata.
    /// 为新套件创建磁盘骨架并持久化带有合成元数据的附属文件。
    pub fn make_suite(&self, name: &str) -> Result<PathBuf> {
        let dir = self.root.join(name);
        std::fs::create_dir_all(dir.join(MODULES_DIR))
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        infra_fs::create_kind_skeleton(&dir.join(COMMON_MODULE))?;
        let mut meta = SidecarMeta::default();
        meta.fill_missing(&dir);
        infra_fs::write_json_pretty(&dir.join(SUITE_SIDECAR), &meta)?;
        self.state
            .write()
            .expect("collection state lock poisoned")
            .suites
            .entry(name.to_string())
            .or_insert_with(|| Suite::new(name));
        Ok(dir)
    }

    /// Creates the on-disk skeleton for a new module (the five asset
    /// directories) and persists its sidecar.
    pub fn make_module(&self, suite: &str, name: &str) -> Result<PathBuf> {
        let dir = self.root.join(suite).join(MODULES_DIR).join(name);
        infra_fs::create_kind_skeleton(&dir)?;
        let mut meta = SidecarMeta::default();
        meta.fill_missing(&dir);
        infra_fs::write_json_pretty(&dir.join(MODULE_SIDECAR), &meta)?;
        let mut state = self.state.write().expect("collection state lock poisoned");
        state
            .suites
            .entry(suite.to_string())
            .or_insert_with(|| Suite::new(suite))
            .module_mut(name);
        Ok(dir)
    }

    /// Creates a new asset document at its canonical path with synthesized
    /// metadata matching the scanner's auto-fill rules.
    pub fn make_asset(
        &self,
        kind: AssetKind,
        name: &str,
        suite: &str,
        module: &str,
        platform: &str,
    ) -> Result<Arc<Asset>> {
        let path = asset_path(&self.root, suite, module, platform, kind, name);
        let document = json!({
            "meta": {
                "id": path_id(&path),
                "name": capitalize(name),
                "description": format!("Description of {}", capitalize(name)),
                "widget": false,
                "syntax": { "name": "cascade-steps", "version": "1.0" },
                "environments": [],
            },
            "actions": [],
        });
        infra_fs::write_json_pretty(&path, &document)?;

        let asset = Arc::new(Asset::new(suite, module, platform, kind, name, path.clone()));
        asset.set_document(document);
        let mut state = self.state.write().expect("collection state lock poisoned");
        state
            .suites
            .entry(suite.to_string())
            .or_insert_with(|| Suite::new(suite))
            .module_mut(module)
            .platform_mut(platform)
            .insert(Arc::clone(&asset));
        state.assets.insert(path, Arc::clone(&asset));
        Ok(asset)
    }

    /// Removes an asset file and its in-memory entry.
    pub fn delete_asset(
        &self,
        kind: AssetKind,
        name: &str,
        suite: &str,
        module: &str,
        platform: &str,
    ) -> Result<()> {
        let path = asset_path(&self.root, suite, module, platform, kind, name);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove asset: {}", path.display()))?;
        }
        let mut state = self.state.write().expect("collection state lock poisoned");
        state.assets.remove(&path);
        if let Some(platform) = state
            .suites
            .get_mut(suite)
            .and_then(|s| s.modules.get_mut(module))
            .and_then(|m| m.platforms.get_mut(platform))
        {
            platform.remove(kind, name);
        }
        Ok(())
    }

    /// Removes a module directory tree and its in-memory entry.
    pub fn delete_module(&self, suite: &str, name: &str) -> Result<()> {
        let dir = self.root.join(suite).join(MODULES_DIR).join(name);
        infra_fs::remove_dir_tree(&dir)?;
        let mut state = self.state.write().expect("collection state lock poisoned");
        if let Some(suite) = state.suites.get_mut(suite) {
            suite.modules.remove(name);
        }
        state.assets.retain(|path, _| !path.starts_with(&dir));
        Ok(())
    }

    /// Removes a suite directory tree and its in-memory entry.
    pub fn delete_suite(&self, name: &str) -> Result<()> {
        let dir = self.root.join(name);
        infra_fs::remove_dir_tree(&dir)?;
        let mut state = self.state.write().expect("collection state lock poisoned");
        state.suites.remove(name);
        state.assets.retain(|path, _| !path.starts_with(&dir));
        Ok(())
    }
}
