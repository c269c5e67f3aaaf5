//! # Asset Registry Module / 资产注册表模块
//!
//! Top-level entry point over one or more project roots. Each canonical
//! root maps to exactly one shared [`AssetCollection`]; all collections
//! share one [`ScanScheduler`] so filesystem walks never overlap.
//!
//! 一个或多个项目根目录之上的顶层入口。每个规范化根目录恰好映射到一个共享的
//! [`AssetCollection`]；所有集合共享同一个 [`ScanScheduler`]，
//! 因此文件系统遍历永不重叠。

use crate::core::collection::AssetCollection;
use crate::core::config::RunnerConfig;
use crate::core::scheduler::ScanScheduler;
use crate::infra::fs as infra_fs;
use anyhow::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// The process-wide registry of loaded asset collections.
pub struct Assets {
    config: RunnerConfig,
    scheduler: ScanScheduler,
    collections: Mutex<HashMap<PathBuf, Arc<AssetCollection>>>,
}

impl Assets {
    pub fn new(config: RunnerConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            scheduler: ScanScheduler::default(),
            collections: Mutex::new(HashMap::new()),
        })
    }

    /// Loads the collection rooted at `path`, or returns the already-loaded
    /// one. The root is canonicalized first, so distinct spellings of the
    /// same directory share a single collection.
    ///
    /// 加载以 `path` 为根的集合，或返回已加载的集合。
    /// 根目录先被规范化，因此同一目录的不同写法共享一个集合。
    pub async fn load(&self, path: &Path) -> Result<Arc<AssetCollection>> {
        if !infra_fs::is_directory(path) {
            anyhow::bail!("Project root is not a directory: {}", path.display());
        }
        let root = infra_fs::absolute_path(path)?;
        let mut collections = self.collections.lock().await;
        if let Some(existing) = collections.get(&root) {
            return Ok(Arc::clone(existing));
        }
        let collection =
            AssetCollection::new(root.clone(), self.config.clone(), self.scheduler.clone());
        collection.load().await?;
        collections.insert(root, Arc::clone(&collection));
        Ok(collection)
    }

    /// The collection for `path`, if loaded.
    pub async fn collection(&self, path: &Path) -> Option<Arc<AssetCollection>> {
        let root = infra_fs::absolute_path(path).ok()?;
        self.collections.lock().await.get(&root).cloned()
    }

    /// Unloads every collection and evicts it from the registry.
    pub async fn destroy(&self) {
        let mut collections = self.collections.lock().await;
        for (_, collection) in collections.drain() {
            collection.unload();
        }
    }
}
