//! # File Watch Module / 文件监视模块
//!
//! Bridges `notify` filesystem events into the tokio world. The collection
//! layer consumes the resulting channel to apply incremental in-memory
//! updates (content modifications) or trigger full reloads (structural
//! changes such as adds, deletes, and renames).
//!
//! 将 `notify` 文件系统事件桥接到 tokio 世界。
//! 集合层消费生成的通道，以应用增量内存更新（内容修改）
//! 或触发完全重新加载（新增、删除、重命名等结构性变更）。

use anyhow::{Context, Result};
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::PathBuf;
use tokio::sync::mpsc;

/// A filesystem change relevant to an asset collection.
/// 与资产集合相关的文件系统变更。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// The contents of an existing file changed in place.
    /// 现有文件的内容就地更改。
    Modified(PathBuf),
    /// Something was added, removed, or renamed; the in-memory model can no
    /// longer be patched incrementally.
    /// 有内容被添加、删除或重命名；内存模型不能再增量修补。
    Structural(PathBuf),
}

/// Keeps the underlying watcher alive; dropping it stops watching.
/// 保持底层监视器存活；丢弃它会停止监视。
pub struct WatchHandle {
    _watcher: RecommendedWatcher,
}

/// Installs a recursive watcher on `root`, delivering classified events on
/// an unbounded channel. Classification happens on the notify thread; the
/// channel hands events to the async consumer in observation order.
///
/// 在 `root` 上安装递归监视器，通过无界通道传递已分类的事件。
pub fn watch_tree(root: PathBuf) -> Result<(WatchHandle, mpsc::UnboundedReceiver<WatchEvent>)> {
    let (tx, rx) = mpsc::unbounded_channel();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        let Ok(event) = res else { return };
        for watch_event in classify_event(&event) {
            // The consumer side may already be gone during shutdown.
            let _ = tx.send(watch_event);
        }
    })
    .context("Failed to create filesystem watcher")?;

    watcher
        .watch(&root, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch directory: {}", root.display()))?;

    Ok((WatchHandle { _watcher: watcher }, rx))
}

fn classify_event(event: &Event) -> Vec<WatchEvent> {
    let structural = match &event.kind {
        EventKind::Create(_) | EventKind::Remove(_) => true,
        EventKind::Modify(ModifyKind::Name(_)) => true,
        EventKind::Modify(ModifyKind::Metadata(_)) | EventKind::Access(_) => return Vec::new(),
        EventKind::Modify(_) => false,
        _ => return Vec::new(),
    };
    event
        .paths
        .iter()
        .map(|path| {
            if structural {
                WatchEvent::Structural(path.clone())
            } else {
                WatchEvent::Modified(path.clone())
            }
        })
        .collect()
}
