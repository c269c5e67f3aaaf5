//! # File System Operations Module / 文件系统操作模块
//!
//! This module provides utilities for file system operations, such as
//! canonicalizing paths, reading and writing JSON documents, and creating
//! the standard asset directory skeletons.
//!
//! 此模块提供文件系统操作的实用功能，
//! 如规范化路径、读写 JSON 文档以及创建标准资产目录骨架。

use crate::core::assets::AssetKind;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Gets the absolute path from a potentially relative path.
///
/// # Arguments
/// * `path` - Path to canonicalize
///
/// # Returns
/// Canonicalized absolute path, or an error if the path doesn't exist
pub fn absolute_path(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path).with_context(|| format!("Failed to resolve path: {}", path.display()))
}

/// Checks if a path exists and is a directory.
pub fn is_directory(path: &Path) -> bool {
    path.exists() && path.is_dir()
}

/// Serializes `value` as pretty JSON and writes it, creating parent
/// directories as needed.
pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let content = serde_json::to_string_pretty(value).context("Failed to serialize JSON")?;
    fs::write(path, content).with_context(|| format!("Failed to write file: {}", path.display()))
}

/// Creates the five well-known asset sub-directories under `dir`.
/// 在 `dir` 下创建五个知名的资产子目录。
pub fn create_kind_skeleton(dir: &Path) -> Result<()> {
    for kind in AssetKind::ALL {
        let sub = dir.join(kind.dir_name());
        fs::create_dir_all(&sub)
            .with_context(|| format!("Failed to create directory: {}", sub.display()))?;
    }
    Ok(())
}

/// Removes a directory tree, tolerating an already-missing path.
pub fn remove_dir_tree(path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    fs_extra::dir::remove(path)
        .with_context(|| format!("Failed to remove directory: {}", path.display()))
}
