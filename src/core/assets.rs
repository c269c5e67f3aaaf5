//! # Asset Tree Model Module / 资产树模型模块
//!
//! This module defines the in-memory asset hierarchy used throughout the
//! cascade runner: Suite → Module → Platform → typed asset collections.
//! It also defines the canonical on-disk layout so that an asset's path is
//! always a pure function of its identity.
//!
//! 此模块定义了整个级联运行器中使用的内存资产层次结构：
//! Suite → Module → Platform → 类型化资产集合。
//! 它还定义了规范的磁盘布局，使资产的路径始终是其标识的纯函数。

use chrono::Utc;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// The reserved suite holding assets shared by every suite in a project.
/// 保存项目中所有套件共享资产的保留套件。
pub const GLOBAL_SUITE: &str = "global";
/// The reserved module holding assets shared by every module in a suite.
/// 保存套件中所有模块共享资产的保留模块。
pub const COMMON_MODULE: &str = "common";
/// The platform-agnostic fallback platform name.
/// 与平台无关的回退平台名称。
pub const GENERIC_PLATFORM: &str = "generic";
/// The directory under a suite that contains its modules.
/// 套件下包含其模块的目录。
pub const MODULES_DIR: &str = "modules";
/// Sidecar metadata file marking a suite directory.
/// 标记套件目录的附属元数据文件。
pub const SUITE_SIDECAR: &str = "suite.json";
/// Sidecar metadata file marking a module directory.
/// 标记模块目录的附属元数据文件。
pub const MODULE_SIDECAR: &str = "module.json";

/// The five kinds of reusable test content the runner understands.
/// 运行器理解的五种可重用测试内容。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Test,
    Action,
    Screen,
    Menu,
    Popup,
}

/// Maps a well-known directory name (`tests`, `actions`, ...) to its kind.
/// 将知名目录名称（`tests`、`actions` 等）映射到其类型。
static KIND_DIRS: Lazy<HashMap<&'static str, AssetKind>> = Lazy::new(|| {
    AssetKind::ALL
        .iter()
        .map(|kind| (kind.dir_name(), *kind))
        .collect()
});

impl AssetKind {
    pub const ALL: [AssetKind; 5] = [
        AssetKind::Test,
        AssetKind::Action,
        AssetKind::Screen,
        AssetKind::Menu,
        AssetKind::Popup,
    ];

    /// The well-known directory name holding assets of this kind.
    /// 保存此类型资产的知名目录名称。
    pub fn dir_name(&self) -> &'static str {
        match self {
            AssetKind::Test => "tests",
            AssetKind::Action => "actions",
            AssetKind::Screen => "screens",
            AssetKind::Menu => "menus",
            AssetKind::Popup => "popups",
        }
    }

    /// The singular, human-readable label for this kind.
    pub fn label(&self) -> &'static str {
        match self {
            AssetKind::Test => "test",
            AssetKind::Action => "action",
            AssetKind::Screen => "screen",
            AssetKind::Menu => "menu",
            AssetKind::Popup => "popup",
        }
    }

    /// Classifies a directory name, returning `None` for anything that is
    /// not one of the five well-known asset directories.
    pub fn from_dir_name(name: &str) -> Option<AssetKind> {
        KIND_DIRS.get(name).copied()
    }
}

/// Syntax descriptor carried in an asset's metadata.
/// 资产元数据中携带的语法描述符。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyntaxInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
}

/// The `meta` section of an asset document.
/// 资产文档的 `meta` 部分。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetMeta {
    /// Stable identifier, synthesized from the asset path when absent.
    /// 稳定标识符，缺失时根据资产路径合成。
    #[serde(default)]
    pub id: String,
    /// Human-readable display name (`meta.name` in the document).
    /// 人类可读的显示名称（文档中的 `meta.name`）。
    #[serde(default, rename = "name")]
    pub human_name: String,
    #[serde(default)]
    pub description: String,
    /// Marks the asset as a reusable widget rather than a standalone screen.
    /// 将资产标记为可重用小部件，而不是独立屏幕。
    #[serde(default)]
    pub widget: bool,
    #[serde(default)]
    pub syntax: SyntaxInfo,
    /// Environments this asset declares itself runnable in. An empty list
    /// means the asset runs in the single active environment.
    /// 此资产声明可运行的环境。空列表表示资产在单个活动环境中运行。
    #[serde(default)]
    pub environments: Vec<String>,
}

/// A named, typed unit of test content with a lazily loaded JSON document.
///
/// Identity fields are immutable for the asset's lifetime; the document and
/// derived metadata live behind locks so that a file-watch update can patch
/// them in place while a running test still holds a reference.
///
/// 具名的、类型化的测试内容单元，带有延迟加载的 JSON 文档。
///
/// 标识字段在资产的生命周期内不可变；文档和派生的元数据位于锁之后，
/// 以便文件监视更新可以就地修补它们，而正在运行的测试仍持有引用。
#[derive(Debug)]
pub struct Asset {
    pub suite: String,
    pub module: String,
    pub platform: String,
    pub kind: AssetKind,
    pub name: String,
    pub path: PathBuf,
    meta: RwLock<AssetMeta>,
    document: RwLock<Option<Value>>,
}

impl Asset {
    pub fn new(
        suite: impl Into<String>,
        module: impl Into<String>,
        platform: impl Into<String>,
        kind: AssetKind,
        name: impl Into<String>,
        path: PathBuf,
    ) -> Self {
        Self {
            suite: suite.into(),
            module: module.into(),
            platform: platform.into(),
            kind,
            name: name.into(),
            path,
            meta: RwLock::new(AssetMeta::default()),
            document: RwLock::new(None),
        }
    }

    /// Returns a snapshot of the asset's metadata.
    pub fn meta(&self) -> AssetMeta {
        self.meta.read().expect("asset meta lock poisoned").clone()
    }

    /// Returns a clone of the full document, if loaded.
    pub fn document(&self) -> Option<Value> {
        self.document
            .read()
            .expect("asset document lock poisoned")
            .clone()
    }

    /// Replaces the document wholesale and refreshes the derived metadata.
    /// 整体替换文档并刷新派生的元数据。
    pub fn set_document(&self, doc: Value) {
        self.refresh_meta(&doc);
        *self.document.write().expect("asset document lock poisoned") = Some(doc);
    }

    /// Applies a recursive remove-then-add merge of `incoming` into the
    /// current document: keys absent from `incoming` are deleted, present
    /// keys are overwritten, nested objects are merged in place. This keeps
    /// the document's identity stable for consumers holding the asset
    /// mid-test.
    ///
    /// 将 `incoming` 递归地以“先删后增”方式合并到当前文档中：
    /// `incoming` 中不存在的键被删除，存在的键被覆盖，嵌套对象就地合并。
    /// 这使持有资产的测试消费者看到的文档标识保持稳定。
    pub fn merge_document(&self, incoming: &Value) {
        {
            let mut guard = self.document.write().expect("asset document lock poisoned");
            match guard.as_mut() {
                Some(current) => merge_in_place(current, incoming),
                None => *guard = Some(incoming.clone()),
            }
        }
        self.refresh_meta(incoming);
    }

    /// The ordered action list of the document, empty when unloaded.
    pub fn actions(&self) -> Vec<Value> {
        self.document
            .read()
            .expect("asset document lock poisoned")
            .as_ref()
            .and_then(|doc| doc.get("actions"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    }

    /// Whether the asset declares itself runnable in `environment`.
    /// An asset with no `environments` list declares the active environment
    /// implicitly.
    pub fn declares_environment(&self, environment: &str) -> bool {
        let meta = self.meta.read().expect("asset meta lock poisoned");
        meta.environments.is_empty() || meta.environments.iter().any(|e| e == environment)
    }

    fn refresh_meta(&self, doc: &Value) {
        if let Some(meta_value) = doc.get("meta") {
            if let Ok(meta) = serde_json::from_value::<AssetMeta>(meta_value.clone()) {
                *self.meta.write().expect("asset meta lock poisoned") = meta;
            }
        }
    }
}

/// Recursive remove-then-add merge used by the file-watch protocol.
fn merge_in_place(current: &mut Value, incoming: &Value) {
    match (current, incoming) {
        (Value::Object(cur), Value::Object(inc)) => {
            cur.retain(|key, _| inc.contains_key(key));
            for (key, value) in inc {
                match cur.get_mut(key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        merge_in_place(existing, value);
                    }
                    _ => {
                        cur.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (current, incoming) => *current = incoming.clone(),
    }
}

/// One named execution target (e.g. `web`, `ios`), holding the five typed
/// asset collections keyed by asset name.
/// 一个具名执行目标（例如 `web`、`ios`），按资产名称保存五个类型化集合。
#[derive(Debug, Default)]
pub struct Platform {
    pub name: String,
    collections: HashMap<AssetKind, HashMap<String, Arc<Asset>>>,
}

impl Platform {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collections: HashMap::new(),
        }
    }

    pub fn get(&self, kind: AssetKind, name: &str) -> Option<Arc<Asset>> {
        self.collections.get(&kind).and_then(|c| c.get(name)).cloned()
    }

    pub fn insert(&mut self, asset: Arc<Asset>) {
        self.collections
            .entry(asset.kind)
            .or_default()
            .insert(asset.name.clone(), asset);
    }

    pub fn remove(&mut self, kind: AssetKind, name: &str) -> Option<Arc<Asset>> {
        self.collections.get_mut(&kind).and_then(|c| c.remove(name))
    }

    pub fn all_of_kind(&self, kind: AssetKind) -> Vec<Arc<Asset>> {
        self.collections
            .get(&kind)
            .map(|c| c.values().cloned().collect())
            .unwrap_or_default()
    }

}

/// A grouping of assets within a suite. The module named `common` is shared
/// by every other module of the same suite.
/// 套件内的资产分组。名为 `common` 的模块由同一套件的所有其他模块共享。
#[derive(Debug, Default)]
pub struct Module {
    pub name: String,
    /// Platforms this module is excluded from.
    /// 此模块被排除的平台。
    pub ignore: Vec<String>,
    /// Name → selector override mapping from the module sidecar.
    pub mapping: Map<String, Value>,
    pub platforms: HashMap<String, Platform>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn is_ignored(&self, platform: &str) -> bool {
        self.ignore.iter().any(|p| p == platform)
    }

    pub fn platform_mut(&mut self, name: &str) -> &mut Platform {
        self.platforms
            .entry(name.to_string())
            .or_insert_with(|| Platform::new(name))
    }

    /// Two-tier lookup: the requested platform first, then `generic`.
    /// 两层查找：先请求的平台，再 `generic`。
    pub fn asset(&self, kind: AssetKind, name: &str, platform: &str) -> Option<Arc<Asset>> {
        self.platforms
            .get(platform)
            .and_then(|p| p.get(kind, name))
            .or_else(|| {
                self.platforms
                    .get(GENERIC_PLATFORM)
                    .and_then(|p| p.get(kind, name))
            })
    }

    /// All assets of a kind under the requested platform plus `generic`.
    /// Both tiers are included; a platform-specific asset does not shadow a
    /// generic one with the same name here.
    pub fn assets_of_kind(&self, kind: AssetKind, platform: &str) -> Vec<Arc<Asset>> {
        let mut out = Vec::new();
        if let Some(p) = self.platforms.get(platform) {
            out.extend(p.all_of_kind(kind));
        }
        if platform != GENERIC_PLATFORM {
            if let Some(p) = self.platforms.get(GENERIC_PLATFORM) {
                out.extend(p.all_of_kind(kind));
            }
        }
        out.sort_by(|a, b| (&a.name, &a.platform).cmp(&(&b.name, &b.platform)));
        out
    }
}

/// Top-level grouping of test assets, mapping to one project sub-directory.
/// 测试资产的顶层分组，映射到一个项目子目录。
#[derive(Debug, Default)]
pub struct Suite {
    pub name: String,
    pub mapping: Map<String, Value>,
    pub modules: HashMap<String, Module>,
}

impl Suite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn module_mut(&mut self, name: &str) -> &mut Module {
        self.modules
            .entry(name.to_string())
            .or_insert_with(|| Module::new(name))
    }
}

/// Sidecar metadata persisted as `suite.json` / `module.json`.
/// 作为 `suite.json` / `module.json` 持久化的附属元数据。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SidecarMeta {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Creation timestamp in milliseconds since the Unix epoch.
    /// 自 Unix 纪元以来的创建时间戳（毫秒）。
    #[serde(default)]
    pub created: Option<i64>,
    /// Platforms the owning module is excluded from (modules only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore: Vec<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub mapping: Map<String, Value>,
}

impl SidecarMeta {
    /// Fills any missing metadata fields from the directory the sidecar
    /// lives in. Returns `true` when something was synthesized, which tells
    /// the caller to write the sidecar back to disk.
    ///
    /// 从附属文件所在目录填充缺失的元数据字段。
    /// 当有字段被合成时返回 `true`，提示调用者将附属文件写回磁盘。
    pub fn fill_missing(&mut self, dir: &Path) -> bool {
        let mut synthesized = false;
        let leaf = dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        if self.id.is_empty() {
            self.id = path_id(dir);
            synthesized = true;
        }
        if self.name.is_empty() {
            self.name = capitalize(&leaf);
            synthesized = true;
        }
        if self.description.is_empty() {
            self.description = format!("Description of {}", self.name);
            synthesized = true;
        }
        if self.created.is_none() {
            self.created = Some(Utc::now().timestamp_millis());
            synthesized = true;
        }
        synthesized
    }
}

/// Derives a stable hex identifier from a directory path.
pub fn path_id(path: &Path) -> String {
    let mut hasher = DefaultHasher::new();
    path.to_string_lossy().hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// Capitalizes the first character: `"foo"` → `"Foo"`.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Computes the canonical path of an asset from its identity alone.
///
/// - `global/<kind>s/` for the global suite,
/// - `<suite>/common/<kind>s/` for the common module,
/// - `<suite>/modules/<module>/<kind>s/` otherwise,
///
/// with the filename `<name>[.<platform>].json` (no suffix for `generic`).
///
/// 仅根据资产标识计算其规范路径。
pub fn asset_path(
    root: &Path,
    suite: &str,
    module: &str,
    platform: &str,
    kind: AssetKind,
    name: &str,
) -> PathBuf {
    let file = if platform == GENERIC_PLATFORM {
        format!("{name}.json")
    } else {
        format!("{name}.{platform}.json")
    };
    let dir = if suite == GLOBAL_SUITE {
        root.join(GLOBAL_SUITE).join(kind.dir_name())
    } else if module == COMMON_MODULE {
        root.join(suite).join(COMMON_MODULE).join(kind.dir_name())
    } else {
        root.join(suite)
            .join(MODULES_DIR)
            .join(module)
            .join(kind.dir_name())
    };
    dir.join(file)
}

/// Splits an asset filename into its name and platform components:
/// `login.web.json` → (`login`, `web`), `login.json` → (`login`, `generic`).
/// Returns `None` for non-JSON files.
pub fn split_asset_filename(file_name: &str) -> Option<(String, String)> {
    let stem = file_name.strip_suffix(".json")?;
    if stem.is_empty() {
        return None;
    }
    match stem.rsplit_once('.') {
        Some((name, platform)) if !name.is_empty() && !platform.is_empty() => {
            Some((name.to_string(), platform.to_string()))
        }
        _ => Some((stem.to_string(), GENERIC_PLATFORM.to_string())),
    }
}
