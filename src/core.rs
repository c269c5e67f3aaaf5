//! # Core Module / 核心模块
//!
//! This module contains the core functionality of Cascade Runner,
//! including the asset model, the resolution engine, and the test
//! execution orchestrator.
//!
//! 此模块包含 Cascade Runner 的核心功能，
//! 包括资产模型、解析引擎和测试执行编排器。

pub mod assets;
pub mod backend;
pub mod collection;
pub mod config;
pub mod error;
pub mod models;
pub mod registry;
pub mod run;
pub mod runner;
pub mod scanner;
pub mod scheduler;

// Re-exports
pub use collection::{AssetCollection, ResolveCriteria};
pub use config::RunnerConfig;
pub use error::OrchestratorError;
pub use models::{RunOptions, RunReport};
pub use registry::Assets;
pub use runner::TestRunner;
