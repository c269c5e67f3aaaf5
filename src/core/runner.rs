//! # Test Runner Module / 测试运行器模块
//!
//! The execution orchestrator. It accepts one run request at a time,
//! dispatches it to the right level (test, action, module, suite), drives
//! the attached automation backend strictly sequentially, and emits an
//! immutable result record at every level boundary.
//!
//! 测试执行编排器。它一次接受一个运行请求，将其调度到正确的级别
//! （测试、动作、模块、套件），严格顺序地驱动附加的自动化后端，
//! 并在每个级别边界发出不可变的结果记录。

use crate::core::assets::{Asset, AssetKind};
use crate::core::backend::{AutomationBackend, ResultSink, TraceContext};
use crate::core::collection::{AssetCollection, ResolveCriteria};
use crate::core::config::RunnerConfig;
use crate::core::error::OrchestratorError;
use crate::core::models::{Artifacts, Counts, ReportLevel, RunOptions, RunReport};
use crate::core::registry::Assets;
use crate::core::run::Run;
use crate::infra::t;
use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use colored::*;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// Settle delay after an app restart, for backends that need one.
/// 应用重启后的稳定延迟，用于需要重启的后端。
const RESTART_SETTLE: Duration = Duration::from_millis(1500);

/// Handle to an in-flight run: the shared [`Run`] for stop requests and the
/// spawned task producing the final top-level report.
#[derive(Debug)]
pub struct RunHandle {
    pub run: Arc<Run>,
    task: JoinHandle<Result<RunReport>>,
}

impl RunHandle {
    /// Waits for the run to complete and returns its top-level report.
    pub async fn wait(self) -> Result<RunReport> {
        self.task.await.context("Run task panicked")?
    }
}

/// The orchestrator. One instance serves one project root; a process-wide
/// invariant allows only one run in flight at a time.
/// 编排器。一个实例服务一个项目根目录；
/// 进程级不变量保证同一时间只有一个运行在途。
pub struct TestRunner {
    config: RunnerConfig,
    registry: Arc<Assets>,
    root: PathBuf,
    backend: RwLock<Option<Arc<dyn AutomationBackend>>>,
    sink: RwLock<Option<Arc<dyn ResultSink>>>,
    active: AtomicBool,
}

impl TestRunner {
    pub fn new(config: RunnerConfig, registry: Arc<Assets>, root: PathBuf) -> Arc<Self> {
        Arc::new(Self {
            config,
            registry,
            root,
            backend: RwLock::new(None),
            sink: RwLock::new(None),
            active: AtomicBool::new(false),
        })
    }

    /// Starts the automation backend and attaches it. Until this succeeds,
    /// every run request fails with `NoFrameworkStarted`.
    /// 启动自动化后端并附加它。在成功之前，每个运行请求都会失败。
    pub async fn start_framework(
        &self,
        backend: Arc<dyn AutomationBackend>,
        options: &Value,
    ) -> Result<()> {
        backend.start(options).await?;
        *self.backend.write().expect("backend lock poisoned") = Some(backend);
        Ok(())
    }

    /// Stops and detaches the backend, if one is attached.
    pub async fn stop_framework(&self) -> Result<()> {
        let backend = self.backend.write().expect("backend lock poisoned").take();
        if let Some(backend) = backend {
            backend.stop().await?;
        }
        Ok(())
    }

    /// Attaches the result sink reports and traces are persisted through.
    pub fn set_sink(&self, sink: Arc<dyn ResultSink>) {
        *self.sink.write().expect("sink lock poisoned") = Some(sink);
    }

    fn backend(&self) -> Result<Arc<dyn AutomationBackend>> {
        self.backend
            .read()
            .expect("backend lock poisoned")
            .clone()
            .ok_or_else(|| anyhow!(OrchestratorError::NoFrameworkStarted))
    }

    fn sink(&self) -> Option<Arc<dyn ResultSink>> {
        self.sink.read().expect("sink lock poisoned").clone()
    }

    /// Validates the request, claims the single-run slot, and spawns the
    /// dispatch task. Dispatch priority is test → action → module → suite.
    ///
    /// 校验请求，占用单运行槽位，并生成调度任务。
    /// 调度优先级为 测试 → 动作 → 模块 → 套件。
    pub fn run(self: &Arc<Self>, options: RunOptions) -> Result<RunHandle> {
        Self::validate(&options)?;
        // Fail fast before claiming the slot.
        self.backend()?;
        if self.active.swap(true, Ordering::SeqCst) {
            return Err(anyhow!(OrchestratorError::TestingInProgress));
        }

        let run = Run::new();
        let me = Arc::clone(self);
        let run_for_task = Arc::clone(&run);
        let task = tokio::spawn(async move {
            let result = me.dispatch(&run_for_task, options).await;
            me.active.store(false, Ordering::SeqCst);
            match &result {
                Ok(report) => run_for_task.finish(report.stopped),
                Err(_) => run_for_task.finish(false),
            }
            result
        });
        Ok(RunHandle { run, task })
    }

    fn validate(options: &RunOptions) -> Result<()> {
        let leaf = options.test.is_some() || options.action.is_some();
        if !leaf && options.module.is_none() && options.suite.is_none() {
            return Err(anyhow!(OrchestratorError::InvalidArguments(
                "one of test, action, module or suite is required".into()
            )));
        }
        if leaf && (options.suite.is_none() || options.module.is_none()) {
            return Err(anyhow!(OrchestratorError::InvalidArguments(
                "a test or action run requires both suite and module".into()
            )));
        }
        if options.module.is_some() && options.suite.is_none() {
            return Err(anyhow!(OrchestratorError::InvalidArguments(
                "a module run requires a suite".into()
            )));
        }
        Ok(())
    }

    async fn dispatch(self: &Arc<Self>, run: &Arc<Run>, options: RunOptions) -> Result<RunReport> {
        let collection = self.registry.load(&self.root).await?;
        let platform = options
            .platform
            .clone()
            .unwrap_or_else(|| self.config.platform.clone());

        let report = if let Some(test) = &options.test {
            let report = self
                .run_leaf_request(run, &collection, AssetKind::Test, test, &options, &platform)
                .await?;
            self.emit(&report).await;
            report
        } else if let Some(action) = &options.action {
            let report = self
                .run_leaf_request(run, &collection, AssetKind::Action, action, &options, &platform)
                .await?;
            self.emit(&report).await;
            report
        } else if let Some(module) = &options.module {
            let suite = options.suite.as_deref().unwrap_or_default();
            let report = self
                .run_module(run, &collection, suite, module, &platform, options.range)
                .await?;
            self.emit(&report).await;
            report
        } else {
            let suite = options.suite.as_deref().unwrap_or_default();
            let report = self
                .run_suite(run, &collection, suite, &platform, options.modules.as_deref())
                .await?;
            self.emit(&report).await;
            report
        };
        Ok(report)
    }

    /// Runs one directly requested leaf. A module marked ignored for the
    /// platform short-circuits with a warning and an empty passing report,
    /// matching the module-level treatment of the ignore flag.
    ///
    /// 运行一个直接请求的叶子。在该平台上被标记忽略的模块会发出警告并
    /// 以空的通过报告短路，与模块级别对忽略标志的处理一致。
    async fn run_leaf_request(
        self: &Arc<Self>,
        run: &Arc<Run>,
        collection: &Arc<AssetCollection>,
        kind: AssetKind,
        name: &str,
        options: &RunOptions,
        platform: &str,
    ) -> Result<RunReport> {
        let suite = options.suite.as_deref().unwrap_or_default();
        let module = options.module.as_deref().unwrap_or_default();
        if collection.module_ignored(suite, module, platform)? {
            println!(
                "{}",
                t!("run.module_ignored", module = module, platform = platform).yellow()
            );
            return Ok(RunReport {
                level: Self::leaf_level(kind),
                name: name.to_string(),
                suite: Some(suite.to_string()),
                module: Some(module.to_string()),
                passed: true,
                stopped: false,
                duration: Duration::ZERO,
                counts: Counts::default(),
                reasons: Vec::new(),
                artifacts: Artifacts::default(),
                finished_at: Utc::now(),
            });
        }
        let asset = self.resolve_leaf(collection, kind, name, options, platform)?;
        Ok(self.run_leaf(run, &asset, Self::leaf_level(kind)).await)
    }

    fn leaf_level(kind: AssetKind) -> ReportLevel {
        match kind {
            AssetKind::Action => ReportLevel::Action,
            _ => ReportLevel::Test,
        }
    }

    fn resolve_leaf(
        &self,
        collection: &AssetCollection,
        kind: AssetKind,
        name: &str,
        options: &RunOptions,
        platform: &str,
    ) -> Result<Arc<Asset>> {
        let mut criteria = ResolveCriteria::new(
            kind,
            name,
            options.suite.clone().unwrap_or_default(),
            options.module.clone().unwrap_or_default(),
            platform,
        );
        criteria.accept_common = options.accept_common;
        criteria.accept_global = options.accept_global;
        collection.resolve(&criteria)?.ok_or_else(|| {
            anyhow!(OrchestratorError::AssetNotFound(format!(
                "{} '{}'",
                kind.label(),
                name
            )))
        })
    }

    /// Runs one leaf asset (a test or a standalone action list): the actions
    /// execute strictly in document order, the first failure ends the leaf.
    ///
    /// 运行一个叶子资产（测试或独立动作列表）：
    /// 动作严格按文档顺序执行，第一个失败即结束该叶子。
    async fn run_leaf(
        &self,
        run: &Arc<Run>,
        asset: &Arc<Asset>,
        level: ReportLevel,
    ) -> RunReport {
        let started = Instant::now();
        let mut report = RunReport {
            level,
            name: asset.name.clone(),
            suite: Some(asset.suite.clone()),
            module: Some(asset.module.clone()),
            passed: true,
            stopped: false,
            duration: Duration::ZERO,
            counts: Counts::default(),
            reasons: Vec::new(),
            artifacts: Artifacts::default(),
            finished_at: Utc::now(),
        };

        // An undeclared environment means the leaf has no actions to run,
        // which is the same warned fail as an empty action list.
        if !asset.declares_environment(&self.config.environment) {
            let message = t!(
                "run.env_skipped",
                name = asset.name,
                environment = self.config.environment
            );
            println!("{}", message.yellow());
            report.passed = false;
            report.reasons.push(message.to_string());
            report.duration = started.elapsed();
            report.finished_at = Utc::now();
            return report;
        }

        let actions = asset.actions();
        if actions.is_empty() {
            println!("{}", t!("run.no_actions", name = asset.name).yellow());
            report.passed = false;
            report
                .reasons
                .push(t!("run.no_actions", name = asset.name).to_string());
            report.duration = started.elapsed();
            report.finished_at = Utc::now();
            return report;
        }

        let backend = match self.backend() {
            Ok(backend) => backend,
            Err(e) => {
                report.passed = false;
                report.reasons.push(e.to_string());
                report.duration = started.elapsed();
                report.finished_at = Utc::now();
                return report;
            }
        };

        if backend.needs_restart() {
            if let Err(e) = async {
                backend.stop().await?;
                backend.restart().await
            }
            .await
            {
                println!("{}", t!("run.restart_failed", error = e).yellow());
            }
            tokio::time::sleep(RESTART_SETTLE).await;
        }

        report.counts.total = actions.len();
        for (index, action) in actions.iter().enumerate() {
            if self.config.trace_interactions {
                run.record(
                    action
                        .get("action")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown"),
                    action.to_string(),
                );
            }
            match self.perform_action(&backend, action).await {
                Ok(()) => report.counts.passed += 1,
                Err(e) => {
                    report.passed = false;
                    report.counts.failed = 1;
                    report.counts.stopped = actions.len() - index - 1;
                    report
                        .reasons
                        .push(format!("{} [{} #{}]: {e}", asset.name, level.label(), index + 1));
                    self.capture_failure_artifacts(run, asset, &backend, &mut report)
                        .await;
                    break;
                }
            }
        }

        report.duration = started.elapsed();
        report.finished_at = Utc::now();
        report
    }

    /// Maps one action document onto the backend contract. An unknown
    /// `action` discriminator is a test failure, not an orchestrator error.
    async fn perform_action(
        &self,
        backend: &Arc<dyn AutomationBackend>,
        action: &Value,
    ) -> Result<()> {
        let kind = action
            .get("action")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("action document has no 'action' discriminator"))?;
        let elements = action.get("elements").cloned().unwrap_or(Value::Null);
        match kind {
            "navigate" => {
                let url = action
                    .get("value")
                    .and_then(Value::as_str)
                    .ok_or_else(|| anyhow!("navigate action has no 'value' url"))?;
                backend.navigate(url).await
            }
            "click" => backend.click(&elements, action).await,
            "setValue" => backend.set_value(&elements, action).await,
            "scrollToVisible" => backend.scroll_to_visible(&elements, action).await,
            "sourceTree" => backend.get_source_tree().await.map(|_| ()),
            "screenshot" => backend.take_screenshot(action).await.map(|_| ()),
            other => Err(anyhow!("unsupported action '{other}'")),
        }
    }

    async fn capture_failure_artifacts(
        &self,
        run: &Arc<Run>,
        asset: &Arc<Asset>,
        backend: &Arc<dyn AutomationBackend>,
        report: &mut RunReport,
    ) {
        if self.config.take_screenshot_on_failure {
            match backend.take_screenshot(&Value::Null).await {
                Ok(path) => report.artifacts.screenshot = Some(path),
                Err(e) => println!("{}", t!("run.screenshot_failed", error = e).yellow()),
            }
        }
        if self.config.trace_interactions {
            if let Some(sink) = self.sink() {
                let context = TraceContext {
                    run_id: run.id,
                    suite: Some(asset.suite.clone()),
                    module: Some(asset.module.clone()),
                    name: asset.name.clone(),
                };
                match sink.save_trace(&run.trace(), &context).await {
                    Ok(path) => report.artifacts.trace = Some(path),
                    Err(e) => println!("{}", t!("run.trace_save_failed", error = e).yellow()),
                }
            }
        }
    }

    /// Runs all tests of a module strictly sequentially. A stop request or
    /// a failure under stop-on-failure halts the queue; the remaining tests
    /// are counted as stopped, never as failed.
    ///
    /// 严格顺序地运行一个模块的所有测试。
    /// 停止请求或失败即停配置下的失败会中止队列；
    /// 其余测试计为已停止，绝不计为失败。
    async fn run_module(
        &self,
        run: &Arc<Run>,
        collection: &Arc<AssetCollection>,
        suite: &str,
        module: &str,
        platform: &str,
        range: Option<(usize, usize)>,
    ) -> Result<RunReport> {
        let started = Instant::now();
        let mut report = RunReport {
            level: ReportLevel::Module,
            name: module.to_string(),
            suite: Some(suite.to_string()),
            module: Some(module.to_string()),
            passed: true,
            stopped: false,
            duration: Duration::ZERO,
            counts: Counts::default(),
            reasons: Vec::new(),
            artifacts: Artifacts::default(),
            finished_at: Utc::now(),
        };

        if collection.module_ignored(suite, module, platform)? {
            println!(
                "{}",
                t!("run.module_ignored", module = module, platform = platform).yellow()
            );
            report.duration = started.elapsed();
            report.finished_at = Utc::now();
            return Ok(report);
        }

        let mut tests = collection.module_tests(suite, module, platform)?;
        if let Some((start, end)) = range {
            let end = end.min(tests.len());
            let start = start.min(end);
            tests = tests[start..end].to_vec();
        }
        report.counts.total = tests.len();

        for (index, test) in tests.iter().enumerate() {
            if run.stop_requested() {
                report.stopped = true;
                report.counts.stopped = tests.len() - index;
                break;
            }
            println!(
                "{}",
                t!("run.test_begin", name = test.name, platform = test.platform).cyan()
            );
            let leaf = self.run_leaf(run, test, ReportLevel::Test).await;
            self.emit(&leaf).await;
            if leaf.passed {
                report.counts.passed += 1;
                println!("{}", t!("run.test_passed", name = test.name).green());
            } else {
                report.counts.failed += 1;
                report.passed = false;
                report.reasons.extend(leaf.reasons.iter().cloned());
                if leaf.artifacts.screenshot.is_some() {
                    report.artifacts.screenshot = leaf.artifacts.screenshot.clone();
                }
                println!("{}", t!("run.test_failed", name = test.name).red());
                if self.config.stop_on_failure {
                    report.stopped = true;
                    report.counts.stopped = tests.len() - index - 1;
                    break;
                }
            }
        }

        if report.stopped {
            report.passed = false;
        }
        report.duration = started.elapsed();
        report.finished_at = Utc::now();
        Ok(report)
    }

    /// Runs every module of a suite (minus `common`) strictly sequentially.
    /// Module failure reasons are carried up into the suite report as well,
    /// so a suite record is self-describing without its children.
    ///
    /// 严格顺序地运行一个套件的每个模块（`common` 除外）。
    /// 模块失败原因也被带入套件报告，使套件记录无需子记录即可自述。
    async fn run_suite(
        &self,
        run: &Arc<Run>,
        collection: &Arc<AssetCollection>,
        suite: &str,
        platform: &str,
        filter: Option<&[String]>,
    ) -> Result<RunReport> {
        let started = Instant::now();
        let known = collection.suite_module_names(suite)?;
        let names: Vec<String> = match filter {
            Some(filter) => {
                for name in filter {
                    if !known.contains(name) {
                        return Err(anyhow!(OrchestratorError::AssetNotFound(format!(
                            "module '{name}' in suite '{suite}'"
                        ))));
                    }
                }
                filter.to_vec()
            }
            None => known,
        };

        let mut runnable = Vec::new();
        for name in names {
            if collection.module_ignored(suite, &name, platform)? {
                println!(
                    "{}",
                    t!("run.module_ignored", module = name, platform = platform).yellow()
                );
            } else {
                runnable.push(name);
            }
        }

        let mut report = RunReport {
            level: ReportLevel::Suite,
            name: suite.to_string(),
            suite: Some(suite.to_string()),
            module: None,
            passed: true,
            stopped: false,
            duration: Duration::ZERO,
            counts: Counts {
                total: runnable.len(),
                ..Counts::default()
            },
            reasons: Vec::new(),
            artifacts: Artifacts::default(),
            finished_at: Utc::now(),
        };

        for (index, name) in runnable.iter().enumerate() {
            if run.stop_requested() {
                report.stopped = true;
                report.counts.stopped = runnable.len() - index;
                break;
            }
            println!("{}", t!("run.module_begin", module = name).cyan());
            let module = self
                .run_module(run, collection, suite, name, platform, None)
                .await?;
            self.emit(&module).await;
            if module.is_failure() {
                report.passed = false;
                report.counts.failed += 1;
                report.reasons.extend(module.reasons.iter().cloned());
            } else {
                report.counts.passed += 1;
            }
            if module.stopped {
                // A halted module never continues the suite queue.
                report.stopped = true;
                report.counts.stopped = runnable.len() - index - 1;
                break;
            }
        }

        if report.stopped {
            report.passed = false;
        }
        report.duration = started.elapsed();
        report.finished_at = Utc::now();
        Ok(report)
    }

    async fn emit(&self, report: &RunReport) {
        if let Some(sink) = self.sink() {
            if let Err(e) = sink.save_results(report).await {
                println!("{}", t!("run.sink_failed", error = e).yellow());
            }
        }
    }
}
