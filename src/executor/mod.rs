//! Suite tree execution
//!
//! The [`Executor`] walks a [`SuiteTree`] exactly once, depth-first, in
//! declaration order. Each case is run between its `before each` and
//! `after each` hooks; whatever happens inside an action (a returned
//! [`Failure`], a panic, a missed deadline) is attributed to that case alone.
//!
//! Execution is single-threaded and cooperative: actions run as local tasks
//! on a current-thread tokio runtime, one at a time. A deadline can only fire
//! while an action is suspended, and when it does the action's task is
//! aborted so the run can move on.

mod plan;

use crate::error::{Failure, Outcome, Result};
use crate::registry::{Action, CaseId, HookPhase, Node, SuiteId, SuiteTree};
use crate::report::{CaseOutcome, CaseResult, ExecutionReport, HookError, SkipReason};
use plan::{Plan, Selection};
use regex::Regex;
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};
use tokio::task::LocalSet;
use tracing::{debug, debug_span, info, warn, Instrument};

/// Deadline applied to every action unless a suite or case overrides it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2000);

/// Configuration for the executor.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum time an action may stay suspended. Zero disables deadlines.
    pub timeout: Duration,
    /// Only run cases whose full title matches
    pub grep: Option<Regex>,
    /// Invert the `grep` match
    pub invert: bool,
    /// Skip every remaining case after the first failure
    pub bail: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            grep: None,
            invert: false,
            bail: false,
        }
    }
}

/// Runs suite trees and produces reports.
#[derive(Debug, Clone, Default)]
pub struct Executor {
    config: ExecutorConfig,
}

impl Executor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Run `tree` to completion on a fresh current-thread runtime.
    pub fn run(&self, tree: &SuiteTree) -> Result<ExecutionReport> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        Ok(runtime.block_on(self.execute(tree)))
    }

    /// Run `tree` from inside an existing tokio runtime.
    ///
    /// Actions are spawned on a [`LocalSet`] created here, so the caller
    /// needs no `LocalSet` of its own.
    ///
    /// # Panics
    ///
    /// Deadlines use the runtime's timer. Unless the configured timeout is
    /// zero and no case or suite overrides it, the runtime must be built with
    /// `enable_time()` (or `enable_all()`); otherwise the first deadline
    /// panics. [`Executor::run`] builds a suitable runtime itself.
    pub async fn execute(&self, tree: &SuiteTree) -> ExecutionReport {
        let local = LocalSet::new();
        local.run_until(self.drive(tree)).await
    }

    async fn drive(&self, tree: &SuiteTree) -> ExecutionReport {
        let start = Instant::now();
        info!(cases = tree.case_count(), "starting run");

        let mut run = Run {
            tree,
            plan: Plan::build(tree, &self.config),
            config: &self.config,
            report: ExecutionReport::new(),
            bailed: false,
        };
        run.suite(SuiteId::ROOT, None).await;

        let mut report = run.report;
        report.set_duration(start.elapsed());
        info!(
            passed = report.passed(),
            failed = report.failed(),
            skipped = report.skipped(),
            "run finished in {:?}",
            report.duration()
        );
        report
    }
}

/// Run `tree` with the default configuration.
pub fn run(tree: &SuiteTree) -> Result<ExecutionReport> {
    Executor::default().run(tree)
}

/// State of one traversal.
struct Run<'a> {
    tree: &'a SuiteTree,
    plan: Plan,
    config: &'a ExecutorConfig,
    report: ExecutionReport,
    bailed: bool,
}

impl<'a> Run<'a> {
    /// Visit a suite: `before all`, children in order, `after all`.
    /// `blocked` carries a failed `before all` from an ancestor.
    fn suite(
        &mut self,
        id: SuiteId,
        blocked: Option<Failure>,
    ) -> Pin<Box<dyn Future<Output = ()> + '_>> {
        let tree = self.tree;
        let suite = tree.suite(id);
        let span = debug_span!("suite", name = %suite.name);

        Box::pin(
            async move {
                let entered = blocked.is_none() && !self.bailed && self.plan.has_runnable(id);
                let timeout = self.plan.suite_timeout(id);
                let mut blocked = blocked;

                if entered {
                    for hook in suite.hooks(HookPhase::BeforeAll) {
                        if let Err(cause) = run_action(&hook.action, timeout).await {
                            warn!("before all hook failed: {}", cause);
                            blocked = Some(Failure::hook(HookPhase::BeforeAll, cause));
                            break;
                        }
                    }
                }

                for node in &suite.children {
                    match *node {
                        Node::Case(case) => self.case(case, blocked.as_ref()).await,
                        Node::Suite(child) => self.suite(child, blocked.clone()).await,
                    }
                }

                if entered {
                    for hook in suite.hooks(HookPhase::AfterAll) {
                        if let Err(cause) = run_action(&hook.action, timeout).await {
                            warn!("after all hook failed: {}", cause);
                            self.report.record_hook_error(HookError {
                                suite_path: tree.path(id),
                                phase: HookPhase::AfterAll,
                                failure: Failure::hook(HookPhase::AfterAll, cause),
                            });
                        }
                    }
                }
            }
            .instrument(span),
        )
    }

    async fn case(&mut self, id: CaseId, blocked: Option<&Failure>) {
        let tree = self.tree;
        let case = tree.case(id);
        let selection = match self.plan.selection(id) {
            Selection::Run if self.bailed => Selection::Skip(SkipReason::Bail),
            other => other,
        };

        let start = Instant::now();
        let (result, failure, skip_reason) = match selection {
            Selection::Skip(reason) => (CaseResult::Skipped, None, Some(reason)),
            Selection::Run => {
                let failure = match blocked {
                    Some(hook_failure) => Some(hook_failure.clone()),
                    None => self.exercise(id).await,
                };
                let result = if failure.is_some() {
                    CaseResult::Failed
                } else {
                    CaseResult::Passed
                };
                (result, failure, None)
            }
        };
        let duration = start.elapsed();

        debug!(case = %case.name, %result, ?skip_reason, "case finished in {:?}", duration);
        if let Some(ref failure) = failure {
            debug!(case = %case.name, "{}", failure);
        }
        if result == CaseResult::Failed && self.config.bail {
            info!(case = %case.name, "bailing after first failure");
            self.bailed = true;
        }

        self.report.record(CaseOutcome {
            id,
            suite_path: tree.path(case.suite),
            suite_ids: tree.named_ancestors(case.suite),
            name: case.name.clone(),
            result,
            failure,
            skip_reason,
            duration,
        });
    }

    /// Hooks and body of one runnable case. Returns the first failure.
    async fn exercise(&self, id: CaseId) -> Option<Failure> {
        let tree = self.tree;
        let case = tree.case(id);
        let chain = tree.ancestors(case.suite);
        let mut failure = None;

        'setup: for &suite in &chain {
            let timeout = self.plan.suite_timeout(suite);
            for hook in tree.suite(suite).hooks(HookPhase::BeforeEach) {
                if let Err(cause) = run_action(&hook.action, timeout).await {
                    warn!(case = %case.name, "before each hook failed: {}", cause);
                    failure = Some(Failure::hook(HookPhase::BeforeEach, cause));
                    break 'setup;
                }
            }
        }

        if failure.is_none() {
            if let Some(ref action) = case.action {
                if let Err(cause) = run_action(action, self.plan.case_timeout(tree, id)).await {
                    failure = Some(cause);
                }
            }
        }

        // Teardown runs on every path, innermost suite first.
        for &suite in chain.iter().rev() {
            let timeout = self.plan.suite_timeout(suite);
            for hook in tree.suite(suite).hooks(HookPhase::AfterEach) {
                if let Err(cause) = run_action(&hook.action, timeout).await {
                    let cause = Failure::hook(HookPhase::AfterEach, cause);
                    warn!(case = %case.name, "{}", cause);
                    if failure.is_none() {
                        failure = Some(cause);
                    }
                }
            }
        }

        failure
    }
}

/// Invoke one action as a local task, bounded by `limit`.
async fn run_action(action: &Action, limit: Duration) -> Outcome {
    let action = action.clone();
    let mut handle = tokio::task::spawn_local(async move { action.invoke().await });

    let joined = if limit.is_zero() {
        (&mut handle).await
    } else {
        match tokio::time::timeout(limit, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                handle.abort();
                return Err(Failure::timeout(limit));
            }
        }
    };

    match joined {
        Ok(outcome) => outcome,
        Err(e) if e.is_panic() => Err(Failure::panic(e.into_panic())),
        Err(e) => Err(Failure::from_error(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::registry::Registry;

    #[test]
    fn test_run_passing_and_failing() {
        let mut registry = Registry::new();
        registry
            .describe("math", |r| {
                r.it("adds", || crate::assert::equal(1 + 1, 2))?;
                r.it("subtracts", || crate::assert::equal(5 - 3, 3))?;
                Ok(())
            })
            .unwrap();
        let tree = registry.finish().unwrap();
        let report = run(&tree).unwrap();
        assert_eq!(report.total(), 2);
        assert_eq!(report.passed(), 1);
        assert_eq!(report.failed(), 1);
        let failure = report.find("subtracts").unwrap().failure.clone().unwrap();
        assert_eq!(failure.kind, FailureKind::Assertion);
    }

    #[test]
    fn test_config_defaults() {
        let cfg = ExecutorConfig::default();
        assert_eq!(cfg.timeout, Duration::from_secs(2));
        assert!(cfg.grep.is_none());
        assert!(!cfg.invert);
        assert!(!cfg.bail);
    }

    fn single_case_tree() -> SuiteTree {
        let mut registry = Registry::new();
        registry
            .describe("clock", |r| r.it("ticks", || Ok(())).map(|_| ()))
            .unwrap();
        registry.finish().unwrap()
    }

    #[test]
    fn test_execute_inside_caller_runtime() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let tree = single_case_tree();
        let report = runtime.block_on(Executor::default().execute(&tree));
        assert_eq!(report.passed(), 1);
    }

    #[test]
    fn test_execute_without_deadlines_needs_no_timer() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let tree = single_case_tree();
        let executor = Executor::new(ExecutorConfig {
            timeout: Duration::ZERO,
            ..ExecutorConfig::default()
        });
        let report = runtime.block_on(executor.execute(&tree));
        assert_eq!(report.passed(), 1);
    }

    #[test]
    #[should_panic(expected = "timers are disabled")]
    fn test_execute_with_deadline_requires_timer() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let tree = single_case_tree();
        runtime.block_on(Executor::default().execute(&tree));
    }

    #[test]
    fn test_run_action_reports_panic() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let local = LocalSet::new();
        let outcome = local.block_on(
            &runtime,
            run_action(&Action::new(|| panic!("kaboom")), DEFAULT_TIMEOUT),
        );
        let failure = outcome.unwrap_err();
        assert_eq!(failure.kind, FailureKind::Panic);
        assert_eq!(failure.message, "kaboom");
    }

    #[test]
    fn test_run_action_times_out() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let local = LocalSet::new();
        let action = Action::future(|| std::future::pending::<Outcome>());
        let outcome = local.block_on(&runtime, run_action(&action, Duration::from_millis(10)));
        assert_eq!(outcome.unwrap_err().kind, FailureKind::Timeout);
    }
}
