//! Execution reports
//!
//! An [`ExecutionReport`] is appended to by the executor while it walks the
//! tree, one [`CaseOutcome`] per case in traversal order, and is read-only
//! once the run has finished.

mod render;

pub use render::{render_tree, Reporter};

use crate::error::Failure;
use crate::registry::{CaseId, HookPhase, SuiteId};
use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;

/// Outcome of a single case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseResult {
    /// Not visited yet
    Pending,
    Passed,
    Failed,
    Skipped,
}

impl fmt::Display for CaseResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseResult::Pending => write!(f, "PENDING"),
            CaseResult::Passed => write!(f, "PASSED"),
            CaseResult::Failed => write!(f, "FAILED"),
            CaseResult::Skipped => write!(f, "SKIPPED"),
        }
    }
}

/// Why a case was not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    /// The case or an ancestor suite is marked skip
    Modifier,
    /// The case has no body
    Pending,
    /// Some other node is marked only and this case is outside it
    NotSelected,
    /// The case title did not pass the grep filter
    Filtered,
    /// An earlier case failed with bail enabled
    Bail,
}

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64() * 1000.0)
}

/// One entry of the report.
#[derive(Debug, Clone, Serialize)]
pub struct CaseOutcome {
    pub id: CaseId,
    /// Names of the enclosing suites, outermost first
    pub suite_path: Vec<String>,
    /// Ids of the same suites, so equally named siblings stay distinct
    #[serde(skip)]
    pub suite_ids: Vec<SuiteId>,
    pub name: String,
    pub result: CaseResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<SkipReason>,
    #[serde(rename = "duration_ms", serialize_with = "as_millis")]
    pub duration: Duration,
}

impl CaseOutcome {
    /// Suite path and case name joined by spaces.
    pub fn full_title(&self) -> String {
        let mut parts = self.suite_path.clone();
        parts.push(self.name.clone());
        parts.join(" ")
    }
}

/// A `before all` / `after all` hook that failed outside any single case.
#[derive(Debug, Clone, Serialize)]
pub struct HookError {
    pub suite_path: Vec<String>,
    pub phase: HookPhase,
    pub failure: Failure,
}

/// Ordered results of a full run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionReport {
    outcomes: Vec<CaseOutcome>,
    hook_errors: Vec<HookError>,
    #[serde(rename = "duration_ms", serialize_with = "as_millis")]
    duration: Duration,
}

impl ExecutionReport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, outcome: CaseOutcome) {
        self.outcomes.push(outcome);
    }

    pub(crate) fn record_hook_error(&mut self, error: HookError) {
        self.hook_errors.push(error);
    }

    pub(crate) fn set_duration(&mut self, duration: Duration) {
        self.duration = duration;
    }

    /// Per-case outcomes in traversal order.
    pub fn outcomes(&self) -> &[CaseOutcome] {
        &self.outcomes
    }

    pub fn hook_errors(&self) -> &[HookError] {
        &self.hook_errors
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Result recorded for `id`, or `Pending` if the case was never visited.
    pub fn result_of(&self, id: CaseId) -> CaseResult {
        self.outcomes
            .iter()
            .find(|o| o.id == id)
            .map(|o| o.result)
            .unwrap_or(CaseResult::Pending)
    }

    /// First outcome whose case name matches exactly.
    pub fn find(&self, name: &str) -> Option<&CaseOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }

    fn count(&self, result: CaseResult) -> usize {
        self.outcomes.iter().filter(|o| o.result == result).count()
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn passed(&self) -> usize {
        self.count(CaseResult::Passed)
    }

    pub fn failed(&self) -> usize {
        self.count(CaseResult::Failed)
    }

    pub fn skipped(&self) -> usize {
        self.count(CaseResult::Skipped)
    }

    /// Failed outcomes in traversal order.
    pub fn failures(&self) -> impl Iterator<Item = &CaseOutcome> + '_ {
        self.outcomes
            .iter()
            .filter(|o| o.result == CaseResult::Failed)
    }

    /// True when no case failed and no suite-level hook errored. Skipped
    /// cases never count against a run.
    pub fn success(&self) -> bool {
        self.failed() == 0 && self.hook_errors.is_empty()
    }

    /// Process exit status for this report.
    pub fn exit_code(&self) -> i32 {
        if self.success() {
            0
        } else {
            1
        }
    }
}

impl fmt::Display for ExecutionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Reporter::Spec.render(self))
    }
}
