//! Static selection: which cases run, and with which deadlines
//!
//! Everything here is decided before the first action runs. Only `bail`
//! depends on outcomes and is handled by the executor itself.

use super::ExecutorConfig;
use crate::registry::{CaseId, Modifier, SuiteId, SuiteTree};
use crate::report::SkipReason;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Selection {
    Run,
    Skip(SkipReason),
}

#[derive(Debug)]
pub(crate) struct Plan {
    selections: Vec<Selection>,
    /// Runnable cases in each suite's subtree
    runnable: Vec<usize>,
    /// Effective deadline of each suite
    timeouts: Vec<Duration>,
}

impl Plan {
    /// Resolve every case's selection up front.
    ///
    /// Only markers narrow scope by scope: when a suite's subtree contains
    /// an Only marker, just the marked children run there. A `describe.only`
    /// suite runs everything beneath it unless it holds Only markers of its
    /// own, in which case those narrow it further. Markers under a skipped
    /// suite are inert.
    pub(crate) fn build(tree: &SuiteTree, config: &ExecutorConfig) -> Self {
        let count = tree.suites.len();
        let mut skipped = vec![false; count];
        let mut timeouts = vec![config.timeout; count];

        // Parents are stored before children, so one forward pass resolves
        // everything a suite inherits.
        for (id, suite) in tree.suites() {
            let i = id.index();
            let (parent_skipped, parent_timeout) = match suite.parent {
                Some(p) => (skipped[p.index()], timeouts[p.index()]),
                None => (false, config.timeout),
            };
            skipped[i] = parent_skipped || suite.modifier == Modifier::Skip;
            timeouts[i] = suite.timeout.unwrap_or(parent_timeout);
        }

        // Active Only markers strictly beneath each suite
        let mut only_below = vec![0usize; count];
        for (id, suite) in tree.suites() {
            if suite.modifier == Modifier::Only && !skipped[id.index()] {
                if let Some(parent) = suite.parent {
                    for ancestor in tree.ancestors(parent) {
                        only_below[ancestor.index()] += 1;
                    }
                }
            }
        }
        for (_, case) in tree.cases() {
            if case.modifier == Modifier::Only && !skipped[case.suite.index()] {
                for ancestor in tree.ancestors(case.suite) {
                    only_below[ancestor.index()] += 1;
                }
            }
        }

        // A narrowed suite runs only its Only-marked children.
        let mut narrowed = vec![false; count];
        for (id, suite) in tree.suites() {
            let i = id.index();
            narrowed[i] = match suite.parent {
                None => only_below[i] > 0,
                Some(p) if narrowed[p.index()] => {
                    suite.modifier != Modifier::Only || only_below[i] > 0
                }
                Some(_) => false,
            };
        }

        let mut selections = Vec::with_capacity(tree.case_count());
        let mut runnable = vec![0usize; count];
        for (id, case) in tree.cases() {
            let suite = case.suite.index();
            let selection = if case.modifier == Modifier::Skip || skipped[suite] {
                Selection::Skip(SkipReason::Modifier)
            } else if case.action.is_none() {
                Selection::Skip(SkipReason::Pending)
            } else if narrowed[suite] && case.modifier != Modifier::Only {
                Selection::Skip(SkipReason::NotSelected)
            } else if !passes_grep(tree, id, config) {
                Selection::Skip(SkipReason::Filtered)
            } else {
                Selection::Run
            };
            if selection == Selection::Run {
                for ancestor in tree.ancestors(case.suite) {
                    runnable[ancestor.index()] += 1;
                }
            }
            selections.push(selection);
        }

        Self {
            selections,
            runnable,
            timeouts,
        }
    }

    pub(crate) fn selection(&self, id: CaseId) -> Selection {
        self.selections[id.index()]
    }

    pub(crate) fn has_runnable(&self, id: SuiteId) -> bool {
        self.runnable[id.index()] > 0
    }

    pub(crate) fn suite_timeout(&self, id: SuiteId) -> Duration {
        self.timeouts[id.index()]
    }

    pub(crate) fn case_timeout(&self, tree: &SuiteTree, id: CaseId) -> Duration {
        let case = tree.case(id);
        case.timeout.unwrap_or_else(|| self.suite_timeout(case.suite))
    }
}

fn passes_grep(tree: &SuiteTree, id: CaseId, config: &ExecutorConfig) -> bool {
    match config.grep {
        Some(ref pattern) => pattern.is_match(&tree.full_title(id)) != config.invert,
        None => true,
    }
}
