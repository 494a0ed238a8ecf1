//! The immutable suite tree produced by registration

use super::action::Action;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Index of a suite inside its [`SuiteTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SuiteId(pub(crate) usize);

impl SuiteId {
    /// The implicit root suite every registration hangs from
    pub const ROOT: SuiteId = SuiteId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// Index of a case inside its [`SuiteTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CaseId(pub(crate) usize);

impl CaseId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Per-node execution override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    #[default]
    Normal,
    /// Restrict the run to this node (and other `Only` nodes)
    Only,
    /// Never run this node or anything beneath it
    Skip,
}

/// When a hook runs relative to the cases of its suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HookPhase {
    /// Once, before the first runnable case of the suite's subtree
    BeforeAll,
    /// Before every case in the suite's subtree
    BeforeEach,
    /// After every case in the suite's subtree, whatever its outcome
    AfterEach,
    /// Once, after the suite's subtree has finished
    AfterAll,
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookPhase::BeforeAll => write!(f, "\"before all\""),
            HookPhase::BeforeEach => write!(f, "\"before each\""),
            HookPhase::AfterEach => write!(f, "\"after each\""),
            HookPhase::AfterAll => write!(f, "\"after all\""),
        }
    }
}

/// A setup or teardown action scoped to a suite.
#[derive(Debug, Clone)]
pub struct Hook {
    pub phase: HookPhase,
    pub action: Action,
    pub suite: SuiteId,
}

/// Child slot of a suite, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Suite(SuiteId),
    Case(CaseId),
}

/// A named grouping node.
#[derive(Debug, Clone)]
pub struct Suite {
    pub name: String,
    /// Owning suite; `None` only for the root
    pub parent: Option<SuiteId>,
    /// Cases and nested suites, interleaved as declared
    pub children: Vec<Node>,
    /// Hooks of every phase, in registration order
    pub hooks: Vec<Hook>,
    pub modifier: Modifier,
    /// Deadline override inherited by everything beneath this suite
    pub timeout: Option<Duration>,
}

impl Suite {
    pub(crate) fn new(name: String, parent: Option<SuiteId>, modifier: Modifier) -> Self {
        Self {
            name,
            parent,
            children: Vec::new(),
            hooks: Vec::new(),
            modifier,
            timeout: None,
        }
    }

    /// Hooks of one phase, in registration order.
    pub fn hooks(&self, phase: HookPhase) -> impl Iterator<Item = &Hook> + '_ {
        self.hooks.iter().filter(move |h| h.phase == phase)
    }
}

/// A single leaf test.
#[derive(Debug, Clone)]
pub struct Case {
    pub name: String,
    /// Owning suite (back-reference)
    pub suite: SuiteId,
    /// `None` marks a pending case, which is always reported skipped
    pub action: Option<Action>,
    pub modifier: Modifier,
    pub timeout: Option<Duration>,
}

/// Suites and cases stored in registration order; parents always precede
/// their children.
#[derive(Debug, Clone)]
pub struct SuiteTree {
    pub(crate) suites: Vec<Suite>,
    pub(crate) cases: Vec<Case>,
}

impl SuiteTree {
    pub fn root(&self) -> &Suite {
        &self.suites[SuiteId::ROOT.0]
    }

    pub fn suite(&self, id: SuiteId) -> &Suite {
        &self.suites[id.0]
    }

    pub fn case(&self, id: CaseId) -> &Case {
        &self.cases[id.0]
    }

    /// All suites with their ids, root first.
    pub fn suites(&self) -> impl Iterator<Item = (SuiteId, &Suite)> + '_ {
        self.suites.iter().enumerate().map(|(i, s)| (SuiteId(i), s))
    }

    /// All cases with their ids, in declaration order.
    pub fn cases(&self) -> impl Iterator<Item = (CaseId, &Case)> + '_ {
        self.cases.iter().enumerate().map(|(i, c)| (CaseId(i), c))
    }

    pub fn case_count(&self) -> usize {
        self.cases.len()
    }

    /// Chain from the root down to `id`, both included.
    pub fn ancestors(&self, id: SuiteId) -> Vec<SuiteId> {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(parent) = self.suite(current).parent {
            chain.push(parent);
            current = parent;
        }
        chain.reverse();
        chain
    }

    /// Ids from the outermost named suite down to `id`, root excluded.
    pub fn named_ancestors(&self, id: SuiteId) -> Vec<SuiteId> {
        self.ancestors(id)
            .into_iter()
            .filter(|s| *s != SuiteId::ROOT)
            .collect()
    }

    /// Suite names from the outermost named suite down to `id`.
    pub fn path(&self, id: SuiteId) -> Vec<String> {
        self.named_ancestors(id)
            .into_iter()
            .map(|s| self.suite(s).name.clone())
            .collect()
    }

    /// Suite path and case name joined by spaces, as matched by `--grep`.
    pub fn full_title(&self, id: CaseId) -> String {
        let case = self.case(id);
        let mut parts = self.path(case.suite);
        parts.push(case.name.clone());
        parts.join(" ")
    }
}
