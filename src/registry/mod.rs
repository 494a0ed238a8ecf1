//! Suite registration
//!
//! The [`Registry`] turns a sequence of declarative calls into a
//! [`SuiteTree`]. The "currently open suite" is an explicit stack owned by
//! the registry value, so two registries never interfere with each other.
//!
//! ```no_run
//! use kata::assert;
//! use kata::registry::Registry;
//!
//! # fn main() -> Result<(), kata::StructureError> {
//! let mut registry = Registry::new();
//! registry.describe("spread with arrays", |r| {
//!     r.it("extracts each array item", || {
//!         let [b, a] = [2, 1];
//!         assert::equal(a, 1)?;
//!         assert::equal(b, 2)
//!     })?;
//!     r.pending("in combination with rest")?;
//!     Ok(())
//! })?;
//! let tree = registry.finish()?;
//! assert_eq!(tree.case_count(), 2);
//! # Ok(())
//! # }
//! ```

mod action;
mod tree;

pub use action::{Action, ActionFuture};
pub use tree::{Case, CaseId, Hook, HookPhase, Modifier, Node, Suite, SuiteId, SuiteTree};

use crate::error::{Outcome, StructureError};
use std::future::Future;
use std::time::Duration;
use tracing::trace;

/// Returned by [`Registry::begin_suite`]; identifies the suite that nested
/// registrations will land in until the matching [`Registry::end_suite`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuiteHandle {
    id: SuiteId,
    depth: usize,
}

impl SuiteHandle {
    pub fn id(&self) -> SuiteId {
        self.id
    }

    /// Nesting depth; suites directly under the root are at depth 1.
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// Options for a single case.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaseOptions {
    pub modifier: Modifier,
    /// Overrides the inherited deadline for this case only
    pub timeout: Option<Duration>,
}

impl CaseOptions {
    pub fn only() -> Self {
        Self {
            modifier: Modifier::Only,
            ..Self::default()
        }
    }

    pub fn skip() -> Self {
        Self {
            modifier: Modifier::Skip,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Builds a [`SuiteTree`] from registration calls.
#[derive(Debug)]
pub struct Registry {
    suites: Vec<Suite>,
    cases: Vec<Case>,
    /// Open suites, innermost last. Never contains the root.
    stack: Vec<SuiteId>,
    sealed: bool,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            suites: vec![Suite::new(String::new(), None, Modifier::Normal)],
            cases: Vec::new(),
            stack: Vec::new(),
            sealed: false,
        }
    }

    /// Suite that registrations currently land in.
    pub fn current(&self) -> SuiteId {
        self.stack.last().copied().unwrap_or(SuiteId::ROOT)
    }

    fn ensure_open(&self, what: &str) -> Result<(), StructureError> {
        if self.sealed {
            return Err(StructureError::Sealed(what.to_string()));
        }
        Ok(())
    }

    /// Open a suite as a child of the current one.
    pub fn begin_suite(
        &mut self,
        name: impl Into<String>,
        modifier: Modifier,
    ) -> Result<SuiteHandle, StructureError> {
        let name = name.into();
        self.ensure_open(&name)?;
        let parent = self.current();
        let id = SuiteId(self.suites.len());
        trace!(suite = %name, ?modifier, depth = self.stack.len() + 1, "begin suite");
        self.suites.push(Suite::new(name, Some(parent), modifier));
        self.suites[parent.0].children.push(Node::Suite(id));
        self.stack.push(id);
        Ok(SuiteHandle {
            id,
            depth: self.stack.len(),
        })
    }

    /// Close the most recently opened suite.
    pub fn end_suite(&mut self) -> Result<SuiteId, StructureError> {
        self.ensure_open("end_suite")?;
        self.stack.pop().ok_or(StructureError::UnbalancedEnd)
    }

    /// Add a case to the current suite.
    pub fn register_case(
        &mut self,
        name: impl Into<String>,
        action: Action,
    ) -> Result<CaseId, StructureError> {
        self.register_case_with(name, CaseOptions::default(), Some(action))
    }

    /// Add a case with a modifier and/or timeout. A `None` action registers
    /// a pending case.
    pub fn register_case_with(
        &mut self,
        name: impl Into<String>,
        options: CaseOptions,
        action: Option<Action>,
    ) -> Result<CaseId, StructureError> {
        let name = name.into();
        self.ensure_open(&name)?;
        let Some(&suite) = self.stack.last() else {
            return Err(StructureError::NoOpenSuite { case: name });
        };
        let id = CaseId(self.cases.len());
        trace!(case = %name, modifier = ?options.modifier, "register case");
        self.cases.push(Case {
            name,
            suite,
            action,
            modifier: options.modifier,
            timeout: options.timeout,
        });
        self.suites[suite.0].children.push(Node::Case(id));
        Ok(id)
    }

    /// Add a hook to the current suite. Hooks registered with no suite open
    /// attach to the root and apply to every case.
    pub fn register_hook(&mut self, phase: HookPhase, action: Action) -> Result<(), StructureError> {
        self.ensure_open(&format!("{} hook", phase))?;
        let suite = self.current();
        self.suites[suite.0].hooks.push(Hook {
            phase,
            action,
            suite,
        });
        Ok(())
    }

    /// Override the deadline for the current suite and everything beneath it.
    pub fn set_timeout(&mut self, timeout: Duration) -> Result<(), StructureError> {
        self.ensure_open("timeout")?;
        let suite = self.current();
        self.suites[suite.0].timeout = Some(timeout);
        Ok(())
    }

    /// Seal the registry and hand out the finished tree.
    pub fn finish(&mut self) -> Result<SuiteTree, StructureError> {
        self.ensure_open("finish")?;
        if let Some(&open) = self.stack.last() {
            return Err(StructureError::UnclosedSuite(self.suites[open.0].name.clone()));
        }
        self.sealed = true;
        Ok(SuiteTree {
            suites: std::mem::take(&mut self.suites),
            cases: std::mem::take(&mut self.cases),
        })
    }

    // -----------------------------------------------------------------------
    // Scoped helpers: keep begin/end balanced around a registration closure
    // -----------------------------------------------------------------------

    fn scoped<F>(&mut self, name: &str, modifier: Modifier, body: F) -> Result<SuiteId, StructureError>
    where
        F: FnOnce(&mut Registry) -> Result<(), StructureError>,
    {
        let handle = self.begin_suite(name, modifier)?;
        body(self)?;
        self.end_suite()?;
        Ok(handle.id())
    }

    /// `describe(name, ...)`
    pub fn describe<F>(&mut self, name: &str, body: F) -> Result<SuiteId, StructureError>
    where
        F: FnOnce(&mut Registry) -> Result<(), StructureError>,
    {
        self.scoped(name, Modifier::Normal, body)
    }

    /// `describe.only(name, ...)`
    pub fn describe_only<F>(&mut self, name: &str, body: F) -> Result<SuiteId, StructureError>
    where
        F: FnOnce(&mut Registry) -> Result<(), StructureError>,
    {
        self.scoped(name, Modifier::Only, body)
    }

    /// `describe.skip(name, ...)`
    pub fn describe_skip<F>(&mut self, name: &str, body: F) -> Result<SuiteId, StructureError>
    where
        F: FnOnce(&mut Registry) -> Result<(), StructureError>,
    {
        self.scoped(name, Modifier::Skip, body)
    }

    /// `it(name, ...)` with a synchronous body
    pub fn it<F>(&mut self, name: &str, body: F) -> Result<CaseId, StructureError>
    where
        F: Fn() -> Outcome + 'static,
    {
        self.register_case(name, Action::new(body))
    }

    /// `it.only(name, ...)`
    pub fn it_only<F>(&mut self, name: &str, body: F) -> Result<CaseId, StructureError>
    where
        F: Fn() -> Outcome + 'static,
    {
        self.register_case_with(name, CaseOptions::only(), Some(Action::new(body)))
    }

    /// `it.skip(name, ...)`
    pub fn it_skip<F>(&mut self, name: &str, body: F) -> Result<CaseId, StructureError>
    where
        F: Fn() -> Outcome + 'static,
    {
        self.register_case_with(name, CaseOptions::skip(), Some(Action::new(body)))
    }

    /// `it(name, async () => ...)`
    pub fn it_async<F, Fut>(&mut self, name: &str, body: F) -> Result<CaseId, StructureError>
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Outcome> + 'static,
    {
        self.register_case(name, Action::future(body))
    }

    /// `it(name)` without a body
    pub fn pending(&mut self, name: &str) -> Result<CaseId, StructureError> {
        self.register_case_with(name, CaseOptions::default(), None)
    }

    pub fn before_each<F>(&mut self, body: F) -> Result<(), StructureError>
    where
        F: Fn() -> Outcome + 'static,
    {
        self.register_hook(HookPhase::BeforeEach, Action::new(body))
    }

    pub fn after_each<F>(&mut self, body: F) -> Result<(), StructureError>
    where
        F: Fn() -> Outcome + 'static,
    {
        self.register_hook(HookPhase::AfterEach, Action::new(body))
    }

    pub fn before_all<F>(&mut self, body: F) -> Result<(), StructureError>
    where
        F: Fn() -> Outcome + 'static,
    {
        self.register_hook(HookPhase::BeforeAll, Action::new(body))
    }

    pub fn after_all<F>(&mut self, body: F) -> Result<(), StructureError>
    where
        F: Fn() -> Outcome + 'static,
    {
        self.register_hook(HookPhase::AfterAll, Action::new(body))
    }
}
