//! Shared test helpers for integration tests

use kata::{ExecutionReport, Executor, ExecutorConfig, Outcome, Registry, SuiteTree};
use std::cell::RefCell;
use std::rc::Rc;

/// Records the order in which actions ran.
#[derive(Clone, Default)]
pub struct Recorder(Rc<RefCell<Vec<String>>>);

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Action body that appends `label` and passes.
    pub fn log(&self, label: &str) -> impl Fn() -> Outcome + 'static {
        let events = self.0.clone();
        let label = label.to_string();
        move || {
            events.borrow_mut().push(label.clone());
            Ok(())
        }
    }

    /// Action body that appends `label` and then fails.
    #[allow(dead_code)]
    pub fn log_failing(&self, label: &str) -> impl Fn() -> Outcome + 'static {
        let events = self.0.clone();
        let label = label.to_string();
        move || {
            events.borrow_mut().push(label.clone());
            kata::assert::fail(format!("{} failed", label))
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.0.borrow().clone()
    }
}

/// Seal `registry` and run it with the default configuration.
pub fn run(mut registry: Registry) -> ExecutionReport {
    let tree = registry.finish().expect("registry should seal");
    run_tree(&tree, ExecutorConfig::default())
}

/// Run an already sealed tree.
pub fn run_tree(tree: &SuiteTree, config: ExecutorConfig) -> ExecutionReport {
    Executor::new(config).run(tree).expect("runtime should start")
}
