//! Kata: a hierarchical test registration and execution engine
//!
//! Tests are organised as a tree of named suites containing cases, with
//! setup and teardown hooks scoped to each suite. Building the tree and
//! running it are separate phases: a [`Registry`] collects registration
//! calls and seals them into an immutable [`SuiteTree`]; an [`Executor`]
//! walks that tree exactly once and produces an [`ExecutionReport`].
//!
//! # Quick Start
//!
//! ```no_run
//! use kata::assert;
//! use kata::{Executor, ExecutorConfig, Registry};
//!
//! fn main() -> kata::Result<()> {
//!     let mut registry = Registry::new();
//!     registry.describe("spread operator", |r| {
//!         r.it("spreads arrays", || assert::deep_equal(vec![1, 2], vec![1, 2]))?;
//!         r.it_skip("not ready", || assert::fail("unreachable"))?;
//!         Ok(())
//!     })?;
//!     let tree = registry.finish()?;
//!
//!     let report = Executor::new(ExecutorConfig::default()).run(&tree)?;
//!     print!("{}", report);
//!     std::process::exit(report.exit_code());
//! }
//! ```
//!
//! # Module Overview
//!
//! | Module | Role |
//! |--------|------|
//! | [`registry`] | Suite/case/hook registration and the sealed [`SuiteTree`] |
//! | [`executor`] | Depth-first traversal, hook ordering, deadlines, failure isolation |
//! | [`assert`] | Comparison helpers returning [`Outcome`] |
//! | [`report`] | Per-case results and the spec/json/tap renderers |
//! | [`manifest`] | JSON documents replayed as registration calls |
//! | [`value`] | Dynamic values compared by the assertion library |

pub mod assert;
pub mod executor;
pub mod manifest;
pub mod prelude;
pub mod registry;
pub mod report;
pub mod value;

mod error;

pub use error::{Error, Failure, FailureKind, Outcome, Result, StructureError};
pub use executor::{Executor, ExecutorConfig, DEFAULT_TIMEOUT};
pub use registry::{Registry, SuiteTree};
pub use report::{CaseResult, ExecutionReport, Reporter};
pub use value::Value;

/// Kata version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
