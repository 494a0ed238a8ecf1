//! Prelude module for convenient imports
//!
//! ```no_run
//! use kata::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let mut registry = Registry::new();
//!     registry.describe("math", |r| r.it("adds", || assert::equal(1 + 1, 2)).map(|_| ()))?;
//!     let report = Executor::default().run(&registry.finish()?)?;
//!     println!("{}", report);
//!     Ok(())
//! }
//! ```

// Registration
pub use crate::registry::{Action, CaseOptions, HookPhase, Modifier, Registry, SuiteTree};

// Execution
pub use crate::executor::{Executor, ExecutorConfig, DEFAULT_TIMEOUT};

// Reporting
pub use crate::report::{CaseResult, ExecutionReport, Reporter};

// Assertions
pub use crate::assert::{self, AssertExt};
pub use crate::value::Value;

// Error handling
pub use crate::error::{Error, Failure, FailureKind, Outcome, Result, StructureError};
