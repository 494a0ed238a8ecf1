//! Error types for kata
//!
//! Two families live here. [`Error`] covers everything that stops a run from
//! happening at all (a malformed registration sequence, an unreadable
//! manifest). [`Failure`] is the per-case diagnostic: it is produced by
//! assertions, hooks, deadlines and panics, and never escapes the case it
//! belongs to.

use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// A registration sequence that cannot be turned into a suite tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructureError {
    /// A case was registered while no suite was open
    #[error("case '{case}' must be registered inside a suite")]
    NoOpenSuite { case: String },

    /// `end_suite` was called more times than `begin_suite`
    #[error("end_suite called with no open suite")]
    UnbalancedEnd,

    /// The tree was requested while a suite was still open
    #[error("suite '{0}' was never closed")]
    UnclosedSuite(String),

    /// Registration attempted after the tree was handed to the executor
    #[error("cannot register '{0}': registration is sealed once execution has started")]
    Sealed(String),
}

/// Main error type for kata
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed registration sequence (fatal, nothing runs)
    #[error("StructureError: {0}")]
    Structure(#[from] StructureError),

    /// Suite manifest is well-formed JSON but describes an invalid tree
    #[error("ManifestError: {0}")]
    Manifest(String),

    /// Suite manifest is not valid JSON for the manifest schema
    #[error("ManifestError: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    /// IO error
    #[error("IOError: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

/// Result type alias for kata
pub type Result<T> = std::result::Result<T, Error>;

/// What produced a [`Failure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    /// Expected vs actual mismatch
    Assertion,
    /// A setup or teardown hook failed
    Hook,
    /// An action did not settle before its deadline
    Timeout,
    /// An action panicked
    Panic,
    /// An action returned an error that is not an assertion
    Error,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Assertion => write!(f, "AssertionError"),
            FailureKind::Hook => write!(f, "HookError"),
            FailureKind::Timeout => write!(f, "TimeoutError"),
            FailureKind::Panic => write!(f, "Panic"),
            FailureKind::Error => write!(f, "Error"),
        }
    }
}

/// Diagnostic attached to a failed case.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
    /// Rendered expected value, when the failure came from a comparison
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    /// Rendered actual value, when the failure came from a comparison
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
    /// Comparison operator (`==`, `===`, `deepEqual`, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<&'static str>,
}

/// What every case body, hook body and assertion returns.
pub type Outcome = std::result::Result<(), Failure>;

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            expected: None,
            actual: None,
            operator: None,
        }
    }

    /// Comparison failure carrying both sides of the comparison.
    pub fn assertion(
        message: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
        operator: &'static str,
    ) -> Self {
        Self {
            kind: FailureKind::Assertion,
            message: message.into(),
            expected: Some(expected.into()),
            actual: Some(actual.into()),
            operator: Some(operator),
        }
    }

    /// Wrap any displayable error raised by an action.
    pub fn from_error(error: impl fmt::Display) -> Self {
        Self::new(FailureKind::Error, error.to_string())
    }

    pub fn timeout(limit: Duration) -> Self {
        Self::new(
            FailureKind::Timeout,
            format!(
                "Timeout of {}ms exceeded; the action never settled",
                limit.as_millis()
            ),
        )
    }

    /// Build a failure from a panic payload.
    pub fn panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "action panicked with a non-string payload".to_string()
        };
        Self::new(FailureKind::Panic, message)
    }

    /// Re-attribute a failure to the hook that raised it. Comparison details
    /// are kept so the report still shows expected and actual.
    pub fn hook(title: impl fmt::Display, cause: Failure) -> Self {
        Self {
            kind: FailureKind::Hook,
            message: format!("{} hook failed: {}: {}", title, cause.kind, cause.message),
            expected: cause.expected,
            actual: cause.actual,
            operator: cause.operator,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let (Some(expected), Some(actual)) = (&self.expected, &self.actual) {
            write!(f, "\n  expected: {}\n  actual:   {}", expected, actual)?;
        }
        Ok(())
    }
}

impl std::error::Error for Failure {}
