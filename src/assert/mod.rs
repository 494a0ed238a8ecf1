//! Chai-style assertion library
//!
//! Every assertion is a plain function returning [`Outcome`]: `Ok(())` when
//! the comparison holds, otherwise a [`Failure`] whose diagnostic carries
//! both the expected and the actual value. Case bodies chain them with `?`:
//!
//! ```no_run
//! use kata::assert::{self, AssertExt};
//! use kata::Outcome;
//!
//! fn spread_case() -> Outcome {
//!     let [a, b]: [i32; 2] = [1, 2];
//!     assert::equal(a, 1)?;
//!     assert::deep_equal(vec![a, b], vec![1, 2])?;
//!     assert::strict_equal(b, 2).message("second element")
//! }
//! ```

use crate::error::{Failure, Outcome};
use crate::value::Value;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Attach a custom message to an assertion outcome.
pub trait AssertExt {
    /// Prefix the diagnostic with `message`, keeping expected and actual.
    fn message(self, message: impl fmt::Display) -> Self;
}

impl AssertExt for Outcome {
    fn message(self, message: impl fmt::Display) -> Self {
        self.map_err(|mut failure| {
            failure.message = format!("{}: {}", message, failure.message);
            failure
        })
    }
}

/// Something an action under `throws` can return.
///
/// `()` never signals; `Result` signals through its `Err` side. Panics are
/// handled separately and always count as a signal.
pub trait Throwable {
    /// The error message if the value represents a raised error
    fn into_signal(self) -> Option<String>;
}

impl Throwable for () {
    fn into_signal(self) -> Option<String> {
        None
    }
}

impl<T, E: fmt::Display> Throwable for Result<T, E> {
    fn into_signal(self) -> Option<String> {
        self.err().map(|e| e.to_string())
    }
}

fn compare(
    actual: Value,
    expected: Value,
    holds: bool,
    verb: &str,
    operator: &'static str,
) -> Outcome {
    if holds {
        return Ok(());
    }
    Err(Failure::assertion(
        format!("expected {} {} {}", actual, verb, expected),
        expected.to_string(),
        actual.to_string(),
        operator,
    ))
}

/// Loose primitive equality (`==`): `equal(0, "0")` passes.
pub fn equal(actual: impl Into<Value>, expected: impl Into<Value>) -> Outcome {
    let (actual, expected) = (actual.into(), expected.into());
    let holds = actual.equals(&expected);
    compare(actual, expected, holds, "to equal", "==")
}

/// Negation of [`equal`].
pub fn not_equal(actual: impl Into<Value>, expected: impl Into<Value>) -> Outcome {
    let (actual, expected) = (actual.into(), expected.into());
    let holds = !actual.equals(&expected);
    compare(actual, expected, holds, "to not equal", "!=")
}

/// Equality without coercion (`===`): `strict_equal(0, "0")` fails.
pub fn strict_equal(actual: impl Into<Value>, expected: impl Into<Value>) -> Outcome {
    let (actual, expected) = (actual.into(), expected.into());
    let holds = actual.strict_equals(&expected);
    compare(actual, expected, holds, "to strictly equal", "===")
}

/// Negation of [`strict_equal`].
pub fn not_strict_equal(actual: impl Into<Value>, expected: impl Into<Value>) -> Outcome {
    let (actual, expected) = (actual.into(), expected.into());
    let holds = !actual.strict_equals(&expected);
    compare(actual, expected, holds, "to not strictly equal", "!==")
}

/// Structural equality; see [`Value::deep_equals`].
pub fn deep_equal(actual: impl Into<Value>, expected: impl Into<Value>) -> Outcome {
    let (actual, expected) = (actual.into(), expected.into());
    let holds = actual.deep_equals(&expected);
    compare(actual, expected, holds, "to deeply equal", "deepStrictEqual")
}

/// Negation of [`deep_equal`].
pub fn not_deep_equal(actual: impl Into<Value>, expected: impl Into<Value>) -> Outcome {
    let (actual, expected) = (actual.into(), expected.into());
    let holds = !actual.deep_equals(&expected);
    compare(actual, expected, holds, "to not deeply equal", "notDeepStrictEqual")
}

/// Passes when the value is truthy.
pub fn ok(value: impl Into<Value>) -> Outcome {
    let actual = value.into();
    if actual.to_boolean() {
        return Ok(());
    }
    Err(Failure::assertion(
        format!("expected {} to be truthy", actual),
        "truthy",
        actual.to_string(),
        "ok",
    ))
}

/// Unconditional failure. The message doubles as the actual side, against
/// an expected side of `no failure`.
pub fn fail(message: impl Into<String>) -> Outcome {
    let message = message.into();
    Err(Failure::assertion(message.clone(), "no failure", message, "fail"))
}

/// Run `action`, turning a panic into a signal.
fn raised<F, R>(action: F) -> Option<String>
where
    F: FnOnce() -> R,
    R: Throwable,
{
    match catch_unwind(AssertUnwindSafe(action)) {
        Ok(value) => value.into_signal(),
        Err(payload) => Some(Failure::panic(payload).message),
    }
}

pub(crate) fn expect_raised(signal: Option<String>) -> Outcome {
    match signal {
        Some(_) => Ok(()),
        None => Err(Failure::assertion(
            "expected [Function] to throw an error",
            "an error to be thrown",
            "returned normally",
            "throws",
        )),
    }
}

pub(crate) fn expect_not_raised(signal: Option<String>) -> Outcome {
    match signal {
        None => Ok(()),
        Some(message) => Err(Failure::assertion(
            format!("expected [Function] to not throw an error but '{}' was thrown", message),
            "no error",
            message,
            "doesNotThrow",
        )),
    }
}

/// Passes when `action` returns an error or panics.
pub fn throws<F, R>(action: F) -> Outcome
where
    F: FnOnce() -> R,
    R: Throwable,
{
    expect_raised(raised(action))
}

/// Fails when `action` returns an error or panics.
pub fn does_not_throw<F, R>(action: F) -> Outcome
where
    F: FnOnce() -> R,
    R: Throwable,
{
    expect_not_raised(raised(action))
}
