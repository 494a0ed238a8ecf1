//! JSON suite manifests
//!
//! A manifest is a declarative description of a suite tree that drives the
//! [`Registry`] the same way hand-written registration code would. Case and
//! hook bodies are lists of steps: value assertions, nested `throws` blocks,
//! explicit failures and `sleep_ms` suspension points.
//!
//! ```json
//! {
//!   "timeout_ms": 500,
//!   "suites": [
//!     { "describe": "destructuring", "body": [
//!       { "beforeEach": [ { "sleep_ms": 1 } ] },
//!       { "it": "swaps", "steps": [ { "assert": "equal", "actual": 1, "expected": 1 } ] },
//!       { "it": "todo" }
//!     ] }
//!   ]
//! }
//! ```

use crate::assert::{self, expect_not_raised, expect_raised, AssertExt};
use crate::error::{Error, Outcome, Result};
use crate::registry::{Action, CaseOptions, HookPhase, Modifier, Registry, SuiteTree};
use crate::value::Value;
use serde::{Deserialize, Deserializer};
use std::fs;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::rc::Rc;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Root of a manifest document.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Run-wide default deadline; CLI flags take precedence
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub suites: Vec<SuiteSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuiteSpec {
    pub describe: String,
    #[serde(default)]
    pub only: bool,
    #[serde(default)]
    pub skip: bool,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub body: Vec<Entry>,
}

/// One child of a suite body.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Entry {
    Suite(SuiteSpec),
    Case(CaseSpec),
    Hook(HookSpec),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaseSpec {
    pub it: String,
    #[serde(default)]
    pub only: bool,
    #[serde(default)]
    pub skip: bool,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Absent for a pending case
    #[serde(default)]
    pub steps: Option<Vec<Step>>,
}

#[derive(Debug, Clone, Deserialize)]
pub enum HookSpec {
    #[serde(rename = "beforeEach")]
    BeforeEach(Vec<Step>),
    #[serde(rename = "afterEach")]
    AfterEach(Vec<Step>),
    #[serde(rename = "before")]
    BeforeAll(Vec<Step>),
    #[serde(rename = "after")]
    AfterAll(Vec<Step>),
}

impl HookSpec {
    fn parts(&self) -> (HookPhase, &[Step]) {
        match self {
            HookSpec::BeforeEach(steps) => (HookPhase::BeforeEach, steps),
            HookSpec::AfterEach(steps) => (HookPhase::AfterEach, steps),
            HookSpec::BeforeAll(steps) => (HookPhase::BeforeAll, steps),
            HookSpec::AfterAll(steps) => (HookPhase::AfterAll, steps),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Step {
    Assert(AssertStep),
    Fail { fail: String },
    Sleep { sleep_ms: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssertOp {
    Equal,
    NotEqual,
    StrictEqual,
    NotStrictEqual,
    DeepEqual,
    NotDeepEqual,
    Ok,
    Throws,
    DoesNotThrow,
}

impl AssertOp {
    fn takes_block(self) -> bool {
        matches!(self, AssertOp::Throws | AssertOp::DoesNotThrow)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssertStep {
    pub assert: AssertOp,
    /// `None` when the key is absent (undefined), `Some(Null)` for `null`
    #[serde(default, deserialize_with = "present")]
    pub actual: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "present")]
    pub expected: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
    /// Block run by `throws` / `doesNotThrow`
    #[serde(default)]
    pub steps: Vec<Step>,
}

fn present<'de, D>(deserializer: D) -> std::result::Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

fn operand(value: &Option<serde_json::Value>) -> Value {
    value.clone().map(Value::from).unwrap_or(Value::Undefined)
}

impl AssertStep {
    async fn check(&self) -> Outcome {
        let outcome = match self.assert {
            AssertOp::Throws => expect_raised(run_steps(&self.steps).await.err().map(|f| f.message)),
            AssertOp::DoesNotThrow => {
                expect_not_raised(run_steps(&self.steps).await.err().map(|f| f.message))
            }
            op => {
                let actual = operand(&self.actual);
                let expected = operand(&self.expected);
                match op {
                    AssertOp::Equal => assert::equal(actual, expected),
                    AssertOp::NotEqual => assert::not_equal(actual, expected),
                    AssertOp::StrictEqual => assert::strict_equal(actual, expected),
                    AssertOp::NotStrictEqual => assert::not_strict_equal(actual, expected),
                    AssertOp::DeepEqual => assert::deep_equal(actual, expected),
                    AssertOp::NotDeepEqual => assert::not_deep_equal(actual, expected),
                    _ => assert::ok(actual),
                }
            }
        };
        match self.message {
            Some(ref message) => outcome.message(message),
            None => outcome,
        }
    }

    fn validate(&self, owner: &str) -> Result<()> {
        if self.assert.takes_block() {
            if self.actual.is_some() || self.expected.is_some() {
                return Err(Error::Manifest(format!(
                    "in '{}': {:?} takes a block of steps, not operands",
                    owner, self.assert
                )));
            }
            return validate_steps(&self.steps, owner);
        }
        if !self.steps.is_empty() {
            return Err(Error::Manifest(format!(
                "in '{}': only throws and doesNotThrow take steps",
                owner
            )));
        }
        if self.assert == AssertOp::Ok && self.expected.is_some() {
            return Err(Error::Manifest(format!(
                "in '{}': ok takes no expected value",
                owner
            )));
        }
        Ok(())
    }
}

fn validate_steps(steps: &[Step], owner: &str) -> Result<()> {
    for step in steps {
        if let Step::Assert(assertion) = step {
            assertion.validate(owner)?;
        }
    }
    Ok(())
}

/// Execute a step list, stopping at the first failure.
fn run_steps(steps: &[Step]) -> Pin<Box<dyn Future<Output = Outcome> + '_>> {
    Box::pin(async move {
        for step in steps {
            match step {
                Step::Assert(assertion) => assertion.check().await?,
                Step::Fail { fail } => return assert::fail(fail.as_str()),
                Step::Sleep { sleep_ms } => {
                    tokio::time::sleep(Duration::from_millis(*sleep_ms)).await
                }
            }
        }
        Ok(())
    })
}

fn action(steps: &[Step]) -> Action {
    let steps = Rc::new(steps.to_vec());
    Action::future(move || {
        let steps = Rc::clone(&steps);
        async move { run_steps(&steps).await }
    })
}

fn modifier(name: &str, only: bool, skip: bool) -> Result<Modifier> {
    match (only, skip) {
        (true, true) => Err(Error::Manifest(format!(
            "'{}' cannot be both only and skip",
            name
        ))),
        (true, false) => Ok(Modifier::Only),
        (false, true) => Ok(Modifier::Skip),
        (false, false) => Ok(Modifier::Normal),
    }
}

impl SuiteSpec {
    fn register(&self, registry: &mut Registry) -> Result<()> {
        let modifier = modifier(&self.describe, self.only, self.skip)?;
        registry.begin_suite(self.describe.as_str(), modifier)?;
        if let Some(ms) = self.timeout_ms {
            registry.set_timeout(Duration::from_millis(ms))?;
        }
        for entry in &self.body {
            match entry {
                Entry::Suite(suite) => suite.register(registry)?,
                Entry::Case(case) => case.register(registry)?,
                Entry::Hook(hook) => {
                    let (phase, steps) = hook.parts();
                    validate_steps(steps, &self.describe)?;
                    registry.register_hook(phase, action(steps))?;
                }
            }
        }
        registry.end_suite()?;
        Ok(())
    }
}

impl CaseSpec {
    fn register(&self, registry: &mut Registry) -> Result<()> {
        let mut options = CaseOptions {
            modifier: modifier(&self.it, self.only, self.skip)?,
            timeout: None,
        };
        if let Some(ms) = self.timeout_ms {
            options = options.with_timeout(Duration::from_millis(ms));
        }
        let body = match self.steps {
            Some(ref steps) => {
                validate_steps(steps, &self.it)?;
                Some(action(steps))
            }
            None => None,
        };
        registry.register_case_with(self.it.as_str(), options, body)?;
        Ok(())
    }
}

impl FromStr for Manifest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

impl Manifest {
    /// Read and parse a manifest file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading manifest");
        fs::read_to_string(path)?.parse()
    }

    /// Run-wide deadline, if the manifest sets one.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Replay the manifest as registration calls on `registry`.
    pub fn register(&self, registry: &mut Registry) -> Result<()> {
        for suite in &self.suites {
            suite.register(registry)?;
        }
        Ok(())
    }

    /// Register into a fresh registry and seal it.
    pub fn build_tree(&self) -> Result<SuiteTree> {
        let mut registry = Registry::new();
        self.register(&mut registry)?;
        let tree = registry.finish()?;
        debug!(
            suites = tree.suites().count() - 1,
            cases = tree.case_count(),
            "manifest registered"
        );
        Ok(tree)
    }
}
