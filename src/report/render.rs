//! Human- and machine-readable renderings of reports and trees

use super::{CaseResult, ExecutionReport};
use crate::registry::{Modifier, Node, SuiteId, SuiteTree};
use std::fmt;
use std::str::FromStr;

/// Output format for a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reporter {
    /// Indented suite tree followed by numbered failures
    #[default]
    Spec,
    /// JSON for CI
    Json,
    /// TAP (Test Anything Protocol) version 13
    Tap,
}

impl FromStr for Reporter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spec" => Ok(Reporter::Spec),
            "json" => Ok(Reporter::Json),
            "tap" => Ok(Reporter::Tap),
            other => Err(format!(
                "unknown reporter '{}' (expected spec, json or tap)",
                other
            )),
        }
    }
}

impl fmt::Display for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reporter::Spec => write!(f, "spec"),
            Reporter::Json => write!(f, "json"),
            Reporter::Tap => write!(f, "tap"),
        }
    }
}

impl Reporter {
    pub fn render(&self, report: &ExecutionReport) -> String {
        match self {
            Reporter::Spec => render_spec(report),
            Reporter::Json => {
                let mut s = serde_json::to_string_pretty(&to_json(report))
                    .unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e));
                s.push('\n');
                s
            }
            Reporter::Tap => render_tap(report),
        }
    }
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

fn indent_block(text: &str, pad: &str) -> String {
    text.lines()
        .map(|line| format!("{}{}\n", pad, line))
        .collect()
}

fn render_spec(report: &ExecutionReport) -> String {
    let mut s = String::new();
    let mut previous: &[SuiteId] = &[];
    let mut failure_number = 0;

    for outcome in report.outcomes() {
        let common = previous
            .iter()
            .zip(outcome.suite_ids.iter())
            .take_while(|(a, b)| a == b)
            .count();
        for (depth, name) in outcome.suite_path.iter().enumerate().skip(common) {
            if depth == 0 {
                s.push('\n');
            }
            s.push_str(&format!("{}{}\n", indent(depth + 1), name));
        }

        let pad = indent(outcome.suite_path.len() + 1);
        match outcome.result {
            CaseResult::Passed => s.push_str(&format!(
                "{}✓ {} ({}ms)\n",
                pad,
                outcome.name,
                outcome.duration.as_millis()
            )),
            CaseResult::Failed => {
                failure_number += 1;
                s.push_str(&format!("{}✗ {}) {}\n", pad, failure_number, outcome.name));
            }
            CaseResult::Skipped => s.push_str(&format!("{}○ {}\n", pad, outcome.name)),
            CaseResult::Pending => s.push_str(&format!("{}? {}\n", pad, outcome.name)),
        }
        previous = outcome.suite_ids.as_slice();
    }

    s.push_str(&format!(
        "\n  {} passing ({}ms)\n",
        report.passed(),
        report.duration().as_millis()
    ));
    if report.failed() > 0 {
        s.push_str(&format!("  {} failing\n", report.failed()));
    }
    if report.skipped() > 0 {
        s.push_str(&format!("  {} skipped\n", report.skipped()));
    }

    for (i, outcome) in report.failures().enumerate() {
        s.push_str(&format!("\n  {}) {}:\n", i + 1, outcome.full_title()));
        if let Some(ref failure) = outcome.failure {
            s.push_str(&indent_block(&failure.to_string(), "     "));
        }
    }

    for error in report.hook_errors() {
        s.push_str(&format!(
            "\n  {} hook in \"{}\":\n",
            error.phase,
            error.suite_path.join(" ")
        ));
        s.push_str(&indent_block(&error.failure.to_string(), "     "));
    }

    s
}

/// Export as JSON: summary counters plus every outcome.
pub(crate) fn to_json(report: &ExecutionReport) -> serde_json::Value {
    serde_json::json!({
        "stats": {
            "total": report.total(),
            "passed": report.passed(),
            "failed": report.failed(),
            "skipped": report.skipped(),
            "hook_errors": report.hook_errors().len(),
            "duration_ms": report.duration().as_secs_f64() * 1000.0,
            "success": report.success(),
        },
        "outcomes": report.outcomes(),
        "hook_errors": report.hook_errors(),
    })
}

fn render_tap(report: &ExecutionReport) -> String {
    let mut s = format!(
        "TAP version 13\n1..{}\n",
        report.total() + report.hook_errors().len()
    );
    let mut n = 0;
    for outcome in report.outcomes() {
        n += 1;
        let title = outcome.full_title();
        match outcome.result {
            CaseResult::Passed => s.push_str(&format!("ok {} - {}\n", n, title)),
            CaseResult::Skipped | CaseResult::Pending => {
                s.push_str(&format!("ok {} - {} # SKIP\n", n, title))
            }
            CaseResult::Failed => {
                s.push_str(&format!("not ok {} - {}\n", n, title));
                if let Some(ref failure) = outcome.failure {
                    s.push_str("  ---\n");
                    s.push_str(&format!("  message: {:?}\n", failure.message));
                    if let (Some(expected), Some(actual)) = (&failure.expected, &failure.actual) {
                        s.push_str(&format!("  expected: {:?}\n  actual: {:?}\n", expected, actual));
                    }
                    s.push_str("  ...\n");
                }
            }
        }
    }
    for error in report.hook_errors() {
        n += 1;
        s.push_str(&format!(
            "not ok {} - {} hook in {}\n  ---\n  message: {:?}\n  ...\n",
            n,
            error.phase,
            error.suite_path.join(" "),
            error.failure.message
        ));
    }
    s.push_str(&format!(
        "# pass {}\n# fail {}\n# skip {}\n",
        report.passed(),
        report.failed(),
        report.skipped()
    ));
    s
}

/// Outline of a registered tree with modifiers, without running anything.
pub fn render_tree(tree: &SuiteTree) -> String {
    let mut s = String::new();
    render_children(tree, SuiteId::ROOT, 0, &mut s);
    s
}

fn marker(modifier: Modifier) -> &'static str {
    match modifier {
        Modifier::Normal => "",
        Modifier::Only => " [only]",
        Modifier::Skip => " [skip]",
    }
}

fn render_children(tree: &SuiteTree, id: SuiteId, depth: usize, s: &mut String) {
    for node in &tree.suite(id).children {
        match *node {
            Node::Suite(child) => {
                let suite = tree.suite(child);
                s.push_str(&format!("{}{}{}\n", indent(depth), suite.name, marker(suite.modifier)));
                render_children(tree, child, depth + 1, s);
            }
            Node::Case(case_id) => {
                let case = tree.case(case_id);
                let pending = if case.action.is_none() { " (pending)" } else { "" };
                s.push_str(&format!(
                    "{}- {}{}{}\n",
                    indent(depth),
                    case.name,
                    marker(case.modifier),
                    pending
                ));
            }
        }
    }
}
