//! Integration tests for suite execution

mod common;
use common::{run, run_tree, Recorder};
use kata::registry::{Action, CaseOptions, HookPhase, Modifier};
use kata::report::SkipReason;
use kata::{assert, CaseResult, ExecutorConfig, FailureKind, Registry};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

mod hook_order {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_before_each_runs_ancestor_first() {
        let rec = Recorder::new();
        let mut registry = Registry::new();
        registry.before_each(rec.log("root before")).unwrap();
        registry
            .describe("outer", |r| {
                r.before_each(rec.log("outer before"))?;
                r.after_each(rec.log("outer after"))?;
                r.describe("inner", |r| {
                    r.before_each(rec.log("inner before"))?;
                    r.after_each(rec.log("inner after"))?;
                    r.it("case", rec.log("case")).map(|_| ())
                })
                .map(|_| ())
            })
            .unwrap();
        registry.after_each(rec.log("root after")).unwrap();

        let report = run(registry);
        assert!(report.success());
        assert_eq!(
            rec.events(),
            vec![
                "root before",
                "outer before",
                "inner before",
                "case",
                "inner after",
                "outer after",
                "root after",
            ]
        );
    }

    #[test]
    fn test_hooks_only_apply_to_their_subtree() {
        let rec = Recorder::new();
        let mut registry = Registry::new();
        registry
            .describe("a", |r| {
                r.before_each(rec.log("a before"))?;
                r.it("a1", rec.log("a1")).map(|_| ())
            })
            .unwrap();
        registry
            .describe("b", |r| r.it("b1", rec.log("b1")).map(|_| ()))
            .unwrap();

        run(registry);
        assert_eq!(rec.events(), vec!["a before", "a1", "b1"]);
    }

    #[test]
    fn test_after_each_runs_when_case_fails() {
        let rec = Recorder::new();
        let mut registry = Registry::new();
        registry
            .describe("teardown", |r| {
                r.after_each(rec.log("cleanup"))?;
                r.it("fails", rec.log_failing("fails"))?;
                r.it("panics", || panic!("unexpected"))?;
                Ok(())
            })
            .unwrap();

        let report = run(registry);
        assert_eq!(report.failed(), 2);
        assert_eq!(rec.events(), vec!["fails", "cleanup", "cleanup"]);
    }

    #[test]
    fn test_before_each_failure_skips_action_but_not_teardown() {
        let rec = Recorder::new();
        let mut registry = Registry::new();
        registry
            .describe("broken setup", |r| {
                r.before_each(rec.log_failing("setup"))?;
                r.after_each(rec.log("cleanup"))?;
                r.it("never runs", rec.log("body")).map(|_| ())
            })
            .unwrap();

        let report = run(registry);
        let outcome = report.find("never runs").unwrap();
        assert_eq!(outcome.result, CaseResult::Failed);
        let failure = outcome.failure.as_ref().unwrap();
        assert_eq!(failure.kind, FailureKind::Hook);
        assert!(failure.message.contains("\"before each\" hook failed"));
        assert_eq!(rec.events(), vec!["setup", "cleanup"]);
    }

    #[test]
    fn test_after_each_failure_fails_passing_case() {
        let mut registry = Registry::new();
        registry
            .describe("teardown", |r| {
                r.after_each(|| assert::fail("could not clean up"))?;
                r.it("passes", || Ok(()))?;
                r.it("fails first", || assert::equal(1, 2))?;
                Ok(())
            })
            .unwrap();

        let report = run(registry);
        let passes = report.find("passes").unwrap();
        assert_eq!(passes.result, CaseResult::Failed);
        assert_eq!(passes.failure.as_ref().unwrap().kind, FailureKind::Hook);

        let first = report.find("fails first").unwrap();
        assert_eq!(first.failure.as_ref().unwrap().kind, FailureKind::Assertion);
    }

    #[test]
    fn test_hooks_share_state_with_cases() {
        let mut registry = Registry::new();
        let counter = Rc::new(Cell::new(0));
        registry
            .describe("counter", |r| {
                let c = counter.clone();
                r.before_each(move || {
                    c.set(10);
                    Ok(())
                })?;
                let c = counter.clone();
                r.it("sees setup", move || {
                    let seen = c.get();
                    c.set(seen + 1);
                    assert::equal(seen, 10)
                })?;
                let c = counter.clone();
                r.it("sees fresh setup", move || assert::equal(c.get(), 10))?;
                Ok(())
            })
            .unwrap();

        assert!(run(registry).success());
    }
}

mod isolation {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_failure_does_not_stop_siblings() {
        let rec = Recorder::new();
        let mut registry = Registry::new();
        registry
            .describe("suite", |r| {
                r.it("first", rec.log_failing("first"))?;
                r.it("second", rec.log("second"))?;
                r.describe("nested", |r| r.it("third", rec.log("third")).map(|_| ()))?;
                Ok(())
            })
            .unwrap();

        let report = run(registry);
        assert_eq!(rec.events(), vec!["first", "second", "third"]);
        assert_eq!(report.passed(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn test_panic_is_attributed_to_its_case() {
        let mut registry = Registry::new();
        registry
            .describe("panics", |r| {
                r.it("index out of bounds", || {
                    let items: Vec<i32> = Vec::new();
                    assert::equal(items[1], 0)
                })?;
                r.it("still runs", || Ok(()))?;
                Ok(())
            })
            .unwrap();

        let report = run(registry);
        let failure = report
            .find("index out of bounds")
            .unwrap()
            .failure
            .clone()
            .unwrap();
        assert_eq!(failure.kind, FailureKind::Panic);
        assert_eq!(report.find("still runs").unwrap().result, CaseResult::Passed);
    }

    #[test]
    fn test_declaration_order_across_cases_and_suites() {
        let rec = Recorder::new();
        let mut registry = Registry::new();
        registry
            .describe("root", |r| {
                r.it("1", rec.log("1"))?;
                r.describe("child", |r| r.it("2", rec.log("2")).map(|_| ()))?;
                r.it("3", rec.log("3"))?;
                Ok(())
            })
            .unwrap();

        let report = run(registry);
        assert_eq!(rec.events(), vec!["1", "2", "3"]);
        let names: Vec<&str> = report.outcomes().iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_empty_tree_succeeds() {
        let report = run(Registry::new());
        assert_eq!(report.total(), 0);
        assert!(report.success());
    }
}

mod selection {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_only_skips_unmarked_siblings() {
        let rec = Recorder::new();
        let mut registry = Registry::new();
        registry
            .describe("suite", |r| {
                r.it("plain", rec.log("plain"))?;
                r.it_only("focused", rec.log("focused"))?;
                Ok(())
            })
            .unwrap();

        let report = run(registry);
        assert_eq!(rec.events(), vec!["focused"]);
        let plain = report.find("plain").unwrap();
        assert_eq!(plain.result, CaseResult::Skipped);
        assert_eq!(plain.skip_reason, Some(SkipReason::NotSelected));
        assert!(report.success());
    }

    #[test]
    fn test_skip_suite_wins_over_inner_only() {
        let rec = Recorder::new();
        let mut registry = Registry::new();
        registry
            .describe_skip("skipped", |r| {
                r.before_each(rec.log("hook"))?;
                r.it_only("inner only", rec.log("inner"))?;
                r.it("inner plain", rec.log("plain"))?;
                Ok(())
            })
            .unwrap();
        registry
            .describe("live", |r| r.it("runs", rec.log("runs")).map(|_| ()))
            .unwrap();

        let report = run(registry);
        assert_eq!(rec.events(), vec!["runs"]);
        assert_eq!(report.skipped(), 2);
        assert_eq!(report.find("runs").unwrap().result, CaseResult::Passed);
    }

    #[test]
    fn test_pending_cases_are_skipped() {
        let mut registry = Registry::new();
        registry
            .describe("todo", |r| r.pending("write me").map(|_| ()))
            .unwrap();

        let report = run(registry);
        let outcome = report.find("write me").unwrap();
        assert_eq!(outcome.result, CaseResult::Skipped);
        assert_eq!(outcome.skip_reason, Some(SkipReason::Pending));
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_grep_and_invert() {
        let mut registry = Registry::new();
        registry
            .describe("generators", |r| {
                r.it("yield values", || Ok(()))?;
                r.it("return early", || Ok(()))?;
                Ok(())
            })
            .unwrap();
        let tree = registry.finish().unwrap();

        let grep = regex::Regex::new("generators yield").unwrap();
        let report = run_tree(
            &tree,
            ExecutorConfig {
                grep: Some(grep.clone()),
                ..ExecutorConfig::default()
            },
        );
        assert_eq!(report.passed(), 1);
        assert_eq!(
            report.find("return early").unwrap().skip_reason,
            Some(SkipReason::Filtered)
        );

        let inverted = run_tree(
            &tree,
            ExecutorConfig {
                grep: Some(grep),
                invert: true,
                ..ExecutorConfig::default()
            },
        );
        assert_eq!(inverted.find("return early").unwrap().result, CaseResult::Passed);
        assert_eq!(inverted.find("yield values").unwrap().result, CaseResult::Skipped);
    }

    #[test]
    fn test_bail_skips_remaining_cases() {
        let rec = Recorder::new();
        let mut registry = Registry::new();
        registry
            .describe("suite", |r| {
                r.it("ok", rec.log("ok"))?;
                r.it("broken", rec.log_failing("broken"))?;
                r.it("after", rec.log("after"))?;
                Ok(())
            })
            .unwrap();
        let tree = registry.finish().unwrap();

        let report = run_tree(
            &tree,
            ExecutorConfig {
                bail: true,
                ..ExecutorConfig::default()
            },
        );
        assert_eq!(rec.events(), vec!["ok", "broken"]);
        let after = report.find("after").unwrap();
        assert_eq!(after.result, CaseResult::Skipped);
        assert_eq!(after.skip_reason, Some(SkipReason::Bail));
        assert_eq!(report.total(), 3);
    }
}

mod deadlines {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sleeper(ms: u64) -> Action {
        Action::future(move || async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Ok(())
        })
    }

    #[test]
    fn test_slow_case_times_out_and_run_continues() {
        let rec = Recorder::new();
        let mut registry = Registry::new();
        registry
            .describe("slow", |r| {
                r.after_each(rec.log("cleanup"))?;
                r.register_case_with(
                    "hangs",
                    CaseOptions::default().with_timeout(Duration::from_millis(20)),
                    Some(sleeper(5_000)),
                )?;
                r.it("next", rec.log("next"))?;
                Ok(())
            })
            .unwrap();

        let report = run(registry);
        let failure = report.find("hangs").unwrap().failure.clone().unwrap();
        assert_eq!(failure.kind, FailureKind::Timeout);
        assert!(failure.message.contains("20ms"));
        assert_eq!(report.find("next").unwrap().result, CaseResult::Passed);
        assert_eq!(rec.events(), vec!["cleanup", "next", "cleanup"]);
    }

    #[test]
    fn test_suite_timeout_is_inherited() {
        let mut registry = Registry::new();
        registry
            .describe("tight", |r| {
                r.set_timeout(Duration::from_millis(20))?;
                r.describe("nested", |r| r.register_case("slow", sleeper(5_000)).map(|_| ()))?;
                Ok(())
            })
            .unwrap();

        let report = run(registry);
        assert_eq!(
            report.find("slow").unwrap().failure.as_ref().unwrap().kind,
            FailureKind::Timeout
        );
    }

    #[test]
    fn test_async_case_within_deadline_passes() {
        let mut registry = Registry::new();
        registry
            .describe("async", |r| {
                r.it_async("awaits", || async {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    assert::equal("done", "done")
                })
                .map(|_| ())
            })
            .unwrap();
        let tree = registry.finish().unwrap();

        let report = run_tree(
            &tree,
            ExecutorConfig {
                timeout: Duration::from_millis(500),
                ..ExecutorConfig::default()
            },
        );
        assert!(report.success());
    }

    #[test]
    fn test_zero_timeout_disables_deadline() {
        let mut registry = Registry::new();
        registry
            .describe("unbounded", |r| r.register_case("sleeps", sleeper(30)).map(|_| ()))
            .unwrap();
        let tree = registry.finish().unwrap();

        let report = run_tree(
            &tree,
            ExecutorConfig {
                timeout: Duration::ZERO,
                ..ExecutorConfig::default()
            },
        );
        assert!(report.success());
    }

    #[test]
    fn test_hook_timeout_fails_case() {
        let mut registry = Registry::new();
        registry
            .describe("slow setup", |r| {
                r.set_timeout(Duration::from_millis(20))?;
                r.register_hook(HookPhase::BeforeEach, sleeper(5_000))?;
                r.it("blocked", || Ok(()))?;
                Ok(())
            })
            .unwrap();

        let report = run(registry);
        let failure = report.find("blocked").unwrap().failure.clone().unwrap();
        assert_eq!(failure.kind, FailureKind::Hook);
        assert!(failure.message.contains("TimeoutError"));
    }
}

mod suite_hooks {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_before_and_after_all_run_once() {
        let rec = Recorder::new();
        let mut registry = Registry::new();
        registry
            .describe("db", |r| {
                r.before_all(rec.log("connect"))?;
                r.after_all(rec.log("disconnect"))?;
                r.before_each(rec.log("begin"))?;
                r.it("a", rec.log("a"))?;
                r.it("b", rec.log("b"))?;
                Ok(())
            })
            .unwrap();

        assert!(run(registry).success());
        assert_eq!(
            rec.events(),
            vec!["connect", "begin", "a", "begin", "b", "disconnect"]
        );
    }

    #[test]
    fn test_before_all_skipped_without_runnable_cases() {
        let rec = Recorder::new();
        let mut registry = Registry::new();
        registry
            .describe("idle", |r| {
                r.before_all(rec.log("connect"))?;
                r.after_all(rec.log("disconnect"))?;
                r.it_skip("skipped", rec.log("skipped"))?;
                r.pending("pending")?;
                Ok(())
            })
            .unwrap();

        let report = run(registry);
        assert!(rec.events().is_empty());
        assert_eq!(report.skipped(), 2);
    }

    #[test]
    fn test_before_all_failure_fails_subtree() {
        let rec = Recorder::new();
        let mut registry = Registry::new();
        registry
            .describe("broken", |r| {
                r.before_all(rec.log_failing("connect"))?;
                r.after_all(rec.log("disconnect"))?;
                r.before_each(rec.log("begin"))?;
                r.it("a", rec.log("a"))?;
                r.describe("nested", |r| r.it("b", rec.log("b")).map(|_| ()))?;
                r.it_skip("c", rec.log("c"))?;
                Ok(())
            })
            .unwrap();

        let report = run(registry);
        assert_eq!(rec.events(), vec!["connect", "disconnect"]);
        assert_eq!(report.failed(), 2);
        assert_eq!(report.find("c").unwrap().result, CaseResult::Skipped);
        let failure = report.find("b").unwrap().failure.clone().unwrap();
        assert!(failure.message.contains("\"before all\" hook failed"));
    }

    #[test]
    fn test_after_all_failure_is_a_hook_error() {
        let mut registry = Registry::new();
        registry
            .describe("leaky", |r| {
                r.after_all(|| assert::fail("left files behind"))?;
                r.it("passes", || Ok(()))?;
                Ok(())
            })
            .unwrap();

        let report = run(registry);
        assert_eq!(report.passed(), 1);
        assert_eq!(report.hook_errors().len(), 1);
        assert_eq!(report.hook_errors()[0].suite_path, vec!["leaky"]);
        assert_eq!(report.hook_errors()[0].phase, HookPhase::AfterAll);
        assert!(!report.success());
        assert_eq!(report.exit_code(), 1);
    }
}

mod structure {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_manual_begin_end_matches_helpers() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = Registry::new();
        registry.begin_suite("manual", Modifier::Normal).unwrap();
        let l = log.clone();
        registry
            .register_case(
                "case",
                Action::new(move || {
                    l.borrow_mut().push("ran");
                    Ok(())
                }),
            )
            .unwrap();
        registry.end_suite().unwrap();

        let report = run(registry);
        assert!(report.success());
        assert_eq!(*log.borrow(), vec!["ran"]);
        assert_eq!(report.outcomes()[0].full_title(), "manual case");
    }
}
