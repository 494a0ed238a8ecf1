//! Integration tests for manifests and report rendering

mod common;
use common::run_tree;
use kata::manifest::Manifest;
use kata::report::render_tree;
use kata::{CaseResult, Error, ExecutorConfig, Reporter};
use std::io::Write;
use tempfile::NamedTempFile;

const SPREAD: &str = r#"{
  "timeout_ms": 1000,
  "suites": [
    { "describe": "spread with arrays", "body": [
      { "beforeEach": [ { "sleep_ms": 1 } ] },
      { "it": "extracts each array item", "steps": [
        { "assert": "equal", "actual": 1, "expected": "1" },
        { "assert": "deepEqual", "actual": [1, 2], "expected": [1, 2] }
      ] },
      { "it": "mismatched order", "steps": [
        { "assert": "deepEqual", "actual": [1, 2], "expected": [2, 1], "message": "order matters" }
      ] },
      { "describe": "in combination with rest", "skip": true, "body": [
        { "it": "collects the rest", "steps": [] }
      ] },
      { "it": "pending" }
    ] }
  ]
}"#;

fn manifest_file(source: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(source.as_bytes()).unwrap();
    file
}

mod loading {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_path_runs_suites() {
        let file = manifest_file(SPREAD);
        let manifest = Manifest::from_path(file.path()).unwrap();
        assert_eq!(manifest.timeout().map(|t| t.as_millis()), Some(1000));

        let tree = manifest.build_tree().unwrap();
        let report = run_tree(&tree, ExecutorConfig::default());
        let results: Vec<(String, CaseResult)> = report
            .outcomes()
            .iter()
            .map(|o| (o.name.clone(), o.result))
            .collect();
        assert_eq!(
            results,
            vec![
                ("extracts each array item".to_string(), CaseResult::Passed),
                ("mismatched order".to_string(), CaseResult::Failed),
                ("collects the rest".to_string(), CaseResult::Skipped),
                ("pending".to_string(), CaseResult::Skipped),
            ]
        );
        let failure = report.find("mismatched order").unwrap().failure.clone().unwrap();
        assert!(failure.message.starts_with("order matters: "));
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Manifest::from_path(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, Error::IoError { .. }));
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        let file = manifest_file("{ \"suites\": [ { \"describe\": 3 } ] }");
        assert!(Manifest::from_path(file.path()).is_err());
    }

    #[test]
    fn test_list_outline() {
        let manifest: Manifest = SPREAD.parse().unwrap();
        let tree = manifest.build_tree().unwrap();
        assert_eq!(
            render_tree(&tree),
            "spread with arrays\n  \
             - extracts each array item\n  \
             - mismatched order\n  \
             in combination with rest [skip]\n    \
             - collects the rest\n  \
             - pending (pending)\n"
        );
    }
}

mod reporters {
    use super::*;
    use pretty_assertions::assert_eq;

    fn report() -> kata::ExecutionReport {
        let tree = SPREAD.parse::<Manifest>().unwrap().build_tree().unwrap();
        run_tree(&tree, ExecutorConfig::default())
    }

    #[test]
    fn test_spec_reporter() {
        let text = Reporter::Spec.render(&report());
        assert!(text.contains("  spread with arrays\n    ✓ extracts each array item"));
        assert!(text.contains("    ✗ 1) mismatched order\n"));
        assert!(text.contains("    in combination with rest\n      ○ collects the rest\n"));
        assert!(text.contains("1 passing"));
        assert!(text.contains("1 failing"));
        assert!(text.contains("2 skipped"));
        assert!(text.contains("1) spread with arrays mismatched order:"));
        assert!(text.contains("expected: [ 2, 1 ]"));
    }

    #[test]
    fn test_json_reporter() {
        let text = Reporter::Json.render(&report());
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["stats"]["total"], 4);
        assert_eq!(json["stats"]["passed"], 1);
        assert_eq!(json["stats"]["failed"], 1);
        assert_eq!(json["stats"]["skipped"], 2);
        assert_eq!(json["stats"]["success"], false);
        assert_eq!(json["outcomes"][2]["skip_reason"], "modifier");
        assert_eq!(json["outcomes"][1]["failure"]["operator"], "deepStrictEqual");
    }

    #[test]
    fn test_tap_reporter() {
        let text = Reporter::Tap.render(&report());
        assert!(text.starts_with("TAP version 13\n1..4\n"));
        assert!(text.contains("ok 1 - spread with arrays extracts each array item\n"));
        assert!(text.contains("not ok 2 - spread with arrays mismatched order\n"));
        assert!(text.contains("# SKIP"));
        assert!(text.ends_with("# pass 1\n# fail 1\n# skip 2\n"));
    }
}
