#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

fn justitia_cmd() -> Command {
    Command::cargo_bin("justitia").expect("binary should be built")
}

fn test_cmd(cases: &str) -> Command {
    let mut cmd = justitia_cmd();
    cmd.arg("test")
        .arg("--policy")
        .arg(fixtures_dir().join("policy.json"))
        .arg("--cases")
        .arg(fixtures_dir().join(cases));
    cmd
}

fn json_report(cases: &str) -> serde_json::Value {
    let output = test_cmd(cases)
        .arg("--format")
        .arg("json")
        .output()
        .expect("command should run");
    serde_json::from_slice(&output.stdout).expect("stdout should be valid JSON")
}

#[test]
fn passing_suite_exits_0() {
    test_cmd("passing_cases.json").assert().code(0);
}

#[test]
fn failing_suite_exits_1() {
    test_cmd("failing_cases.json").assert().code(1);
}

#[test]
fn dangling_reference_exits_2_and_names_case() {
    test_cmd("dangling_cases.json")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("sql_1"))
        .stderr(predicate::str::contains("sql_injection"));
}

#[test]
fn missing_cases_file_exits_2() {
    test_cmd("does_not_exist.json")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to read test cases"));
}

#[test]
fn json_output_has_report_fields() {
    let parsed = json_report("passing_cases.json");

    for key in [
        "schema_version",
        "policy",
        "total_count",
        "pass_count",
        "pass_rate",
        "average_score",
        "empty_suite",
        "cases",
        "per_rule_stats",
        "category_stats",
    ] {
        assert!(parsed.get(key).is_some(), "missing key {key}");
    }
    assert_eq!(parsed["policy"]["domain"], "code-review");
    assert_eq!(parsed["total_count"], 2);
    assert_eq!(parsed["pass_count"], 2);
    assert_eq!(parsed["pass_rate"], 1.0);
}

#[test]
fn json_output_classifies_discrepancies() {
    let parsed = json_report("failing_cases.json");
    let case = &parsed["cases"][0];

    assert_eq!(case["case_id"], "secret_and_eval");
    assert_eq!(case["passed"], false);
    assert_eq!(case["true_positives"], serde_json::json!(["hardcoded_secrets"]));
    assert_eq!(case["false_negatives"], serde_json::json!(["unsafe_eval"]));
    assert_eq!(case["false_positives"], serde_json::json!([]));

    let stats = parsed["per_rule_stats"].as_array().unwrap();
    let order: Vec<&str> = stats.iter().map(|s| s["rule_id"].as_str().unwrap()).collect();
    assert_eq!(order, vec!["hardcoded_secrets", "unsafe_eval"]);
    assert_eq!(stats[1]["false_negative"], 1);
}

#[test]
fn json_output_is_identical_across_thread_settings() {
    let run = |extra: &[&str]| {
        let output = test_cmd("failing_cases.json")
            .args(["--format", "json"])
            .args(extra)
            .output()
            .expect("command should run");
        output.stdout
    };
    let sequential = run(&["--sequential"]);
    assert_eq!(sequential, run(&["--threads", "4"]));
    assert_eq!(sequential, run(&[]));
}

#[test]
fn empty_suite_is_flagged() {
    let parsed = json_report("empty_cases.json");
    assert_eq!(parsed["empty_suite"], true);
    assert_eq!(parsed["total_count"], 0);
    assert_eq!(parsed["pass_rate"], 0.0);
}

#[test]
fn text_output_shows_summary() {
    test_cmd("failing_cases.json")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("code-review"))
        .stdout(predicate::str::contains("FN: unsafe_eval"))
        .stdout(predicate::str::contains("Passed: 1 (50.0%)"));
}

#[test]
fn case_sensitive_flag_changes_result() {
    // The fixture writes API_KEY in upper case; the pattern is lower case.
    test_cmd("passing_cases.json")
        .arg("--case-sensitive")
        .assert()
        .code(1);
}

#[test]
fn out_flag_writes_report_file() {
    let out = NamedTempFile::new().unwrap();
    test_cmd("passing_cases.json")
        .args(["--format", "json", "--out"])
        .arg(out.path())
        .assert()
        .code(0)
        .stdout(predicate::str::is_empty());

    let written = std::fs::read_to_string(out.path()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(parsed["pass_count"], 2);
}

#[test]
fn unwritable_out_path_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("missing_dir").join("report.json");
    test_cmd("passing_cases.json")
        .arg("--out")
        .arg(&target)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to write report"))
        .stderr(predicate::str::contains("report.json"));
}

#[test]
fn threads_and_sequential_conflict() {
    test_cmd("passing_cases.json")
        .args(["--sequential", "--threads", "2"])
        .assert()
        .failure();
}

#[test]
fn check_accepts_valid_policy() {
    justitia_cmd()
        .arg("check")
        .arg("--policy")
        .arg(fixtures_dir().join("policy.json"))
        .assert()
        .code(0)
        .stdout(predicate::str::contains("policy ok: code-review v1.2 (2 rules)"));
}

#[test]
fn check_rejects_invalid_pattern() {
    justitia_cmd()
        .arg("check")
        .arg("--policy")
        .arg(fixtures_dir().join("bad_policy.json"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("broken"))
        .stderr(predicate::str::contains("invalid pattern"));
}
