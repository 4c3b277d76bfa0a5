//! Runs the compiled `poolkeep-replay` binary against the bundled scenario.

use std::process::{Command, Output};

use serde_json::Value;

const BIN: &str = env!("CARGO_BIN_EXE_poolkeep-replay");
const SCENARIO: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/scenarios/operator_limit.json");

fn replay(args: &[&str]) -> Output {
    Command::new(BIN)
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("binary runs")
}

fn report(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "exit {:?}: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is a JSON report")
}

#[test]
fn bundled_scenario_prints_report() {
    let report = report(&replay(&[SCENARIO, "--compact"]));

    let steps = report["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 10);
    let failed: Vec<&Value> = steps.iter().filter(|s| s["ok"] == false).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0]["index"], 7);
    assert_eq!(failed[0]["op"], "withdraw_native");
    assert!(failed[0]["error"].as_str().unwrap().starts_with("PK_ERR_401"));

    assert_eq!(report["balances"][0]["asset"], "native");
    assert_eq!(report["balances"][0]["amount"], "800");
    assert_eq!(report["balances"][1]["amount"], "2970");
    assert_eq!(report["paused"], false);
    assert_eq!(report["journal"].as_array().unwrap().len(), 8);
    assert_eq!(report["journal_head"].as_str().unwrap().len(), 64);
}

#[test]
fn summary_omits_journal_but_keeps_head() {
    let full = report(&replay(&[SCENARIO]));
    let summary = report(&replay(&[SCENARIO, "--summary"]));

    assert!(summary["journal"].as_array().unwrap().is_empty());
    assert_eq!(summary["balances"], full["balances"]);
    assert_eq!(summary["steps"], full["steps"]);
}

#[test]
fn fail_fast_exits_nonzero() {
    let output = replay(&[SCENARIO, "--fail-fast"]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("step 7 (withdraw_native) failed"), "{stderr}");
}

#[test]
fn missing_scenario_is_reported() {
    let output = replay(&["/nonexistent/scenario.json"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("reading scenario"), "{stderr}");
}
