//! Integration tests for the `acp-conformance` binary.
//!
//! Covers vector listing, offline and live runs, report outputs, and exit
//! codes.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

/// Get the `acp-conformance` command for testing.
fn conformance_cmd() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_acp-conformance"));
    cmd.env("RUST_LOG", "error");
    cmd.env_remove("ACP_CONFORMANCE_TIMEOUT_MS");
    cmd
}

fn test_agent_path() -> &'static str {
    env!("CARGO_BIN_EXE_acp-test-agent")
}

#[test]
fn list_prints_every_builtin_vector() {
    conformance_cmd()
        .arg("--list")
        .assert()
        .success()
        .stdout(predicate::str::contains("ACP-T1-001\ttier-1\tcall"))
        .stdout(predicate::str::contains("ACP-T1-004\ttier-1\traw"))
        .stdout(predicate::str::contains("ACP-T3-007\ttier-3\tscenario"));
}

#[test]
fn level_filter_limits_listing() {
    conformance_cmd()
        .args(["--list", "--level", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ACP-T1-009"))
        .stdout(predicate::str::contains("ACP-T2-").not());
}

#[test]
fn offline_run_reports_partial_markdown() {
    conformance_cmd()
        .assert()
        .success()
        .stdout(predicate::str::contains("# ACP Conformance Report"))
        .stdout(predicate::str::contains("**tier-3 PARTIAL**"))
        .stdout(predicate::str::contains("no transport configured"));
}

#[test]
fn live_run_against_test_agent_emits_json() {
    let output = conformance_cmd()
        .args(["--target-cmd", test_agent_path(), "--json"])
        .output()
        .expect("run acp-conformance");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let report: Value = serde_json::from_slice(&output.stdout).expect("stdout is the JSON report");
    assert_eq!(report["overallResult"], "tier-3 PARTIAL");
    assert_eq!(report["criteria"]["tier1"]["result"], "CONFORMANT");
    assert_eq!(report["criteria"]["tier2"]["result"], "CONFORMANT");
    assert_eq!(report["criteria"]["tier3"]["skipped"], 2);
}

#[test]
fn spawn_failure_exits_with_usage_code() {
    conformance_cmd()
        .args(["--target-cmd", "/nonexistent/acp-target"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to spawn"));
}

#[test]
fn target_arg_without_command_is_rejected() {
    conformance_cmd()
        .args(["--target-arg", "--stdio"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--target-cmd"));
}

#[test]
fn failing_vectors_exit_non_zero() {
    let tmp = TempDir::new().expect("tempdir");
    let vectors = tmp.path().join("vectors.json");
    fs::write(
        &vectors,
        r#"[{
            "id": "X-1",
            "level": "tier-1",
            "title": "manifest without kind claimed valid",
            "manifestData": {"apiVersion": "acp/v1", "metadata": {"name": "x", "version": "1.0.0"}},
            "expected": {"kind": "manifest-valid"}
        }]"#,
    )
    .expect("write vectors");

    conformance_cmd()
        .arg("--vectors")
        .arg(&vectors)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("NON-CONFORMANT"))
        .stdout(predicate::str::contains("manifest rejected"));
}

#[test]
fn config_file_drives_run_and_outputs() {
    let tmp = TempDir::new().expect("tempdir");
    fs::write(
        tmp.path().join("skip.toml"),
        "\"ACP-T1-003\" = \"agent uses a custom code for unknown methods\"\n",
    )
    .expect("write skip policy");
    fs::write(
        tmp.path().join("agent.json"),
        r#"{"apiVersion": "acp/v1", "kind": "Agent", "metadata": {"name": "agent", "version": "1.0.0"}, "tools": [{"name": "echo"}]}"#,
    )
    .expect("write manifest");
    fs::write(
        tmp.path().join("acp.toml"),
        format!(
            r#"
timeout_ms = 5000
skip_policy = "skip.toml"
manifest = "agent.json"
log_jsonl = "run.jsonl"

[target]
command = "{}"
"#,
            test_agent_path().replace('\\', "\\\\")
        ),
    )
    .expect("write config");
    let report_path = tmp.path().join("report.json");

    conformance_cmd()
        .arg("--config")
        .arg(tmp.path().join("acp.toml"))
        .arg("--output")
        .arg(&report_path)
        .args(["--level", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("**tier-2 CONFORMANT**"))
        .stdout(predicate::str::contains("- **Declared level:** tier-2"));

    let report: Value =
        serde_json::from_str(&fs::read_to_string(&report_path).expect("report written"))
            .expect("report is JSON");
    assert_eq!(report["manifestValid"], true);
    assert_eq!(report["criteria"]["tier1"]["result"], "PARTIAL");

    let log = fs::read_to_string(tmp.path().join("run.jsonl")).expect("run log written");
    let entries: Vec<Value> = log
        .lines()
        .map(|line| serde_json::from_str(line).expect("log line is JSON"))
        .collect();
    assert!(entries.len() > 1);
    assert!(entries.iter().all(|e| e["correlation_id"] == entries[0]["correlation_id"]));
}

#[test]
fn invalid_config_exits_with_usage_code() {
    let tmp = TempDir::new().expect("tempdir");
    let config = tmp.path().join("acp.toml");
    fs::write(&config, "timeout_ms = 0\n").expect("write config");

    conformance_cmd()
        .arg("--config")
        .arg(&config)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("timeout_ms"));
}
