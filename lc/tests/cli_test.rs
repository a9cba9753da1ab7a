//! CLI tests for the `lc` binary

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// `lc` isolated from the user's config and data directories
fn lc(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("lc").unwrap();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join("config"))
        .env("XDG_DATA_HOME", dir.path().join("data"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

fn fast_config(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("fast.yml");
    fs::write(
        &path,
        r#"
coordinator:
  default-message: "Please wait"
routes:
  trigger-prefixes: ["/dashboard"]
  messages:
    /dashboard: "Loading dashboard..."
  durations:
    default: 40
  prepare-delay-ms: 10
"#,
    )
    .unwrap();
    path
}

#[test]
fn test_routes_lists_default_table() {
    let dir = TempDir::new().unwrap();
    lc(&dir)
        .arg("routes")
        .assert()
        .success()
        .stdout(predicate::str::contains("Trigger prefixes:"))
        .stdout(predicate::str::contains("/analytics"))
        .stdout(predicate::str::contains("Crunching analytics..."));
}

#[test]
fn test_routes_resolves_path() {
    let dir = TempDir::new().unwrap();
    lc(&dir)
        .args(["routes", "--path", "/analytics?range=7d"])
        .assert()
        .success()
        .stdout(predicate::str::contains("triggers a session"))
        .stdout(predicate::str::contains("Crunching analytics..."))
        .stdout(predicate::str::contains("1200ms"));

    lc(&dir)
        .args(["routes", "--path", "/pricing"])
        .assert()
        .success()
        .stdout(predicate::str::contains("does not trigger a session"));
}

#[test]
fn test_routes_json() {
    let dir = TempDir::new().unwrap();
    let output = lc(&dir)
        .args(["--format", "json", "routes", "--path", "/reports"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let body: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["triggers"], true);
    assert_eq!(body["message"], "Generating reports...");
    assert_eq!(body["min_duration_ms"], 1500);
}

#[test]
fn test_routes_uses_config_file() {
    let dir = TempDir::new().unwrap();
    let config = fast_config(&dir);
    lc(&dir)
        .arg("--config")
        .arg(&config)
        .args(["routes", "--path", "/reports"])
        .assert()
        .success()
        .stdout(predicate::str::contains("does not trigger a session"));
}

#[test]
fn test_invalid_config_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.yml");
    fs::write(&path, "routes:\n  trigger-prefixes: [\"dashboard\"]\n").unwrap();
    lc(&dir)
        .arg("--config")
        .arg(&path)
        .arg("routes")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid route policy"));
}

#[test]
fn test_run_shows_and_hides() {
    let dir = TempDir::new().unwrap();
    lc(&dir)
        .args(["run", "--work-ms", "10", "--min-ms", "50", "--message", "Saving"])
        .assert()
        .success()
        .stdout(predicate::str::contains("shown Saving"))
        .stdout(predicate::str::contains("hidden"))
        .stdout(predicate::str::contains("ok (10)"))
        .stdout(predicate::str::contains("acquired=1 released=1"));
}

#[test]
fn test_run_failure_reported() {
    let dir = TempDir::new().unwrap();
    lc(&dir)
        .args(["run", "--work-ms", "5", "--min-ms", "20", "--fail"])
        .assert()
        .success()
        .stdout(predicate::str::contains("failed:"))
        .stdout(predicate::str::contains("simulated failure"));

    lc(&dir)
        .args(["run", "--work-ms", "5", "--min-ms", "20", "--fail", "--absorb"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ok (0)"));
}

#[test]
fn test_run_stall_recovers() {
    let dir = TempDir::new().unwrap();
    lc(&dir)
        .args(["run", "--stall-ms", "30", "--min-ms", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("force-hide cleared 1 token(s)"))
        .stdout(predicate::str::contains("hidden"))
        .stdout(predicate::str::contains("ignored=1 forced=1"));
}

#[test]
fn test_run_json_lines() {
    let dir = TempDir::new().unwrap();
    let output = lc(&dir)
        .args(["-f", "json", "run", "--work-ms", "5", "--min-ms", "10"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let lines: Vec<serde_json::Value> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    let kinds: Vec<&str> = lines.iter().map(|l| l["kind"].as_str().unwrap()).collect();
    assert_eq!(kinds, vec!["indicator", "indicator", "result", "stats"]);
    assert_eq!(lines[0]["data"]["type"], "shown");
    assert_eq!(lines[2]["data"]["ok"], 5);
}

#[test]
fn test_sequence_aborts_at_failing_step() {
    let dir = TempDir::new().unwrap();
    lc(&dir)
        .args(["sequence", "--steps", "3", "--step-ms", "5", "--min-ms", "10", "--fail-at", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("step 2 started"))
        .stdout(predicate::str::contains("step 3 started").not())
        .stdout(predicate::str::contains("step 2 failed"));
}

#[test]
fn test_navigate_publishes_views() {
    let dir = TempDir::new().unwrap();
    let config = fast_config(&dir);
    lc(&dir)
        .arg("--config")
        .arg(&config)
        .args(["navigate", "/", "/dashboard?tab=usage", "--gap-ms", "20"])
        .assert()
        .success()
        .stdout(predicate::str::contains("content /"))
        .stdout(predicate::str::contains("loading Loading dashboard..."))
        .stdout(predicate::str::contains("content /dashboard?tab=usage"))
        .stdout(predicate::str::contains("acquired=1 released=1"));
}
