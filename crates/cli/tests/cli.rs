use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

/// Command running offline against stub platform clients
fn stub_cmd(dir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("devstats");
    cmd.current_dir(dir.path())
        .env_remove("RUST_LOG")
        .env("DEVSTATS__UPSTREAM__PROVIDER", "stub");
    cmd
}

#[test]
fn config_init_writes_example_file() {
    let dir = TempDir::new().expect("temp dir");
    let config_path = dir.path().join("nested").join("devstats.toml");

    let mut cmd = cargo_bin_cmd!("devstats");
    cmd.args(["config", "init", "--path"])
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config file"));

    let content = fs::read_to_string(&config_path).expect("read config");
    assert!(content.contains("listen_addr"));
    assert!(content.contains("token_env = \"GITHUB_TOKEN\""));

    let mut again = cargo_bin_cmd!("devstats");
    again
        .args(["config", "init", "--path"])
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn fetch_outputs_platform_stats_json() {
    let dir = TempDir::new().expect("temp dir");

    let output = stub_cmd(&dir)
        .args(["fetch", "leetcode", "https://leetcode.com/u/alice/", "--json"])
        .output()
        .expect("run fetch");

    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["platform"], "leetcode");
    assert_eq!(value["username"], "alice");
    assert_eq!(value["solved"], 150);
    assert_eq!(value["monthlyProgress"].as_object().map(|m| m.len()), Some(12));
}

#[test]
fn fetch_reports_missing_user() {
    let dir = TempDir::new().expect("temp dir");

    stub_cmd(&dir)
        .args(["fetch", "codechef", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("User not found"));
}

#[test]
fn fetch_rejects_unknown_platform() {
    let dir = TempDir::new().expect("temp dir");

    stub_cmd(&dir)
        .args(["fetch", "topcoder", "alice"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown platform"));
}

#[test]
fn aggregate_keeps_successes_when_one_platform_fails() {
    let dir = TempDir::new().expect("temp dir");

    let output = stub_cmd(&dir)
        .args([
            "aggregate",
            "--leetcode",
            "alice",
            "--codechef",
            "bob",
            "--github",
            "ghost-user",
            "--json",
        ])
        .output()
        .expect("run aggregate");

    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["totalSolved"], 190);
    assert!(value["perPlatform"]["github"].is_null());
    assert_eq!(value["failures"][0]["platform"], "github");
    assert_eq!(value["failures"][0]["reason"], "not_found");

    let recent = value["combinedRecent"].as_array().expect("recent array");
    assert_eq!(recent.len(), 4);
    assert_eq!(recent[0]["timestamp"], "2024-03-10T12:00:00Z");
}

#[test]
fn aggregate_text_output_lists_totals() {
    let dir = TempDir::new().expect("temp dir");

    stub_cmd(&dir)
        .args(["aggregate", "--hackerrank", "carol"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total solved: 25"))
        .stdout(predicate::str::contains("Problem Solving"));
}

#[test]
fn handles_persist_in_sqlite_store() {
    let dir = TempDir::new().expect("temp dir");
    let db = dir.path().join("handles.sqlite");

    let with_store = |cmd: &mut Command| {
        cmd.env("DEVSTATS__GENERAL__STORE", "sqlite")
            .env("DEVSTATS__GENERAL__STORE_PATH", &db);
    };

    let mut set = stub_cmd(&dir);
    with_store(&mut set);
    set.args(["handles", "set", "u1", "github", "github.com/octocat"])
        .assert()
        .success()
        .stdout(predicate::str::contains("octocat"));

    let mut list = stub_cmd(&dir);
    with_store(&mut list);
    let output = list
        .args(["handles", "list", "u1", "--json"])
        .output()
        .expect("run handles list");
    assert!(output.status.success());
    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value, serde_json::json!({ "github": "octocat" }));

    let mut aggregate = stub_cmd(&dir);
    with_store(&mut aggregate);
    let output = aggregate
        .args(["aggregate", "--user", "u1", "--json"])
        .output()
        .expect("run aggregate");
    assert!(output.status.success());
    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["totalSolved"], 300);

    let mut remove = stub_cmd(&dir);
    with_store(&mut remove);
    remove
        .args(["handles", "remove", "u1", "github"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed GitHub handle"));
}

#[test]
fn handles_set_rejects_unusable_handle() {
    let dir = TempDir::new().expect("temp dir");

    stub_cmd(&dir)
        .args(["handles", "set", "u1", "leetcode", "!!!"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a valid LeetCode username"));
}

#[test]
fn doctor_reports_json() {
    let dir = TempDir::new().expect("temp dir");

    let output = stub_cmd(&dir)
        .args(["doctor", "--json"])
        .output()
        .expect("run doctor");

    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["config"]["status"], "ok");
    assert_eq!(value["upstream"]["status"], "ok");
    assert_eq!(value["overall"], "warn");
}

#[test]
fn doctor_fails_on_missing_config_file() {
    let dir = TempDir::new().expect("temp dir");

    stub_cmd(&dir)
        .args(["doctor", "--config", "missing.toml"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Failed to load config"));
}
