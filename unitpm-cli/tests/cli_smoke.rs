use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

fn unitpm_cmd(root: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("unitpm"));
    cmd.env("HOME", root)
        .env("UNITPM_SCOPE", "user")
        .env("UNITPM_UNIT_DIR", root.join("units"))
        .env("UNITPM_LOG_DIR", root.join("logs"))
        .env_remove("UNITPM_PREFIX")
        .env("RUST_LOG", "off");
    cmd
}

fn write_unit(root: &Path, file_name: &str, body: &str) {
    let dir = root.join("units");
    fs::create_dir_all(&dir).expect("unit dir");
    fs::write(dir.join(file_name), body).expect("write unit");
}

#[test]
fn help_lists_every_command() {
    let root = TempDir::new().expect("root");
    let assert = unitpm_cmd(root.path()).arg("--help").assert().success();
    let out = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    for cmd in [
        "start", "stop", "restart", "delete", "list", "jlist", "describe", "env", "logs",
        "flush", "startup",
    ] {
        assert!(out.contains(cmd), "missing {cmd} in help:\n{out}");
    }
}

#[test]
fn jlist_on_empty_registry_is_empty_array() {
    let root = TempDir::new().expect("root");
    unitpm_cmd(root.path())
        .arg("jlist")
        .assert()
        .success()
        .stdout(predicate::str::diff("[]\n"));
}

#[test]
fn list_on_empty_registry_says_so() {
    let root = TempDir::new().expect("root");
    unitpm_cmd(root.path())
        .arg("list")
        .assert()
        .success()
        .stdout(contains("No apps defined."));
}

#[test]
fn describe_unknown_app_fails() {
    let root = TempDir::new().expect("root");
    unitpm_cmd(root.path())
        .args(["describe", "ghost"])
        .assert()
        .failure()
        .stderr(contains("'ghost' not found"));
}

#[test]
fn stop_unknown_id_fails() {
    let root = TempDir::new().expect("root");
    unitpm_cmd(root.path())
        .args(["stop", "7"])
        .assert()
        .failure()
        .stderr(contains("not found"));
}

#[test]
fn delete_all_on_empty_registry_succeeds() {
    let root = TempDir::new().expect("root");
    unitpm_cmd(root.path())
        .args(["delete", "all"])
        .assert()
        .success()
        .stdout(contains("No apps defined."));
}

#[test]
fn restart_all_on_empty_registry_succeeds() {
    let root = TempDir::new().expect("root");
    unitpm_cmd(root.path())
        .args(["restart", "all"])
        .assert()
        .success()
        .stdout(contains("No apps defined."));
}

#[test]
fn flush_empties_app_logs() {
    let root = TempDir::new().expect("root");
    let logs = root.path().join("logs");
    fs::create_dir_all(&logs).expect("log dir");
    fs::write(logs.join("api-out.log"), "one\ntwo\n").expect("out log");
    write_unit(
        root.path(),
        "pm2-0-api.service",
        &format!(
            "[Service]\nExecStart=/usr/bin/node api.js\nStandardOutput=append:{}\nStandardError=append:{}\n",
            logs.join("api-out.log").display(),
            logs.join("api-error.log").display()
        ),
    );

    unitpm_cmd(root.path())
        .args(["flush", "api"])
        .assert()
        .success()
        .stdout(contains("Flushed"));
    assert_eq!(fs::read_to_string(logs.join("api-out.log")).expect("read"), "");
}

#[test]
fn flush_with_no_apps_is_a_no_op() {
    let root = TempDir::new().expect("root");
    unitpm_cmd(root.path())
        .arg("flush")
        .assert()
        .success()
        .stdout(contains("No log files to flush."));
}

#[test]
fn logs_print_tail_with_header() {
    let root = TempDir::new().expect("root");
    let logs = root.path().join("logs");
    fs::create_dir_all(&logs).expect("log dir");
    let body: String = (1..=30).map(|i| format!("line {i}\n")).collect();
    fs::write(logs.join("api-out.log"), body).expect("out log");
    write_unit(
        root.path(),
        "pm2-0-api.service",
        &format!(
            "[Service]\nExecStart=/usr/bin/node api.js\nStandardOutput=append:{}\n",
            logs.join("api-out.log").display()
        ),
    );

    unitpm_cmd(root.path())
        .args(["logs", "0", "--lines", "2"])
        .assert()
        .success()
        .stdout(contains("==> ").and(contains("line 29\nline 30\n")).and(contains("line 28").not()));

    unitpm_cmd(root.path())
        .args(["logs", "api", "-l", "1"])
        .assert()
        .success()
        .stdout(contains("line 30\n").and(contains("line 29").not()));
}

#[test]
fn logs_without_recorded_paths_fail() {
    let root = TempDir::new().expect("root");
    write_unit(root.path(), "pm2-0-bare.service", "[Service]\nExecStart=/bin/true\n");
    unitpm_cmd(root.path())
        .args(["logs", "bare"])
        .assert()
        .failure()
        .stderr(contains("no log files recorded"));
}

#[test]
fn start_rejects_malformed_env() {
    let root = TempDir::new().expect("root");
    unitpm_cmd(root.path())
        .args(["start", "app.js", "--env", "NOEQUALS"])
        .assert()
        .failure()
        .stderr(contains("expected KEY=VALUE"));
    assert!(!root.path().join("units").exists());
}

#[test]
fn start_with_broken_ecosystem_fails_before_touching_units() {
    let root = TempDir::new().expect("root");
    let eco = root.path().join("ecosystem.json");
    fs::write(&eco, "{ not json").expect("write ecosystem");
    unitpm_cmd(root.path())
        .arg("start")
        .arg(&eco)
        .assert()
        .failure()
        .stderr(contains("failed to load ecosystem file"));
    assert!(!root.path().join("units").exists());
}

#[test]
fn start_refuses_javascript_ecosystem() {
    let root = TempDir::new().expect("root");
    let eco = root.path().join("ecosystem.config.js");
    fs::write(&eco, "module.exports = { apps: [] };").expect("write ecosystem");
    unitpm_cmd(root.path())
        .arg("start")
        .arg(&eco)
        .assert()
        .failure()
        .stderr(contains("JavaScript ecosystem files are not supported"));
    assert!(!root.path().join("units").exists());
}

#[test]
fn invalid_scope_is_reported() {
    let root = TempDir::new().expect("root");
    unitpm_cmd(root.path())
        .env("UNITPM_SCOPE", "galaxy")
        .arg("list")
        .assert()
        .failure()
        .stderr(contains("invalid scope"));
}
