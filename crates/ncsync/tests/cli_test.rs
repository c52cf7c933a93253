//! Integration tests for the `ncsync` CLI binary.
//!
//! These tests validate argument parsing, help output, shell completions,
//! configuration handling, and per-device failure reporting, all without a
//! reachable router.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `ncsync` binary with env isolation.
///
/// Clears all `NCSYNC_*` env vars, runs inside `dir`, and points config
/// and keyring lookups at nothing so tests never touch real settings.
fn ncsync_cmd(dir: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("ncsync");
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join("xdg"))
        .env("DBUS_SESSION_BUS_ADDRESS", "unix:path=/nonexistent/bus")
        .env_remove("RUST_LOG");
    for (key, _) in std::env::vars() {
        if key.starts_with("NCSYNC_") {
            cmd.env_remove(key);
        }
    }
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let tmp = tempfile::tempdir().unwrap();
    let output = ncsync_cmd(tmp.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_lists_commands() {
    let tmp = tempfile::tempdir().unwrap();
    ncsync_cmd(tmp.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("run")
            .and(predicate::str::contains("backup"))
            .and(predicate::str::contains("status"))
            .and(predicate::str::contains("config")),
    );
}

#[test]
fn test_version_flag() {
    let tmp = tempfile::tempdir().unwrap();
    ncsync_cmd(tmp.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ncsync"));
}

#[test]
fn test_completions_bash() {
    let tmp = tempfile::tempdir().unwrap();
    ncsync_cmd(tmp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Argument errors ─────────────────────────────────────────────────

#[test]
fn test_run_requires_a_target() {
    let tmp = tempfile::tempdir().unwrap();
    let output = ncsync_cmd(tmp.path()).arg("run").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("--node"), "Expected --node in error:\n{text}");
}

#[test]
fn test_run_help_shows_defaults_and_flags() {
    let tmp = tempfile::tempdir().unwrap();
    ncsync_cmd(tmp.path())
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--node")
                .and(predicate::str::contains("--inventory"))
                .and(predicate::str::contains("--user"))
                .and(predicate::str::contains("--port")),
        );
}

#[test]
fn test_missing_inventory_is_usage_error() {
    let tmp = tempfile::tempdir().unwrap();
    ncsync_cmd(tmp.path())
        .args(["backup", "--inventory", "absent.txt"])
        .env("NCSYNC_RPC_PASSWORD", "pw")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("inventory"));
}

// ── Credentials ─────────────────────────────────────────────────────

#[test]
fn test_backup_without_rpc_password_fails_with_auth_code() {
    let tmp = tempfile::tempdir().unwrap();
    ncsync_cmd(tmp.path())
        .args(["backup", "--node", "192.0.2.1"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("NCSYNC_RPC_PASSWORD"));
}

// ── Per-device failures ─────────────────────────────────────────────

#[test]
fn test_unreachable_device_is_reported_and_logged() {
    let tmp = tempfile::tempdir().unwrap();
    let output = ncsync_cmd(tmp.path())
        .args([
            "--output", "json", "--timeout", "5", "backup", "-n", "127.0.0.1", "-p", "1",
        ])
        .env("NCSYNC_RPC_PASSWORD", "pw")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(9), "{}", combined_output(&output));

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let report = &summary["reports"][0];
    assert_eq!(report["address"], "127.0.0.1");
    assert_eq!(report["outcome"]["status"], "failed");
    assert_eq!(report["outcome"]["phase"], "connecting-rpc");
    assert_eq!(report["outcome"]["kind"], "connect");

    let log = std::fs::read_to_string(tmp.path().join("logging").join("ncsync.log")).unwrap();
    assert!(log.contains("127.0.0.1"), "log should name the device:\n{log}");
    assert!(!log.contains("\"pw\""));
}

#[test]
fn test_every_device_is_attempted() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("devices.txt"), "# lab\n127.0.0.1\n127.0.0.2\n").unwrap();

    let output = ncsync_cmd(tmp.path())
        .args([
            "-o", "json", "--timeout", "5", "status", "-i", "devices.txt", "-n", "127.0.0.3",
        ])
        .env("NCSYNC_SSH_PASSWORD", "pw")
        .env("NCSYNC_SSH_PORT", "1")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(9), "{}", combined_output(&output));
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let addresses: Vec<_> = summary["reports"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["address"].as_str().unwrap().to_owned())
        .collect();
    assert_eq!(addresses, ["127.0.0.3", "127.0.0.1", "127.0.0.2"]);
    assert_eq!(summary["reports"][1]["outcome"]["phase"], "connecting-ssh");
}

// ── Config commands ─────────────────────────────────────────────────

#[test]
fn test_config_path_honours_flag() {
    let tmp = tempfile::tempdir().unwrap();
    ncsync_cmd(tmp.path())
        .args(["--config", "custom.toml", "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"));
}

#[test]
fn test_config_init_then_show() {
    let tmp = tempfile::tempdir().unwrap();
    ncsync_cmd(tmp.path())
        .args(["--config", "ncsync.toml", "config", "init"])
        .assert()
        .success();
    assert!(tmp.path().join("ncsync.toml").exists());

    ncsync_cmd(tmp.path())
        .args(["--config", "ncsync.toml", "config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("rpc_username = \"netconf\"")
                .and(predicate::str::contains("rpc_port = 830")),
        );
}

#[test]
fn test_config_show_redacts_plaintext_password() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("c.toml"), "rpc_password = \"hunter2\"\n").unwrap();

    ncsync_cmd(tmp.path())
        .args(["--config", "c.toml", "-o", "json", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hunter2").not())
        .stdout(predicate::str::contains("********"));
}
