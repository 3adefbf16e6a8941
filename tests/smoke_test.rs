//! Smoke tests for the opedit CLI.
//!
//! These tests verify basic CLI functionality:
//! - `opedit --version` outputs version info
//! - `opedit --help` outputs help text
//! - unknown commands fail

mod common;

use assert_cmd::Command;
use common::TestEnv;
use predicates::prelude::*;

/// Get a Command for the opedit binary.
fn opedit() -> Command {
    Command::new(env!("CARGO_BIN_EXE_opedit"))
}

#[test]
fn test_version_flag() {
    opedit()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("opedit"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_flag() {
    opedit()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("Options:"));
}

#[test]
fn test_no_subcommand_fails() {
    opedit().assert().failure();
}

#[test]
fn test_unknown_command_fails() {
    opedit().arg("frobnicate").assert().failure();
}

#[test]
fn test_first_run_creates_file() {
    let env = TestEnv::new();
    assert!(!env.params_path().exists());

    env.opedit().arg("list").assert().success();

    let params = env.read_params();
    assert_eq!(params["camera_offset"], serde_json::json!(0.06));
    assert_eq!(params["non_live_param"], serde_json::json!(false));
    assert_eq!(params["op_edit_live_mode"], serde_json::json!(false));
}
