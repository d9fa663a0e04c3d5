//! CLI integration tests for the edokit command-line interface.
//!
//! These tests verify:
//! - Help text is displayed correctly
//! - Argument parsing works as expected
//! - Invalid inputs are rejected with appropriate messages
//!
//! Note: These tests do not require a running proxy - they test
//! CLI parsing and help output only.

use assert_cmd::Command;
use predicates::prelude::*;

/// Get a command for the edokit binary.
fn edokit() -> Command {
    Command::cargo_bin("edokit").unwrap()
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_displays() {
    edokit()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("edokit"))
        .stdout(predicate::str::contains("EDO"));
}

#[test]
fn test_version_displays() {
    edokit()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("edokit"));
}

#[test]
fn test_help_lists_subcommands() {
    edokit()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("auth"))
        .stdout(predicate::str::contains("fetch"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Global Flag Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_verbose_flag_accepted() {
    // --verbose is global and should be parsed without error
    edokit().args(["--verbose", "--help"]).assert().success();
}

#[test]
fn test_json_flag_accepted() {
    edokit().args(["--json", "--help"]).assert().success();
}

#[test]
fn test_proxy_flag_accepted() {
    edokit()
        .args(["--proxy", "http://localhost:9999", "--help"])
        .assert()
        .success();
}

// ─────────────────────────────────────────────────────────────────────────────
// Subcommand Help Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_serve_help() {
    edokit()
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--port"))
        .stdout(predicate::str::contains("--upstream"))
        .stdout(predicate::str::contains("proxy").or(predicate::str::contains("Proxy")));
}

#[test]
fn test_auth_help() {
    edokit()
        .args(["auth", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("logout"));
}

#[test]
fn test_auth_login_help() {
    edokit()
        .args(["auth", "login", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--manual"));
}

#[test]
fn test_auth_logout_help() {
    edokit()
        .args(["auth", "logout", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--purge-cache"));
}

#[test]
fn test_fetch_help() {
    edokit()
        .args(["fetch", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PATH"))
        .stdout(predicate::str::contains("--param"))
        .stdout(predicate::str::contains("--token"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Invalid Input Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_fetch_requires_a_path() {
    edokit()
        .arg("fetch")
        .assert()
        .failure()
        .stderr(predicate::str::contains("PATH"));
}

#[test]
fn test_auth_requires_a_subcommand() {
    edokit().arg("auth").assert().failure();
}

#[test]
fn test_fetch_rejects_malformed_params() {
    edokit()
        .args(["fetch", "point/building", "--param", "justakey"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("KEY=VALUE"));
}

#[test]
fn test_unknown_subcommand_fails() {
    edokit()
        .arg("unknown-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_invalid_flag_fails() {
    edokit()
        .arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}
