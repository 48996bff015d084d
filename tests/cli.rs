use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

fn bassam_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_bassam"))
}

#[test]
fn test_cli_help() {
    bassam_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Bassam assistant"))
        .stdout(predicate::str::contains("--no-stream"));
}

#[test]
fn test_cli_version() {
    bassam_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("bassam"));
}

#[test]
fn test_config_where() {
    bassam_cmd().args(["config", "where"]).assert().success();
}

#[test]
fn test_invalid_subcommand() {
    bassam_cmd().arg("invalid-command").assert().failure();
}

#[test]
fn test_ask_against_dead_backend_prints_error_text_and_exits_ok() {
    // nothing listens on port 1, so the single-shot request is refused
    bassam_cmd()
        .args([
            "--base-url",
            "http://127.0.0.1:1",
            "--no-stream",
            "ask",
            "hello",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("تعذر الحصول على الرد."));
}
