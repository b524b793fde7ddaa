//! CLI end-to-end tests for hoct.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_conf(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("write config");
    path
}

fn hoct() -> Command {
    Command::cargo_bin("hoct").expect("binary built")
}

#[test]
fn test_help() {
    hoct()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("hoct"));
}

#[test]
fn test_version() {
    hoct()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("hoct"));
}

#[test]
fn test_valid_file_prints_resolved_tree() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_conf(&dir, "app.conf", "a = 1\nb = ${a}\n");

    hoct()
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("{a : 1, b : 1}"));
}

#[test]
fn test_get_single_value() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_conf(&dir, "app.conf", "server { port = 8080 }\n");

    hoct()
        .arg(&path)
        .args(["--get", "server.port"])
        .assert()
        .success()
        .stdout(predicate::str::contains("8080"));
}

#[test]
fn test_get_missing_path_fails() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_conf(&dir, "app.conf", "a = 1\n");

    hoct()
        .arg(&path)
        .args(["--get", "nope"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("path not found"));
}

#[test]
fn test_quiet_prints_nothing_on_success() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_conf(&dir, "app.conf", "a = 1\n");

    hoct()
        .arg(&path)
        .arg("--quiet")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_invalid_config_exits_nonzero() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_conf(&dir, "bad.conf", "a = ${missing.reference}\n");

    hoct()
        .arg(&path)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("invalid configuration"));
}

#[test]
fn test_syntax_error_exits_nonzero() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_conf(&dir, "bad.conf", "arr = [1,,2]\n");

    hoct().arg(&path).assert().failure().code(1);
}

#[test]
fn test_missing_file_exits_nonzero() {
    hoct()
        .arg("/definitely/not/here.conf")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_include_next_to_source() {
    let dir = TempDir::new().expect("tempdir");
    write_conf(&dir, "base.conf", "shared = 1\n");
    let path = write_conf(&dir, "main.conf", "include \"base.conf\"\nown = 2\n");

    hoct()
        .arg(&path)
        .args(["--get", "shared"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1"));
}

#[test]
fn test_required_include_missing_is_fatal() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_conf(&dir, "main.conf", "include required(file(\"gone.conf\"))\n");

    hoct()
        .arg(&path)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("required include"));
}

#[test]
fn test_tokens_dump() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_conf(&dir, "app.conf", "a = 1\n");

    hoct()
        .arg(&path)
        .arg("--tokens")
        .assert()
        .success()
        .stdout(predicate::str::contains("'a'"))
        .stdout(predicate::str::contains("end of input"));
}

#[test]
fn test_usage_error_is_exit_code_two() {
    hoct().assert().failure().code(2);
}
