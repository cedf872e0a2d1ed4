use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::{fs, process::Command};
use tempfile::tempdir;

const BIND_TOML: &str = r#"
            [http]
            bind = "127.0.0.1:9999"
        "#;

#[test]
fn file_value_is_used_when_no_env_or_cli() {
    let dir = tempdir().expect("failed to create temp dir for test");
    fs::write(dir.path().join("gateway.toml"), BIND_TOML).unwrap();

    let mut cmd = Command::cargo_bin("emon-gateway").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("GATEWAY__HTTP__BIND")
        .arg("--print-bind");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("127.0.0.1:9999"));
}

#[test]
fn env_override_wins_over_file() {
    let dir = tempdir().expect("failed to create temp dir for test");
    fs::write(dir.path().join("gateway.toml"), BIND_TOML).unwrap();

    let mut cmd = Command::cargo_bin("emon-gateway").unwrap();
    cmd.current_dir(dir.path())
        .env("GATEWAY__HTTP__BIND", "127.0.0.1:7000")
        .arg("--print-bind");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("127.0.0.1:7000"));
}

#[test]
fn cli_override_wins_over_env_and_file() {
    let dir = tempdir().expect("failed to create temp dir for test");
    fs::write(dir.path().join("gateway.toml"), BIND_TOML).unwrap();

    let mut cmd = Command::cargo_bin("emon-gateway").unwrap();
    cmd.current_dir(dir.path())
        .env("GATEWAY__HTTP__BIND", "127.0.0.1:7000")
        .arg("--http-bind")
        .arg("127.0.0.1:6000")
        .arg("--print-bind");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("127.0.0.1:6000"));
}

#[test]
fn empty_database_name_is_rejected() {
    let dir = tempdir().unwrap();

    let mut cmd = Command::cargo_bin("emon-gateway").unwrap();
    cmd.current_dir(dir.path())
        .arg("--db-name")
        .arg("")
        .arg("--print-bind");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("store.database cannot be empty"));
}

#[test]
fn unreachable_store_aborts_startup() {
    let dir = tempdir().unwrap();

    let mut cmd = Command::cargo_bin("emon-gateway").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("RUST_LOG")
        .arg("--http-bind")
        .arg("127.0.0.1:0")
        .arg("--db")
        .arg("http://127.0.0.1:1");

    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("listening on").not())
        .stderr(predicate::str::contains("creating database"));
}

#[test]
fn invalid_store_address_aborts_startup() {
    let dir = tempdir().unwrap();

    let mut cmd = Command::cargo_bin("emon-gateway").unwrap();
    cmd.current_dir(dir.path())
        .arg("--http-bind")
        .arg("127.0.0.1:0")
        .arg("--db")
        .arg("influx:8086");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("invalid store address"));
}
