//! `preboot config` against a real file.

#![allow(clippy::expect_used, deprecated)]

use predicates::prelude::*;

use crate::support::{preboot, stdout_json};

#[test]
fn test_config_path_honours_env_override() {
    let home = tempfile::tempdir().expect("tempdir");
    let path = home.path().join("elsewhere.yaml");
    preboot(&home)
        .env("PREBOOT_CONFIG", &path)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("elsewhere.yaml"));
}

#[test]
fn test_config_path_defaults_under_home() {
    let home = tempfile::tempdir().expect("tempdir");
    let output = preboot(&home)
        .args(["--json", "config", "path"])
        .output()
        .expect("run");
    let path = stdout_json(&output)["path"]
        .as_str()
        .expect("path string")
        .to_string();
    assert!(path.ends_with(".preboot/config.yaml"), "got {path}");
}

#[test]
fn test_config_set_persists_and_show_reads_back() {
    let home = tempfile::tempdir().expect("tempdir");
    let path = home.path().join("config.yaml");

    preboot(&home)
        .env("PREBOOT_CONFIG", &path)
        .args(["config", "set", "ready.attempts", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set ready.attempts = 7"));

    let content = std::fs::read_to_string(&path).expect("config written");
    assert!(content.contains("attempts: 7"), "got:\n{content}");

    let output = preboot(&home)
        .env("PREBOOT_CONFIG", &path)
        .args(["--json", "config", "show"])
        .output()
        .expect("run");
    assert_eq!(stdout_json(&output)["ready"]["attempts"], 7);
}

#[test]
fn test_config_set_unknown_key_fails_without_writing() {
    let home = tempfile::tempdir().expect("tempdir");
    let path = home.path().join("config.yaml");

    let output = preboot(&home)
        .env("PREBOOT_CONFIG", &path)
        .args(["--json", "config", "set", "security.level", "high"])
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout_json(&output)["code"], "CONFIG_ERROR");
    assert!(!path.exists());
}

#[test]
fn test_config_set_rejects_invalid_base_url() {
    let home = tempfile::tempdir().expect("tempdir");
    let path = home.path().join("config.yaml");
    preboot(&home)
        .env("PREBOOT_CONFIG", &path)
        .args(["config", "set", "service.base_url", "localhost"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error:"));
    assert!(!path.exists());
}

#[test]
fn test_config_show_lists_environment() {
    let home = tempfile::tempdir().expect("tempdir");
    preboot(&home)
        .env("PREBOOT_CONFIG", home.path().join("c.yaml"))
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("service.base_url:"))
        .stdout(predicate::str::contains("PREBOOT_BASE_URL"));
}
