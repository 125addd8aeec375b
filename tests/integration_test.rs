// tests/integration_test.rs
use std::process::Command;

use tempfile::TempDir;

const BIN: &str = env!("CARGO_BIN_EXE_release-tool");

#[test]
fn test_release_tool_help() {
    let output = Command::new(BIN)
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("release-tool"));
    assert!(stdout.contains("--no-deps"));
    assert!(stdout.contains("--dry-run"));
}

#[test]
fn test_release_tool_version() {
    let output = Command::new(BIN)
        .arg("--version")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_invalid_part_is_rejected() {
    let output = Command::new(BIN)
        .args(["lbrynet", "sideways"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("sideways"));
}

#[test]
fn test_missing_config_exits_with_error() {
    let dir = TempDir::new().unwrap();
    let output = Command::new(BIN)
        .current_dir(dir.path())
        .args(["lbrynet", "patch", "--config", "nope.yml"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Error loading config"));
}
