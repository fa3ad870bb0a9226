//! Integration tests for logging configuration of the binary.
//!
//! Runs the CLI as a subprocess so the global subscriber is installed fresh each time.

use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn forge(temp_dir: &TempDir) -> Command {
    let home = temp_dir.path().join("home");
    let config_home = temp_dir.path().join("config-home");
    fs::create_dir_all(&home).unwrap();
    fs::create_dir_all(&config_home).unwrap();

    let mut command = Command::new(env!("CARGO_BIN_EXE_exercise-forge"));
    command
        .env("HOME", home.as_os_str())
        .env("XDG_CONFIG_HOME", config_home.as_os_str())
        .env_remove("FORGE_LOG")
        .env_remove("FORGE_LOG_OUTPUT")
        .env_remove("FORGE_LOG_FORMAT")
        .arg("--workspace")
        .arg(temp_dir.path());
    command
}

#[test]
fn test_default_logging_goes_to_stderr_not_stdout() {
    let temp_dir = TempDir::new().unwrap();
    let output = forge(&temp_dir)
        .args(["config", "validate"])
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "config validate should succeed: stderr={:?}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), "Configuration is valid");
    assert!(String::from_utf8_lossy(&output.stderr).contains("exercise-forge starting"));
}

#[test]
fn test_file_output_writes_json_lines() {
    let temp_dir = TempDir::new().unwrap();
    let log_file = temp_dir.path().join("logs").join("forge.log");
    let output = forge(&temp_dir)
        .arg("--log-output")
        .arg("file")
        .arg("--log-format")
        .arg("json")
        .arg("--log-file")
        .arg(&log_file)
        .args(["config", "show"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let content = fs::read_to_string(&log_file).unwrap();
    let first: serde_json::Value = serde_json::from_str(content.lines().next().unwrap()).unwrap();
    assert_eq!(first["fields"]["message"], "exercise-forge starting");
    assert!(output.stderr.is_empty());
}

#[test]
fn test_quiet_suppresses_logging() {
    let temp_dir = TempDir::new().unwrap();
    let output = forge(&temp_dir)
        .arg("--quiet")
        .args(["config", "validate"])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(output.stderr.is_empty());
}

#[test]
fn test_invalid_workspace_config_fails_validation() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join("config")).unwrap();
    fs::write(
        temp_dir.path().join("config").join("config.toml"),
        "[generation]\nmax_attempts = 0\n",
    )
    .unwrap();

    let output = forge(&temp_dir)
        .arg("--quiet")
        .args(["config", "validate"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Generation:"));
}
