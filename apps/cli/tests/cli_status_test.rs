//! Integration tests for the `hearth` binary against an absent Ollama server.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Address with nothing listening on it.
fn closed_address() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// A `hearth` command isolated from the user's config file and environment.
fn hearth(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("hearth").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("OLLAMA_HOST")
        .arg("--config")
        .arg(temp_dir.path().join("missing.toml"))
        .arg("--base-url")
        .arg(closed_address());
    cmd
}

#[test]
fn test_help() {
    let mut cmd = Command::cargo_bin("hearth").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("models"));
}

#[test]
fn test_status_json_empty_when_unreachable() {
    let temp_dir = TempDir::new().unwrap();
    hearth(&temp_dir)
        .arg("status")
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::diff("[]\n"));
}

#[test]
fn test_status_table_reports_unreachable() {
    let temp_dir = TempDir::new().unwrap();
    hearth(&temp_dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Ollama is not reachable"));
}

#[test]
fn test_ping_fails_when_unreachable() {
    let temp_dir = TempDir::new().unwrap();
    hearth(&temp_dir)
        .arg("ping")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not running"));
}

#[test]
fn test_models_list_empty_when_unreachable() {
    let temp_dir = TempDir::new().unwrap();
    hearth(&temp_dir)
        .args(["models", "list", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::diff("[]\n"));
}

#[test]
fn test_models_check_reports_not_loaded() {
    let temp_dir = TempDir::new().unwrap();
    hearth(&temp_dir)
        .args(["models", "check", "phi3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("is not loaded"))
        .stdout(predicate::str::contains("not reachable"));
}

#[test]
fn test_models_load_fails_when_unreachable() {
    let temp_dir = TempDir::new().unwrap();
    hearth(&temp_dir)
        .args(["models", "load", "phi3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load 'phi3'"));
}

#[test]
fn test_models_unload_always_succeeds() {
    let temp_dir = TempDir::new().unwrap();
    hearth(&temp_dir)
        .args(["models", "unload", "phi3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no memory was freed"));
}

#[test]
fn test_watch_stops_after_iterations() {
    let temp_dir = TempDir::new().unwrap();
    hearth(&temp_dir)
        .args(["watch", "--interval", "1", "-n", "2", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::diff("[]\n[]\n"));
}

#[test]
fn test_watch_rejects_zero_interval() {
    let temp_dir = TempDir::new().unwrap();
    hearth(&temp_dir)
        .args(["watch", "--interval", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Interval must be greater than 0"));
}

#[test]
fn test_invalid_config_file_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "[cache]\nfreshness_window_secs = 0\n").unwrap();

    let mut cmd = Command::cargo_bin("hearth").unwrap();
    cmd.env_remove("OLLAMA_HOST")
        .arg("--config")
        .arg(&path)
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}
