//! CLI smoke tests for the network-free subcommands, run against the
//! compiled `dqa` binary with an isolated storage root.

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

fn dqa_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("dqa");
    path
}

fn run_dqa(data_dir: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = dqa_binary();
    let output = Command::new(&binary)
        .arg("--data-dir")
        .arg(data_dir)
        .args(args)
        .env_remove("GROQ_API_KEY")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run dqa binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_config_show_creates_defaults() {
    let tmp = TempDir::new().unwrap();

    let (stdout, stderr, success) = run_dqa(tmp.path(), &["config", "show"]);
    assert!(success, "config show failed: {}", stderr);
    assert!(stdout.contains("llama-3.3-70b-versatile"));
    assert!(tmp.path().join("config.json").exists());
    assert!(tmp.path().join("sessions").is_dir());
    assert!(tmp.path().join("vectors").is_dir());
}

#[test]
fn test_config_set_persists_and_validates() {
    let tmp = TempDir::new().unwrap();

    let (_, _, success) = run_dqa(tmp.path(), &["config", "set", "top_k", "5"]);
    assert!(success);

    let (stdout, _, _) = run_dqa(tmp.path(), &["config", "show"]);
    assert!(stdout.contains("\"top_k\": 5"));

    // overlap >= size is a configuration error, not a silent write.
    let (_, stderr, success) = run_dqa(tmp.path(), &["config", "set", "chunk_overlap", "900"]);
    assert!(!success);
    assert!(stderr.contains("chunk_overlap"));

    let (stdout, _, _) = run_dqa(tmp.path(), &["config", "show"]);
    assert!(stdout.contains("\"chunk_overlap\": 50"));
}

#[test]
fn test_sessions_list_empty() {
    let tmp = TempDir::new().unwrap();

    let (stdout, _, success) = run_dqa(tmp.path(), &["sessions", "list"]);
    assert!(success);
    assert!(stdout.contains("No saved sessions."));
}

#[test]
fn test_sessions_show_missing_fails() {
    let tmp = TempDir::new().unwrap();

    let (_, stderr, success) = run_dqa(tmp.path(), &["sessions", "show", "nope"]);
    assert!(!success);
    assert!(stderr.contains("not found"));
}

#[test]
fn test_ask_without_api_key_is_a_config_error() {
    let tmp = TempDir::new().unwrap();

    let (_, stderr, success) = run_dqa(tmp.path(), &["ask", "does this work?"]);
    assert!(!success);
    assert!(stderr.contains("GROQ"));
}
