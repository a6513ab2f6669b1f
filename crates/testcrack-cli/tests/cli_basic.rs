//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own data directory, so no
//! test touches the real config or credentials.

use std::process::Command;
use tempfile::TempDir;

/// Run a CLI command in `home` and return (stdout, stderr, exit code).
fn run_cli(home: &TempDir, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_testcrack"))
        .args(args)
        .env("TESTCRACK_HOME", home.path())
        .env("TESTCRACK_API_URL", "http://127.0.0.1:9/api")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn home() -> TempDir {
    tempfile::tempdir().unwrap()
}

#[test]
fn test_help_lists_commands() {
    let home = home();
    let (stdout, _, code) = run_cli(&home, &["--help"]);
    assert_eq!(code, 0);
    for cmd in ["auth", "assess", "progress", "config", "completions"] {
        assert!(stdout.contains(cmd), "help is missing {cmd}");
    }
}

#[test]
fn test_status_when_signed_out() {
    let home = home();
    let (stdout, _, code) = run_cli(&home, &["auth", "status"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("not signed in"));

    let (stdout, _, code) = run_cli(&home, &["auth", "status", "--json"]);
    assert_eq!(code, 0);
    let status: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(status["authenticated"], false);
}

#[test]
fn test_assessment_requires_sign_in() {
    let home = home();
    let (_, stderr, code) = run_cli(&home, &["assess", "take", "--sample"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Not signed in"));

    let (_, stderr, code) = run_cli(&home, &["progress"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Not signed in"));
}

#[test]
fn test_signed_in_user_cannot_sign_in_again() {
    let home = home();
    std::fs::write(
        home.path().join("credentials.json"),
        r#"{"token": "tok", "user": {"email": "reader@example.com"}}"#,
    )
    .unwrap();

    let (stdout, _, code) = run_cli(&home, &["auth", "status"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("reader@example.com"));

    let (_, stderr, code) = run_cli(
        &home,
        &["auth", "signin", "--email", "a@b.co", "--password", "secret1"],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("log out first"));

    let (stdout, _, code) = run_cli(&home, &["auth", "logout"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("signed out"));
    assert!(!home.path().join("credentials.json").exists());
}

#[test]
fn test_signup_validation_runs_before_network() {
    let home = home();
    let (_, stderr, code) = run_cli(
        &home,
        &["auth", "signup", "--email", "a@b.co", "--password", "abc"],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("at least 6"));

    let (_, stderr, code) = run_cli(
        &home,
        &[
            "auth", "signup", "--email", "a@b.co", "--password", "secret1", "--confirm",
            "secret2",
        ],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("do not match"));
}

#[test]
fn test_unreachable_service_fails_signin() {
    let home = home();
    let (_, stderr, code) = run_cli(
        &home,
        &["auth", "signin", "--email", "a@b.co", "--password", "secret1"],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
    assert!(!home.path().join("credentials.json").exists());
}

#[test]
fn test_config_get_set() {
    let home = home();
    let (stdout, _, code) = run_cli(&home, &["config", "get", "api.base_url"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "http://localhost:5000/api");

    let (_, _, code) = run_cli(&home, &["config", "set", "api.timeout_secs", "10"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(&home, &["config", "get", "api.timeout_secs"]);
    assert_eq!(stdout.trim(), "10");

    let (_, _, code) = run_cli(&home, &["config", "set", "api.timeout_secs", "soon"]);
    assert_eq!(code, 1);

    let (_, stderr, code) = run_cli(&home, &["config", "get", "nope"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key"));

    let (_, _, code) = run_cli(&home, &["config", "reset"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(&home, &["config", "list"]);
    let config: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(config["api"]["timeout_secs"], 30);
}

#[test]
fn test_completions() {
    let home = home();
    let (stdout, _, code) = run_cli(&home, &["completions", "bash"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("testcrack"));
}
