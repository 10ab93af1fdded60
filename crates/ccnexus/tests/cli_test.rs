//! Integration tests for the `ccnexus` CLI binary.
//!
//! Argument handling and local validation run without any host; the rest
//! run the binary against a wiremock stand-in for the ccNexus admin API.
#![allow(clippy::unwrap_used)]

use std::path::Path;
use std::process::Output;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

const NO_HOME: &str = "/tmp/ccnexus-cli-test-nonexistent";

/// Build a [`Command`] for the `ccnexus` binary with env isolation.
///
/// Clears all `CCNEXUS_*` env vars and points config directories at
/// `home` so tests never touch the user's real configuration.
fn ccnexus_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("ccnexus");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home)
        .env_remove("CCNEXUS_PROFILE")
        .env_remove("CCNEXUS_HOST")
        .env_remove("CCNEXUS_TOKEN")
        .env_remove("CCNEXUS_OUTPUT")
        .env_remove("CCNEXUS_INSECURE")
        .env_remove("CCNEXUS_TIMEOUT")
        .env_remove("CCNEXUS_API_KEY")
        .env_remove("RUST_LOG");
    cmd
}

fn isolated() -> assert_cmd::Command {
    ccnexus_cmd(Path::new(NO_HOME))
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Run the binary off the async runtime so the mock host keeps serving.
async fn run_against(server: &MockServer, args: &[&str]) -> Output {
    let mut cmd = isolated();
    cmd.arg("--host").arg(server.uri()).args(args);
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

fn directory() -> Value {
    json!({
        "port": 3000,
        "endpoints": [
            { "name": "A", "apiUrl": "https://a.example", "apiKey": "sk-abcdef1234", "enabled": true },
            { "name": "B", "apiUrl": "https://b.example", "apiKey": "sk-b", "enabled": false },
        ]
    })
}

async fn host() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(directory()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalRequests": 10,
            "endpoints": {
                "A": { "requests": 10, "errors": 1, "inputTokens": 500, "outputTokens": 1500 }
            }
        })))
        .mount(&server)
        .await;
    server
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = isolated().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    isolated().arg("--help").assert().success().stdout(
        predicate::str::contains("ccNexus")
            .and(predicate::str::contains("endpoints"))
            .and(predicate::str::contains("stats"))
            .and(predicate::str::contains("port")),
    );
}

#[test]
fn test_version_flag() {
    isolated()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ccnexus"));
}

#[test]
fn test_completions_zsh() {
    isolated()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_invalid_output_format() {
    isolated()
        .args(["-o", "xml", "stats"])
        .assert()
        .failure()
        .code(2);
}

// ── Local failures (no host contacted) ──────────────────────────────

#[test]
fn test_no_host_configured() {
    isolated()
        .args(["endpoints", "list"])
        .assert()
        .code(6)
        .stderr(predicate::str::contains("No ccNexus host configured"));
}

#[test]
fn test_blank_name_rejected_before_connecting() {
    // Port 9 is discard; the command must fail before trying it.
    isolated()
        .args([
            "--host",
            "http://127.0.0.1:9",
            "endpoints",
            "add",
            "--name",
            "  ",
            "--api-url",
            "https://c.example",
            "--api-key",
            "sk-c",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("name"));
}

#[test]
fn test_port_out_of_range_rejected() {
    isolated()
        .args(["--host", "http://127.0.0.1:9", "port", "set", "70000"])
        .assert()
        .code(2);
}

#[test]
fn test_update_needs_a_field() {
    isolated()
        .args(["--host", "http://127.0.0.1:9", "endpoints", "update", "0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("nothing to change"));
}

#[test]
fn test_unreachable_host_exit_code() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    isolated()
        .args(["--host", &format!("http://{addr}"), "stats"])
        .assert()
        .code(3);
}

// ── Against a host ──────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_list_plain_prints_names() {
    let server = host().await;
    let output = run_against(&server, &["endpoints", "list", "-o", "plain"]).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "A\nB");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_json_masks_keys() {
    let server = host().await;
    let output = run_against(&server, &["endpoints", "list", "-o", "json"]).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let rows: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(rows[0]["maskedKey"], "****1234");
    assert_eq!(rows[1]["maskedKey"], "***");
    assert_eq!(rows[0]["totalTokensDisplay"], "2.0K");
    assert!(!String::from_utf8_lossy(&output.stdout).contains("sk-abcdef1234"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_shows_detail_lines() {
    let server = host().await;
    let output = run_against(&server, &["endpoints", "get", "A", "--color", "never"]).await;

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Requests: 10 | Errors: 1"), "{stdout}");
    assert!(stdout.contains("Tokens: 2.0K (In: 500, Out: 1.5K)"), "{stdout}");
    assert!(stdout.contains("✅ enabled"), "{stdout}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_stats_header() {
    let server = host().await;
    let output = run_against(&server, &["stats"]).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Total requests: 10"), "{stdout}");
    assert!(stdout.contains("Port: 3000"), "{stdout}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_port_set_mentions_restart() {
    let server = host().await;
    Mock::given(method("PUT"))
        .and(path("/api/port"))
        .and(body_json(json!({ "port": 4000 })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_against(&server, &["port", "set", "4000"]).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Restart ccNexus"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_disable_by_name() {
    let server = host().await;
    Mock::given(method("POST"))
        .and(path("/api/endpoints/0/toggle"))
        .and(body_json(json!({ "enabled": false })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_against(&server, &["endpoints", "disable", "A"]).await;
    assert!(output.status.success(), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_update_keeps_unspecified_fields() {
    let server = host().await;
    Mock::given(method("PUT"))
        .and(path("/api/endpoints/0"))
        .and(body_json(json!({
            "name": "A",
            "apiUrl": "https://a2.example",
            "apiKey": "sk-abcdef1234"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_against(
        &server,
        &["endpoints", "update", "A", "--api-url", "https://a2.example"],
    )
    .await;
    assert!(output.status.success(), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_add_reports_host_message() {
    let server = host().await;
    Mock::given(method("POST"))
        .and(path("/api/endpoints"))
        .respond_with(ResponseTemplate::new(400).set_body_string("endpoint 'A' already exists"))
        .mount(&server)
        .await;

    let output = run_against(
        &server,
        &[
            "endpoints",
            "add",
            "--name",
            "A",
            "--api-url",
            "https://a.example",
            "--api-key",
            "sk-a",
        ],
    )
    .await;

    assert_eq!(output.status.code(), Some(4));
    assert!(String::from_utf8_lossy(&output.stderr).contains("endpoint 'A' already exists"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_remove_requires_confirmation_when_not_interactive() {
    let server = host().await;
    Mock::given(method("DELETE"))
        .and(path("/api/endpoints/1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let output = run_against(&server, &["endpoints", "remove", "B"]).await;
    assert_eq!(output.status.code(), Some(2));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_remove_with_yes() {
    let server = host().await;
    Mock::given(method("DELETE"))
        .and(path("/api/endpoints/1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_against(&server, &["endpoints", "remove", "B", "--yes"]).await;
    assert!(output.status.success(), "{}", combined_output(&output));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_set_then_show() {
    let home = tempfile::tempdir().unwrap();

    ccnexus_cmd(home.path())
        .args(["config", "set", "host", "http://127.0.0.1:3000"])
        .assert()
        .success();
    ccnexus_cmd(home.path())
        .args(["config", "set", "token", "super-secret"])
        .assert()
        .success();

    ccnexus_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("host = \"http://127.0.0.1:3000\"")
                .and(predicate::str::contains("token = \"****\""))
                .and(predicate::str::contains("super-secret").not()),
        );
}

#[test]
fn test_config_set_rejects_bad_host() {
    let home = tempfile::tempdir().unwrap();
    ccnexus_cmd(home.path())
        .args(["config", "set", "host", "ftp://nope"])
        .assert()
        .code(6);
}

#[test]
fn test_config_use_unknown_profile() {
    let home = tempfile::tempdir().unwrap();
    ccnexus_cmd(home.path())
        .args(["config", "use", "work"])
        .assert()
        .code(6)
        .stderr(predicate::str::contains("work"));
}
