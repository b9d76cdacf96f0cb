//! Integration tests for the `biodesk` CLI binary.
//!
//! Argument parsing, help output, completions, and config handling run
//! without a backend. Record commands run against a wiremock server.
#![allow(clippy::unwrap_used)]

use std::path::Path;
use std::process::Output;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `biodesk` binary with env isolation.
///
/// Clears every `BIODESK_*` override and points the config file into
/// `dir` so tests never touch the user's real configuration.
fn biodesk_cmd(dir: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("biodesk");
    cmd.env("BIODESK_CONFIG", dir.join("config.toml"))
        .env("NO_COLOR", "1")
        .env_remove("BIODESK_PROFILE")
        .env_remove("BIODESK_API_URL")
        .env_remove("BIODESK_OUTPUT")
        .env_remove("BIODESK_INSECURE")
        .env_remove("BIODESK_TIMEOUT")
        .env_remove("BIODESK_DEFAULT_PROFILE")
        .env_remove("RUST_LOG");
    cmd
}

/// Same, pointed at a mock backend via `--api-url`.
fn backend_cmd(dir: &Path, server: &MockServer) -> assert_cmd::Command {
    let mut cmd = biodesk_cmd(dir);
    cmd.args(["--api-url", &format!("{}/api", server.uri())]);
    cmd
}

/// Run the binary off the async runtime so the mock server keeps serving.
async fn run(mut cmd: assert_cmd::Command) -> Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

async fn mount_get(server: &MockServer, route: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let dir = tempfile::tempdir().unwrap();
    let output = biodesk_cmd(dir.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = format!("{}{}", stdout(&output), stderr(&output));
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let dir = tempfile::tempdir().unwrap();
    biodesk_cmd(dir.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("biobank")
            .and(predicate::str::contains("patient"))
            .and(predicate::str::contains("liquid-biopsy"))
            .and(predicate::str::contains("dashboard")),
    );
}

#[test]
fn test_version_flag() {
    let dir = tempfile::tempdir().unwrap();
    biodesk_cmd(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("biodesk"));
}

#[test]
fn test_entity_subcommands_exist() {
    let dir = tempfile::tempdir().unwrap();
    biodesk_cmd(dir.path())
        .args(["tumor", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("list")
                .and(predicate::str::contains("get"))
                .and(predicate::str::contains("create"))
                .and(predicate::str::contains("update"))
                .and(predicate::str::contains("delete")),
        );
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    let dir = tempfile::tempdir().unwrap();
    biodesk_cmd(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    let dir = tempfile::tempdir().unwrap();
    biodesk_cmd(dir.path())
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let dir = tempfile::tempdir().unwrap();
    biodesk_cmd(dir.path())
        .arg("devices")
        .assert()
        .failure()
        .stderr(predicate::str::contains("devices"));
}

#[test]
fn test_list_without_backend_config() {
    let dir = tempfile::tempdir().unwrap();
    biodesk_cmd(dir.path())
        .args(["patient", "list"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No backend configured"));
}

#[test]
fn test_invalid_output_format() {
    let dir = tempfile::tempdir().unwrap();
    biodesk_cmd(dir.path())
        .args(["--output", "xml", "patient", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("possible values").or(predicate::str::contains("invalid")));
}

#[test]
fn test_update_requires_changes() {
    let dir = tempfile::tempdir().unwrap();
    biodesk_cmd(dir.path())
        .args(["--api-url", "http://127.0.0.1:9/api", "patient", "update", "N1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("nothing to change"));
}

#[test]
fn test_delete_refuses_without_tty_or_yes() {
    let dir = tempfile::tempdir().unwrap();
    biodesk_cmd(dir.path())
        .args(["--api-url", "http://127.0.0.1:9/api", "patient", "delete", "N1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("requires confirmation"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_show_no_config() {
    // `config show` falls back to the defaults when no file exists.
    let dir = tempfile::tempdir().unwrap();
    biodesk_cmd(dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[defaults]"));
}

#[test]
fn test_config_set_use_and_profiles() {
    let dir = tempfile::tempdir().unwrap();
    biodesk_cmd(dir.path())
        .args(["-p", "lab", "config", "set", "api_url", "http://lab.local/api"])
        .assert()
        .success();
    biodesk_cmd(dir.path())
        .args(["-p", "lab", "config", "set", "page_size", "50"])
        .assert()
        .success();
    biodesk_cmd(dir.path())
        .args(["config", "use", "lab"])
        .assert()
        .success();

    biodesk_cmd(dir.path())
        .args(["config", "profiles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("lab *").and(predicate::str::contains("http://lab.local/api")));

    let output = biodesk_cmd(dir.path())
        .args(["-o", "json", "config", "show"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let shown: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(shown["default_profile"], "lab");
    assert_eq!(shown["profiles"]["lab"]["page_size"], 50);
}

#[test]
fn test_config_rejects_bad_values() {
    let dir = tempfile::tempdir().unwrap();
    biodesk_cmd(dir.path())
        .args(["config", "set", "page_size", "33"])
        .assert()
        .code(2);
    biodesk_cmd(dir.path())
        .args(["config", "use", "missing"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("missing"));
}

// ── Records against a mock backend ──────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_list_plain_filters_and_sorts() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;
    mount_get(
        &server,
        "/api/patients",
        json!([
            { "nhc": "N2", "sex": "M", "birth_date": null },
            { "nhc": "N1", "sex": "F", "birth_date": "1970-01-02" },
            { "nhc": "N3", "sex": "F", "birth_date": null },
        ]),
    )
    .await;

    let mut cmd = backend_cmd(dir.path(), &server);
    cmd.args(["-o", "plain", "patient", "list", "--sort", "nhc", "--desc"]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "N3\nN2\nN1\n");

    let mut cmd = backend_cmd(dir.path(), &server);
    cmd.args(["-o", "plain", "patients", "list", "--where", "sex=F", "--sort", "nhc"]);
    let output = run(cmd).await;
    assert_eq!(stdout(&output), "N1\nN3\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_table_uses_column_labels() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;
    mount_get(&server, "/api/patients", json!([{ "nhc": "N1", "sex": null }])).await;

    let mut cmd = backend_cmd(dir.path(), &server);
    cmd.args(["patient", "list"]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("NHC") && text.contains("Birth Date"), "{text}");
    assert!(text.contains("N1"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_empty_list_prints_empty_state() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;
    mount_get(&server, "/api/biomodels", json!([])).await;

    let mut cmd = backend_cmd(dir.path(), &server);
    cmd.args(["biomodel", "list"]);
    let output = run(cmd).await;
    assert!(output.status.success());
    assert!(stderr(&output).contains("No data found"));
    assert!(stdout(&output).is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_missing_record_exits_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tumors/BB-9"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "Tumor not found" })))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = backend_cmd(dir.path(), &server);
    cmd.args(["tumor", "get", "BB-9"]);
    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(4));
    let text = stderr(&output);
    assert!(text.contains("Tumor 'BB-9' not found"), "{text}");
    assert!(text.contains("tumor list"), "{text}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_with_related_lists_children() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;
    mount_get(&server, "/api/patients/N1", json!({ "nhc": "N1", "sex": "F" })).await;
    mount_get(
        &server,
        "/api/tumors",
        json!([
            { "biobank_code": "BB-01", "patient_nhc": "N1" },
            { "biobank_code": "BB-02", "patient_nhc": "N2" },
        ]),
    )
    .await;

    let mut cmd = backend_cmd(dir.path(), &server);
    cmd.args(["-o", "json", "patient", "get", "N1", "--related"]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", stderr(&output));
    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(doc["record"]["nhc"], "N1");
    let tumors = doc["related"]["tumors"].as_array().unwrap();
    assert_eq!(tumors.len(), 1);
    assert_eq!(tumors[0]["biobank_code"], "BB-01");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_create_posts_form_payload() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/patients"))
        .and(body_json(json!({ "nhc": "N2", "sex": "F", "birth_date": null })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({ "nhc": "N2", "sex": "F", "birth_date": null })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = backend_cmd(dir.path(), &server);
    cmd.args(["-o", "plain", "patient", "create", "--set", "nhc=N2", "--set", "sex=F"]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "N2\n");
    assert!(stderr(&output).contains("Created Patient N2"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_create_rejects_unknown_field_without_request() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;

    let mut cmd = backend_cmd(dir.path(), &server);
    cmd.args(["patient", "create", "--set", "nhc=N2", "--set", "colour=blue"]);
    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("colour"));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_update_patches_editable_fields() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;
    mount_get(&server, "/api/patients/N1", json!({ "nhc": "N1", "sex": "M" })).await;
    Mock::given(method("PATCH"))
        .and(path("/api/patients/N1"))
        .and(body_json(json!({ "sex": "F", "birth_date": "1970-01-02" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "nhc": "N1", "sex": "F", "birth_date": "1970-01-02" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = backend_cmd(dir.path(), &server);
    cmd.args([
        "-o", "json", "patient", "update", "N1", "--set", "sex=F", "--set", "birth_date=1970-01-02",
    ]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", stderr(&output));
    let updated: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(updated["sex"], "F");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delete_with_yes_sends_delete() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/patients/N1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = backend_cmd(dir.path(), &server);
    cmd.args(["--yes", "patient", "delete", "N1"]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stderr(&output).contains("Deleted Patient N1"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_dashboard_counts_each_collection() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;
    mount_get(&server, "/api/patients", json!([{ "nhc": "N1" }, { "nhc": "N2" }])).await;
    for endpoint in ["tumors", "liquid-biopsies", "biomodels", "passages", "trials"] {
        mount_get(&server, &format!("/api/{endpoint}"), json!([])).await;
    }

    let mut cmd = backend_cmd(dir.path(), &server);
    cmd.args(["-o", "plain", "dashboard"]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.starts_with("patients\t2\ntumors\t0\n"), "{text}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_health_reports_status() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;
    mount_get(&server, "/api/health", json!({ "status": "ok" })).await;

    let mut cmd = backend_cmd(dir.path(), &server);
    cmd.args(["-o", "plain", "health"]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "ok\n");
}
