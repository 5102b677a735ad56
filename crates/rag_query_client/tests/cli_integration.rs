//! Integration tests for the rag-query binary.
//! Uses assert_cmd to run the binary, a real temp config, and an in-process
//! HTTP server. No mocks.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use predicates::prelude::*;
use serde_json::{json, Value};
use std::io::Write as _;

/// Serve `app` on a free port from its own thread; returns the endpoint URL.
fn spawn_test_server(app: Router) -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            axum::serve(listener, app).await.unwrap();
        });
    });
    format!("http://{}/api/v1/query/", addr)
}

/// Answers every query with "echo: <query_text>" and two sources.
fn echo_server() -> String {
    spawn_test_server(Router::new().route(
        "/api/v1/query/",
        post(|Json(body): Json<Value>| async move {
            let question = body["query_text"].as_str().unwrap_or_default().to_string();
            Json(json!({
                "response": format!("echo: {}", question),
                "sources": ["/docs/a.pdf:1:0", "/docs/b.pdf:4:2"]
            }))
        }),
    ))
}

fn failing_server() -> String {
    spawn_test_server(Router::new().route(
        "/api/v1/query/",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "detail": "Error during query processing: boom" })),
            )
        }),
    ))
}

/// A URL where nothing is listening.
fn dead_endpoint() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    format!("http://127.0.0.1:{}/api/v1/query/", port)
}

/// Write a minimal YAML config to a temp file pointing at `url`.
fn write_config(dir: &tempfile::TempDir, url: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.yaml");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(f, "endpoint:\n  url: {}\n  timeout_secs: 5", url).unwrap();
    path
}

fn rag_query(dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::from(cargo_bin_cmd!("rag-query"));
    cmd.env_remove("RAG_QUERY_CONFIG")
        .env_remove("RUST_LOG")
        .env("HOME", dir.path())
        .env("USERPROFILE", dir.path());
    cmd
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn prints_answer_and_sources() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, &echo_server());

    rag_query(&dir)
        .arg("--config")
        .arg(&config_path)
        .arg("What is the answer?")
        .assert()
        .success()
        .stdout(predicate::str::contains("Response:"))
        .stdout(predicate::str::contains("echo: What is the answer?"))
        .stdout(predicate::str::contains("/docs/a.pdf:1:0"))
        .stdout(predicate::str::contains("/docs/b.pdf:4:2"))
        .stderr(predicate::str::contains("Loading..."));
}

#[test]
fn reads_question_from_stdin_with_config_env_var() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, &echo_server());

    rag_query(&dir)
        .env("RAG_QUERY_CONFIG", &config_path)
        .write_stdin("What is the answer?\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("echo: What is the answer?"));
}

#[test]
fn submits_each_stdin_line_in_turn() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, &echo_server());

    let assert = rag_query(&dir)
        .arg("--config")
        .arg(&config_path)
        .write_stdin("first question\n\n   \nsecond question\n")
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let first = stdout.find("echo: first question").expect("first answer");
    let second = stdout.find("echo: second question").expect("second answer");
    assert!(first < second, "answers should come out in order");
    assert_eq!(stdout.matches("Response:").count(), 2);
}

#[test]
fn endpoint_flag_overrides_config() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, &dead_endpoint());

    rag_query(&dir)
        .arg("--config")
        .arg(&config_path)
        .arg("--endpoint")
        .arg(echo_server())
        .arg("hello")
        .assert()
        .success()
        .stdout(predicate::str::contains("echo: hello"));
}

#[test]
fn server_down_shows_fixed_error() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, &dead_endpoint());

    rag_query(&dir)
        .arg("--config")
        .arg(&config_path)
        .write_stdin("hello\n")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Response:").not())
        .stderr(predicate::str::contains("Error fetching data from the server."));
}

#[test]
fn server_error_detail_is_not_shown() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, &failing_server());

    rag_query(&dir)
        .arg("--config")
        .arg(&config_path)
        .arg("hello")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error fetching data from the server."))
        .stderr(predicate::str::contains("500").not())
        .stderr(predicate::str::contains("boom").not());
}

#[test]
fn unreadable_stdin_line_stops_with_an_error() {
    let dir = tempfile::tempdir().unwrap();

    rag_query(&dir)
        .arg("--endpoint")
        .arg(echo_server())
        .write_stdin(b"first\n\xff\xfe\nthird\n".to_vec())
        .assert()
        .failure()
        .stdout(predicate::str::contains("echo: first"))
        .stdout(predicate::str::contains("third").not())
        .stderr(predicate::str::contains("failed to read stdin"));
}

#[test]
fn no_question_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, &dead_endpoint());

    rag_query(&dir)
        .arg("--config")
        .arg(&config_path)
        .write_stdin("\n  \n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no question provided"));
}

#[test]
fn missing_explicit_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();

    rag_query(&dir)
        .arg("--config")
        .arg(dir.path().join("nope.yaml"))
        .arg("hello")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load config"));
}

#[test]
fn missing_default_config_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();

    // No ~/.rag-query/config.yaml under the temp HOME; only the flag matters.
    rag_query(&dir)
        .arg("--endpoint")
        .arg(echo_server())
        .arg("hello")
        .assert()
        .success()
        .stdout(predicate::str::contains("echo: hello"));
}

#[test]
fn init_config_writes_effective_config() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("nested").join("config.yaml");

    rag_query(&dir)
        .env("RAG_QUERY_CONFIG", &config_path)
        .arg("--endpoint")
        .arg("http://rag.internal:9000/api/v1/query/")
        .arg("--init-config")
        .assert()
        .success();

    let contents = std::fs::read_to_string(&config_path).unwrap();
    assert!(contents.contains("http://rag.internal:9000/api/v1/query/"));
    assert!(contents.contains("timeout_secs: 120"));
}
