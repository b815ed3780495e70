// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end tests of the `tether` binary against a mock remote store.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;
use common::*;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Starts a reachable mock store answering the health probe.
async fn healthy_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    server
}

/// Runs a blocking binary invocation off the async runtime.
async fn blocking<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
    tokio::task::spawn_blocking(f).await.unwrap()
}

// Offline behavior

#[test]
fn offline_push_is_queued() {
    let temp = init_temp();
    let file = write_doc(&temp, "canvas", r#"{"elements": [1, 2, 3]}"#);

    tether()
        .args(["push", "canvas", &file, "--offline"])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Queued canvas"))
        .stdout(predicate::str::contains("1 pending"));

    let status = status_json(&temp);
    assert_eq!(status["queue"].as_array().unwrap().len(), 1);
    assert_eq!(status["queue"][0]["documentId"], json!("canvas"));
    assert_eq!(status["queue"][0]["retries"], json!(0));
    assert_eq!(status["documents"][0]["syncStatus"], json!("pending"));
}

#[test]
fn offline_env_forces_queueing() {
    let temp = init_temp();
    let file = write_doc(&temp, "canvas", "{}");

    tether()
        .args(["push", "canvas", &file])
        .env("TETHER_OFFLINE", "1")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Queued canvas"));
}

#[test]
fn queue_survives_between_invocations() {
    let temp = init_temp();
    push_offline(&temp, "canvas", r#"{"v": 1}"#);
    push_offline(&temp, "canvas", r#"{"v": 2}"#);
    push_offline(&temp, "notes", r#"{"text": "hi"}"#);

    let status = status_json(&temp);
    let ids: Vec<&str> = status["queue"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["documentId"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["canvas", "canvas", "notes"]);
}

#[test]
fn push_rejects_invalid_json() {
    let temp = init_temp();
    let file = write_doc(&temp, "canvas", "{ not json");

    tether()
        .args(["push", "canvas", &file, "--offline"])
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("json error"));
}

#[test]
fn push_rejects_invalid_document_id() {
    let temp = init_temp();
    let file = write_doc(&temp, "canvas", "{}");

    tether()
        .args(["push", "../canvas", &file, "--offline"])
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid document id"));
}

#[test]
fn push_reads_stdin() {
    let temp = init_temp();

    tether()
        .args(["push", "canvas", "-", "--offline"])
        .write_stdin(r#"{"from": "stdin"}"#)
        .current_dir(temp.path())
        .assert()
        .success();

    tether()
        .args(["show", "canvas", "-o", "json"])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""from":"stdin""#));
}

#[test]
fn pull_offline_fails() {
    let temp = init_temp();

    tether()
        .args(["pull", "canvas", "--offline"])
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("offline"));
}

#[test]
fn flush_offline_keeps_queue() {
    let temp = init_temp();
    push_offline(&temp, "canvas", "{}");

    tether()
        .arg("flush")
        .env("TETHER_OFFLINE", "1")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Offline: 1 change(s) queued"));
}

#[test]
fn clear_discards_queue() {
    let temp = init_temp();
    push_offline(&temp, "canvas", "{}");
    push_offline(&temp, "notes", "{}");

    tether()
        .arg("clear")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared 2 queued change(s)"));

    assert_eq!(status_json(&temp)["queue"], json!([]));
}

#[test]
fn show_text_output() {
    let temp = init_temp();
    push_offline(&temp, "canvas", r#"{"title": "Board"}"#);

    tether()
        .args(["show", "canvas"])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Document: canvas"))
        .stdout(predicate::str::contains("Status: pending (local changes)"))
        .stdout(predicate::str::contains("\"title\": \"Board\""));
}

#[test]
fn show_missing_document() {
    let temp = init_temp();

    tether()
        .args(["show", "canvas"])
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("document not found: canvas"));
}

#[test]
fn push_with_attachment_offline_is_rejected() {
    let temp = init_temp();
    let file = write_doc(&temp, "canvas", "{}");
    std::fs::write(temp.path().join("cover.png"), b"png").unwrap();

    tether()
        .args(["push", "canvas", &file, "--attachment", "cover.png", "--offline"])
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot upload attachment cover.png while offline"));

    let status = status_json(&temp);
    assert_eq!(status["queue"], json!([]));
    assert_eq!(status["documents"], json!([]));
}

#[test]
fn logs_to_sync_log() {
    let temp = init_temp();
    push_offline(&temp, "canvas", "{}");

    let log = std::fs::read_to_string(temp.path().join(".tether/sync.log")).unwrap();
    assert!(log.contains("change queued"));
}

// Online behavior

#[tokio::test(flavor = "multi_thread")]
async fn online_push_syncs() {
    let server = healthy_server().await;
    Mock::given(method("PUT"))
        .and(path("/documents/canvas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    let uri = server.uri();

    let temp = blocking(move || {
        let temp = init_temp_with(&uri);
        let file = write_doc(&temp, "canvas", r#"{"title": "Board", "draft": null}"#);
        tether()
            .args(["push", "canvas", &file])
            .current_dir(temp.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("Pushed canvas"));
        temp
    })
    .await;

    let requests = server.received_requests().await.unwrap();
    let put = requests.iter().find(|r| r.method.as_str() == "PUT").unwrap();
    let body: serde_json::Value = serde_json::from_slice(&put.body).unwrap();
    assert_eq!(body["documentId"], json!("canvas"));
    assert_eq!(body["snapshot"]["content"], json!({"title": "Board"}));
    assert!(body["snapshot"].get("isDirty").is_none());

    let status = blocking(move || status_json(&temp)).await;
    assert_eq!(status["documents"][0]["syncStatus"], json!("synced"));
}

#[tokio::test(flavor = "multi_thread")]
async fn online_push_failure_is_reported_and_not_queued() {
    let server = healthy_server().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "bad canvas"})))
        .mount(&server)
        .await;
    let uri = server.uri();

    blocking(move || {
        let temp = init_temp_with(&uri);
        let file = write_doc(&temp, "canvas", "{}");
        tether()
            .args(["push", "canvas", &file])
            .current_dir(temp.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("push failed: bad canvas"));

        let status = status_json(&temp);
        assert_eq!(status["queue"], json!([]));
        assert_eq!(status["documents"][0]["syncStatus"], json!("error"));
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn flush_sends_queued_changes() {
    let server = healthy_server().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(2)
        .mount(&server)
        .await;
    let uri = server.uri();

    blocking(move || {
        let temp = init_temp_with(&uri);
        push_offline(&temp, "canvas", r#"{"v": 1}"#);
        push_offline(&temp, "notes", r#"{"v": 2}"#);

        tether()
            .arg("flush")
            .current_dir(temp.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("Flushed 2 change(s), 0 remaining"));

        let status = status_json(&temp);
        assert_eq!(status["queue"], json!([]));
        assert_eq!(status["documents"][0]["syncStatus"], json!("synced"));
        assert_eq!(status["documents"][1]["syncStatus"], json!("synced"));
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn pull_fetches_remote_document() {
    let server = healthy_server().await;
    Mock::given(method("GET"))
        .and(path("/documents/canvas"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"content": {"from": "remote"}, "lastModified": 1_000})),
        )
        .mount(&server)
        .await;
    let uri = server.uri();

    blocking(move || {
        let temp = init_temp_with(&uri);
        tether()
            .args(["pull", "canvas"])
            .current_dir(temp.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("Pulled canvas"));

        tether()
            .args(["show", "canvas", "-o", "json"])
            .current_dir(temp.path())
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""from":"remote""#))
            .stdout(predicate::str::contains(r#""syncStatus":"synced""#));
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn pull_missing_remote_document_fails() {
    let server = healthy_server().await;
    let uri = server.uri();

    blocking(move || {
        let temp = init_temp_with(&uri);
        tether()
            .args(["pull", "canvas"])
            .current_dir(temp.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("not found"));
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn status_probes_remote() {
    let server = healthy_server().await;
    let uri = server.uri();

    blocking(move || {
        let temp = init_temp_with(&uri);
        tether()
            .arg("status")
            .current_dir(temp.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("(online)"));
    })
    .await;
}
