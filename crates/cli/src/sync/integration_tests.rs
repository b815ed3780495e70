// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Integration tests for the sync module.
//!
//! These tests run the sync manager against a mock HTTP server through the
//! real network client and HTTP remote:
//! - Online push with and without network-level retries
//! - Offline queueing, reconnection and flush
//! - Queue durability across restarts
//! - Pull with conflict resolution

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::connectivity::ManualConnectivity;
use super::document::DocumentStore;
use super::manager::{SyncConfig, SyncManager};
use super::network::{Backoff, ClientConfig, NetworkClient};
use super::queue::{DurableQueue, JsonlStorage};
use super::remote::HttpRemote;
use super::test_helpers::{make_local, wait_until};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;
use tether_core::{ManualClock, SyncStatus};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_backoff() -> Backoff {
    Backoff {
        base: Duration::from_millis(1),
        max_jitter: Duration::ZERO,
    }
}

fn http_remote(server: &MockServer) -> HttpRemote {
    let client = NetworkClient::new(ClientConfig {
        timeout: Duration::from_secs(5),
        backoff: fast_backoff(),
    })
    .unwrap();
    HttpRemote::new(client, &server.uri())
}

fn manager(
    server: &MockServer,
    conn: &Arc<ManualConnectivity>,
    dir: &Path,
    push_retries: u32,
) -> Arc<SyncManager> {
    SyncManager::create(
        http_remote(server),
        conn.clone(),
        DurableQueue::open(JsonlStorage::new(&dir.join("queue.jsonl"))),
        DocumentStore::open(&dir.join("documents")),
        Arc::new(ManualClock::new(50_000)),
        SyncConfig {
            max_retries: 5,
            push_retries,
            backoff: fast_backoff(),
        },
    )
}

async fn mount_flaky_put(server: &MockServer) {
    Mock::given(method("PUT"))
        .and(path("/documents/canvas"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "db unavailable"})))
        .up_to_n_times(1)
        .mount(server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/documents/canvas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"syncedAt": 49_999})))
        .mount(server)
        .await;
}

#[tokio::test]
async fn online_push_retried_when_configured() {
    let server = MockServer::start().await;
    mount_flaky_put(&server).await;
    let dir = tempdir().unwrap();
    let conn = Arc::new(ManualConnectivity::new(true));
    let manager = manager(&server, &conn, dir.path(), 1);

    let result = manager.push("canvas", &make_local(40_000), None).await;

    assert!(result.success);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
    assert_eq!(manager.document("canvas").unwrap().sync_status, SyncStatus::Synced);
}

#[tokio::test]
async fn online_push_failure_surfaces_without_queueing() {
    let server = MockServer::start().await;
    mount_flaky_put(&server).await;
    let dir = tempdir().unwrap();
    let conn = Arc::new(ManualConnectivity::new(true));
    let manager = manager(&server, &conn, dir.path(), 0);

    let result = manager.push("canvas", &make_local(40_000), None).await;

    assert!(!result.success);
    assert!(!result.queued);
    assert!(result.error.unwrap().contains("db unavailable"));
    assert_eq!(manager.queue_len(), 0);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
    assert_eq!(manager.document("canvas").unwrap().sync_status, SyncStatus::Error);
}

#[tokio::test]
async fn offline_push_flushed_on_reconnect() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/documents/canvas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    let dir = tempdir().unwrap();
    let conn = Arc::new(ManualConnectivity::new(false));
    let manager = manager(&server, &conn, dir.path(), 0);

    let result = manager.push("canvas", &make_local(40_000), None).await;
    assert!(result.queued);
    assert_eq!(manager.queue_len(), 1);

    conn.set_online(true);

    let watched = Arc::clone(&manager);
    assert!(wait_until(Duration::from_secs(5), move || watched.queue_len() == 0).await);
    let local = manager.document("canvas").unwrap();
    assert_eq!(local.sync_status, SyncStatus::Synced);
    assert!(!local.is_dirty);
}

#[tokio::test]
async fn queued_changes_survive_restart_and_flush_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    let dir = tempdir().unwrap();

    {
        let conn = Arc::new(ManualConnectivity::new(false));
        let manager = manager(&server, &conn, dir.path(), 0);
        manager.push("canvas", &make_local(10_000), None).await;
        manager.push("notes", &make_local(20_000), None).await;
        manager.push("canvas", &make_local(30_000), None).await;
    }

    let conn = Arc::new(ManualConnectivity::new(false));
    let manager = manager(&server, &conn, dir.path(), 0);
    assert_eq!(manager.queue_len(), 3);
    manager.destroy();
    conn.set_online(true);

    let report = manager.flush().await;
    assert_eq!(report.synced, 3);

    let requests = server.received_requests().await.unwrap();
    let sent: Vec<(String, u64)> = requests
        .iter()
        .map(|r| {
            let body: serde_json::Value = serde_json::from_slice(&r.body).unwrap();
            (
                body["documentId"].as_str().unwrap().to_string(),
                body["snapshot"]["lastModified"].as_u64().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        sent,
        vec![
            ("canvas".to_string(), 10_000),
            ("notes".to_string(), 20_000),
            ("canvas".to_string(), 30_000),
        ]
    );
}

#[tokio::test]
async fn pull_resolves_against_dirty_local() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/documents/canvas"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"content": {"from": "remote"}, "lastModified": 200})),
        )
        .mount(&server)
        .await;
    let dir = tempdir().unwrap();
    let conn = Arc::new(ManualConnectivity::new(true));
    let manager = manager(&server, &conn, dir.path(), 0);

    manager.documents().put("canvas", make_local(100));
    assert!(manager.pull("canvas").await.success);
    assert_eq!(manager.document("canvas").unwrap().content, json!({"from": "remote"}));

    manager.documents().put("canvas", make_local(300));
    assert!(manager.pull("canvas").await.success);
    let local = manager.document("canvas").unwrap();
    assert_eq!(local.last_modified, 300);
    assert_eq!(local.sync_status, SyncStatus::Synced);
}

#[tokio::test]
async fn pull_missing_document_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let dir = tempdir().unwrap();
    let conn = Arc::new(ManualConnectivity::new(true));
    let manager = manager(&server, &conn, dir.path(), 0);

    let result = manager.pull("canvas").await;
    assert!(!result.success);
    assert!(manager.document("canvas").is_none());
}
