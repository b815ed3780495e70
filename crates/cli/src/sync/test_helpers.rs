// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for sync module tests.

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use serde_json::json;
use tether_core::{AttachmentRef, DocumentSnapshot, QueuedChange, RemoteSnapshot};

use super::network::NetworkError;
use super::remote::{Ack, BoxFuture, RemoteStore};

/// Create a queued change for `document_id` whose snapshot was modified at
/// `last_modified`.
pub fn make_change(document_id: &str, last_modified: u64) -> QueuedChange {
    QueuedChange::new(document_id, make_remote(last_modified), None, last_modified)
}

/// Create a remote snapshot tagged with its modification time.
pub fn make_remote(last_modified: u64) -> RemoteSnapshot {
    RemoteSnapshot { content: json!({"rev": last_modified, "source": "remote"}), last_modified }
}

/// Create a dirty local snapshot modified at `last_modified`.
pub fn make_local(last_modified: u64) -> DocumentSnapshot {
    DocumentSnapshot::new(json!({"rev": last_modified, "source": "local"}), last_modified)
}

/// Scriptable in-process remote store.
///
/// Clones share state, so a test keeps one handle while the manager owns
/// another. Push emulates network-level retries the way the HTTP client
/// does: retryable failures are retried up to `max_retries` times.
#[derive(Clone, Default)]
pub struct MockRemote {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    documents: HashMap<String, RemoteSnapshot>,
    /// Document id of every push attempt, in order.
    attempts: Vec<String>,
    /// Content of every accepted push, in order.
    accepted: Vec<(String, RemoteSnapshot)>,
    scripted: VecDeque<NetworkError>,
    fail_always: Option<NetworkError>,
    push_delay: Option<Duration>,
    fetches: usize,
    uploads: Vec<Bytes>,
}

impl MockRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails the next push attempt with `error`. Calls queue up.
    pub fn fail_next(&self, error: NetworkError) {
        self.lock().scripted.push_back(error);
    }

    /// Fails every push attempt until cleared with `None`.
    pub fn fail_always(&self, error: Option<NetworkError>) {
        self.lock().fail_always = error;
    }

    /// Delays every push attempt.
    pub fn delay_pushes(&self, delay: Duration) {
        self.lock().push_delay = Some(delay);
    }

    /// Seeds a document on the remote side.
    pub fn insert(&self, document_id: &str, snapshot: RemoteSnapshot) {
        self.lock().documents.insert(document_id.to_string(), snapshot);
    }

    pub fn stored(&self, document_id: &str) -> Option<RemoteSnapshot> {
        self.lock().documents.get(document_id).cloned()
    }

    pub fn attempts(&self) -> Vec<String> {
        self.lock().attempts.clone()
    }

    pub fn accepted(&self) -> Vec<(String, RemoteSnapshot)> {
        self.lock().accepted.clone()
    }

    pub fn fetches(&self) -> usize {
        self.lock().fetches
    }

    pub fn uploads(&self) -> Vec<Bytes> {
        self.lock().uploads.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.inner.lock().unwrap()
    }

    fn attempt(&self, document_id: &str, snapshot: &RemoteSnapshot) -> Result<Ack, NetworkError> {
        let mut state = self.lock();
        state.attempts.push(document_id.to_string());
        if let Some(error) = state.fail_always.clone() {
            return Err(error);
        }
        if let Some(error) = state.scripted.pop_front() {
            return Err(error);
        }
        state.documents.insert(document_id.to_string(), snapshot.clone());
        state.accepted.push((document_id.to_string(), snapshot.clone()));
        Ok(Ack::default())
    }
}

impl RemoteStore for MockRemote {
    fn push(
        &self,
        document_id: String,
        snapshot: RemoteSnapshot,
        _attachment: Option<AttachmentRef>,
        max_retries: u32,
    ) -> BoxFuture<'_, Result<Ack, NetworkError>> {
        Box::pin(async move {
            let delay = self.lock().push_delay;
            let mut retries = 0;
            loop {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                match self.attempt(&document_id, &snapshot) {
                    Err(e) if e.is_retryable() && retries < max_retries => retries += 1,
                    other => return other,
                }
            }
        })
    }

    fn fetch(
        &self,
        document_id: String,
    ) -> BoxFuture<'_, Result<Option<RemoteSnapshot>, NetworkError>> {
        Box::pin(async move {
            let mut state = self.lock();
            state.fetches += 1;
            Ok(state.documents.get(&document_id).cloned())
        })
    }

    fn upload(&self, bytes: Bytes) -> BoxFuture<'_, Result<AttachmentRef, NetworkError>> {
        Box::pin(async move {
            let mut state = self.lock();
            state.uploads.push(bytes);
            Ok(AttachmentRef::new(format!("blob-{}", state.uploads.len())))
        })
    }
}

/// A server-side failure, as the network client would report it.
pub fn server_error() -> NetworkError {
    NetworkError::from_status(500, br#"{"error": "internal error"}"#)
}

/// Polls `condition` until it holds or `timeout` passes.
pub async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
