// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync manager.
//!
//! Orchestrates pushes, pulls and queue flushes for a set of documents.
//! Remote failures never escape as `Err`: every operation reports through
//! a [`SyncResult`] or a [`FlushReport`].
//!
//! # Lifecycle
//!
//! [`SyncManager::create`] subscribes to the connectivity observer and
//! spawns a listener that flushes the queue whenever the network comes
//! back. [`SyncManager::destroy`] unsubscribes and stops that listener.
//! Dropping the last handle does the same.
//!
//! # Per-document states
//!
//! ```text
//!            push (online)             push (offline)
//!   Idle ───────────────► PushInFlight      Idle ──────► Queued
//!    ▲                         │                           │
//!    └───── success / error ───┘          flush success ───┘──► Idle
//!
//!   Idle ── pull ──► PullInFlight ── fetched / failed ──► Idle
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use bytes::Bytes;
use tether_core::{
    resolve, validate_document_id, winner, AttachmentRef, ClockSource, DocumentSnapshot,
    DroppedChange, FlushReport, QueuedChange, Side, SyncResult,
};
use tokio_util::sync::CancellationToken;

use super::connectivity::{ConnectivityEvent, ConnectivityObserver, Subscription, SubscriptionId};
use super::document::DocumentStore;
use super::network::{Backoff, NetworkError};
use super::queue::DurableQueue;
use super::remote::{HttpRemote, RemoteStore};

/// Default number of failed flush attempts after which a change is dropped.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Sync manager configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// A queued change that has already failed this many times is dropped
    /// on its next failure, after `max_retries + 1` attempts in total.
    pub max_retries: u32,
    /// Network-level retries for an online push. Zero means a failed push
    /// surfaces immediately.
    pub push_retries: u32,
    /// Delay between failed flush attempts.
    pub backoff: Backoff,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            max_retries: DEFAULT_MAX_RETRIES,
            push_retries: 0,
            backoff: Backoff::default(),
        }
    }
}

/// What the manager is currently doing with a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocState {
    #[default]
    Idle,
    PushInFlight,
    Queued,
    PullInFlight,
}

/// Resets the flush flag when the flush ends, even if its future is dropped.
struct FlushGuard<'a>(&'a AtomicBool);

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Keeps documents consistent with a remote store across connectivity loss.
pub struct SyncManager<R: RemoteStore = HttpRemote> {
    remote: R,
    connectivity: Arc<dyn ConnectivityObserver>,
    queue: Mutex<DurableQueue>,
    documents: DocumentStore,
    clock: Arc<dyn ClockSource>,
    config: SyncConfig,
    flushing: AtomicBool,
    states: Mutex<HashMap<String, DocState>>,
    subscription: Mutex<Option<SubscriptionId>>,
    shutdown: CancellationToken,
}

impl<R: RemoteStore + 'static> SyncManager<R> {
    /// Builds a manager and starts listening for reconnection.
    ///
    /// Must be called from within a tokio runtime.
    pub fn create(
        remote: R,
        connectivity: Arc<dyn ConnectivityObserver>,
        queue: DurableQueue,
        documents: DocumentStore,
        clock: Arc<dyn ClockSource>,
        config: SyncConfig,
    ) -> Arc<Self> {
        let subscription = connectivity.subscribe();
        let manager = Arc::new(SyncManager {
            remote,
            connectivity,
            queue: Mutex::new(queue),
            documents,
            clock,
            config,
            flushing: AtomicBool::new(false),
            states: Mutex::new(HashMap::new()),
            subscription: Mutex::new(Some(subscription.id)),
            shutdown: CancellationToken::new(),
        });
        manager.spawn_listener(subscription);
        manager
    }

    fn spawn_listener(self: &Arc<Self>, mut subscription: Subscription) {
        let manager: Weak<Self> = Arc::downgrade(self);
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    _ = shutdown.cancelled() => break,
                    event = subscription.events.recv() => event,
                };
                match event {
                    Some(ConnectivityEvent::Online) => {
                        let Some(manager) = manager.upgrade() else { break };
                        tracing::info!("connectivity restored, flushing queue");
                        let report = manager.flush().await;
                        if !report.skipped {
                            tracing::info!(
                                synced = report.synced,
                                dropped = report.dropped.len(),
                                "reconnection flush finished"
                            );
                        }
                    }
                    Some(ConnectivityEvent::Offline) => {
                        tracing::info!("connectivity lost, pushes will be queued");
                    }
                    None => break,
                }
            }
            tracing::debug!("connectivity listener stopped");
        });
    }
}

impl<R: RemoteStore> SyncManager<R> {
    /// Sends a document snapshot to the remote store.
    ///
    /// Online, the snapshot is pushed directly; a failure marks the local
    /// record as errored and is NOT queued. Offline, the change is appended
    /// to the durable queue and a queued (not successful) result returned.
    /// While earlier changes of the same document are queued a flush runs
    /// first; if any of them are still queued afterwards the push fails, so
    /// the remote never sees a document's writes out of order.
    pub async fn push(
        &self,
        document_id: &str,
        snapshot: &DocumentSnapshot,
        attachment: Option<AttachmentRef>,
    ) -> SyncResult {
        if let Err(e) = validate_document_id(document_id) {
            return SyncResult::failed(e.to_string());
        }

        if !self.connectivity.is_online() {
            self.enqueue(document_id, snapshot, attachment);
            return SyncResult::queued("offline: change queued for sync");
        }

        if self.lock_queue().count_for(document_id) > 0 {
            self.flush().await;
            let still_queued = self.lock_queue().count_for(document_id);
            if still_queued > 0 {
                tracing::warn!(
                    document = document_id,
                    queued = still_queued,
                    "push refused, earlier changes still queued"
                );
                self.documents.put(document_id, snapshot.mark_error());
                self.settle(document_id);
                return SyncResult::failed(format!(
                    "{still_queued} earlier change(s) of {document_id} still queued"
                ));
            }
        }

        self.set_state(document_id, DocState::PushInFlight);
        let result = self
            .remote
            .push(
                document_id.to_string(),
                snapshot.to_remote(),
                attachment,
                self.config.push_retries,
            )
            .await;

        let outcome = match result {
            Ok(ack) => {
                let synced = snapshot.mark_synced(self.clock.now_ms());
                let at = synced.last_synced_at.unwrap_or(synced.last_modified);
                tracing::info!(
                    document = document_id,
                    remote_at = ?ack.synced_at,
                    "pushed document"
                );
                self.documents.put(document_id, synced);
                SyncResult::synced(at)
            }
            Err(e) => {
                tracing::warn!(document = document_id, status = e.status, "push failed: {e}");
                self.documents.put(document_id, snapshot.mark_error());
                SyncResult::failed(e.to_string())
            }
        };
        self.settle(document_id);
        outcome
    }

    /// Fetches a document from the remote store and makes it the local state.
    ///
    /// A dirty local snapshot competes with the remote one by last write;
    /// a clean one is replaced unconditionally. Queued changes of the
    /// document that are not newer than the remote snapshot are discarded.
    /// The stored result is marked synced unless newer changes are still
    /// queued, in which case it stays pending until they are flushed.
    pub async fn pull(&self, document_id: &str) -> SyncResult {
        if let Err(e) = validate_document_id(document_id) {
            return SyncResult::failed(e.to_string());
        }
        if !self.connectivity.is_online() {
            return SyncResult::failed("offline: cannot pull");
        }

        self.set_state(document_id, DocState::PullInFlight);
        let fetched = self.remote.fetch(document_id.to_string()).await;

        let outcome = match fetched {
            Ok(Some(remote)) => {
                let now = self.clock.now_ms();
                let remote = remote.into_local(now);
                let superseded = self
                    .lock_queue()
                    .remove_superseded(document_id, remote.last_modified);
                if !superseded.is_empty() {
                    tracing::warn!(
                        document = document_id,
                        discarded = superseded.len(),
                        remote = remote.last_modified,
                        "discarding queued changes superseded by the remote"
                    );
                }

                let chosen = match self.documents.get(document_id) {
                    Some(local) if local.is_dirty => {
                        let side = winner(&local, &remote);
                        if side == Side::Local {
                            tracing::warn!(
                                document = document_id,
                                local = local.last_modified,
                                remote = remote.last_modified,
                                "local snapshot is newer, keeping it"
                            );
                        }
                        resolve(&local, &remote)
                    }
                    _ => remote,
                };
                let stored = if self.lock_queue().count_for(document_id) > 0 {
                    chosen.mark_pending()
                } else {
                    chosen.mark_synced(now)
                };
                let at = stored.last_synced_at.unwrap_or(now);
                tracing::info!(document = document_id, "pulled document");
                self.documents.put(document_id, stored);
                SyncResult::synced(at)
            }
            Ok(None) => {
                SyncResult::failed(format!("document not found on remote: {document_id}"))
            }
            Err(e) => {
                tracing::warn!(document = document_id, status = e.status, "pull failed: {e}");
                SyncResult::failed(e.to_string())
            }
        };
        self.settle(document_id);
        outcome
    }

    /// Drains the durable queue in FIFO order.
    ///
    /// At most one flush runs at a time; a concurrent call returns a skipped
    /// report without touching the network. The pass covers the queue as it
    /// was when the flush started, minus changes removed since. A failed
    /// change stays queued with its retry counter bumped, and later changes
    /// of the same document are held back until the next flush.
    pub async fn flush(&self) -> FlushReport {
        if self
            .flushing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("flush already running, skipping");
            return FlushReport::skipped();
        }
        let _guard = FlushGuard(&self.flushing);

        if !self.connectivity.is_online() {
            tracing::debug!("offline, skipping flush");
            return FlushReport::skipped();
        }
        let pending: Vec<QueuedChange> = self.lock_queue().all().to_vec();
        if pending.is_empty() {
            return FlushReport::skipped();
        }

        tracing::info!(pending = pending.len(), "flushing offline queue");
        let mut report = FlushReport::default();
        let mut held_back: HashSet<String> = HashSet::new();

        for (index, change) in pending.iter().enumerate() {
            if held_back.contains(&change.document_id) {
                continue;
            }
            if self.lock_queue().get(&change.id).is_none() {
                tracing::debug!(id = %change.id, "change no longer queued, skipping");
                continue;
            }
            if !self.connectivity.is_online() {
                tracing::info!("connectivity lost during flush, stopping");
                break;
            }

            self.set_state(&change.document_id, DocState::PushInFlight);
            let result = self
                .remote
                .push(
                    change.document_id.clone(),
                    change.snapshot.clone(),
                    change.attachment.clone(),
                    0,
                )
                .await;

            match result {
                Ok(_) => {
                    self.lock_queue().remove_by_id(&change.id);
                    self.mark_flushed(change);
                    report.synced += 1;
                    tracing::debug!(
                        id = %change.id,
                        document = %change.document_id,
                        "flushed change"
                    );
                }
                Err(e) if change.is_exhausted(self.config.max_retries) => {
                    self.drop_change(change, &e, &mut report);
                }
                Err(e) => {
                    let retried = change.with_retry();
                    let delay = self.config.backoff.delay(change.retries);
                    tracing::warn!(
                        id = %change.id,
                        document = %change.document_id,
                        retries = retried.retries,
                        delay_ms = delay.as_millis() as u64,
                        "flush attempt failed: {e}"
                    );
                    self.lock_queue().update(retried);
                    held_back.insert(change.document_id.clone());
                    self.settle(&change.document_id);

                    let more_to_try = pending[index + 1..]
                        .iter()
                        .any(|next| !held_back.contains(&next.document_id));
                    if more_to_try {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        if report.has_data_loss() {
            tracing::error!(
                dropped = report.dropped.len(),
                "flush dropped changes after exhausting retries"
            );
        }
        tracing::info!(synced = report.synced, remaining = self.queue_len(), "flush finished");
        report
    }

    /// Uploads an attachment, failing fast while offline.
    pub async fn upload(&self, bytes: Bytes) -> Result<AttachmentRef, NetworkError> {
        if !self.connectivity.is_online() {
            return Err(NetworkError::transport("offline: cannot upload attachment"));
        }
        self.remote.upload(bytes).await
    }

    /// Number of changes waiting in the durable queue.
    pub fn queue_len(&self) -> usize {
        self.lock_queue().len()
    }

    /// Discards every queued change. Returns how many were discarded.
    pub fn clear_queue(&self) -> usize {
        let cleared = {
            let mut queue = self.lock_queue();
            let cleared = queue.len();
            queue.clear();
            cleared
        };
        if cleared > 0 {
            tracing::warn!(cleared, "offline queue cleared by request");
        }
        self.lock_states().retain(|_, s| *s != DocState::Queued);
        cleared
    }

    /// Current local snapshot of a document.
    pub fn document(&self, document_id: &str) -> Option<DocumentSnapshot> {
        self.documents.get(document_id)
    }

    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    /// Pending changes in FIFO order.
    pub fn queued(&self) -> Vec<QueuedChange> {
        self.lock_queue().all().to_vec()
    }

    pub fn state(&self, document_id: &str) -> DocState {
        self.lock_states().get(document_id).copied().unwrap_or_default()
    }

    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    /// True if queue or document persistence failed this session.
    pub fn is_degraded(&self) -> bool {
        self.lock_queue().is_degraded() || self.documents.is_degraded()
    }

    /// Stops reacting to connectivity changes. Safe to call more than once.
    pub fn destroy(&self) {
        let id = self.subscription.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(id) = id {
            self.connectivity.unsubscribe(id);
            self.shutdown.cancel();
            tracing::debug!("sync manager destroyed");
        }
    }

    fn enqueue(
        &self,
        document_id: &str,
        snapshot: &DocumentSnapshot,
        attachment: Option<AttachmentRef>,
    ) {
        let now = self.clock.now_ms();
        let change = QueuedChange::new(document_id, snapshot.to_remote(), attachment, now);
        self.lock_queue().append(change.clone());
        self.documents.put(document_id, snapshot.mark_pending());
        self.set_state(document_id, DocState::Queued);
        tracing::info!(id = %change.id, document = document_id, "change queued");
    }

    /// Records a successful flush of `change` in the local snapshot.
    fn mark_flushed(&self, change: &QueuedChange) {
        let settled = self.lock_queue().count_for(&change.document_id) == 0;
        if let Some(local) = self.documents.get(&change.document_id) {
            if settled && local.last_modified <= change.snapshot.last_modified {
                self.documents.put(&change.document_id, local.mark_synced(self.clock.now_ms()));
            }
        }
        self.settle(&change.document_id);
    }

    fn drop_change(&self, change: &QueuedChange, error: &NetworkError, report: &mut FlushReport) {
        let attempts = change.retries + 1;
        tracing::error!(
            id = %change.id,
            document = %change.document_id,
            attempts,
            "data loss: dropping change after exhausting retries: {error}"
        );
        self.lock_queue().remove_by_id(&change.id);
        if let Some(local) = self.documents.get(&change.document_id) {
            if local.last_modified <= change.snapshot.last_modified {
                self.documents.put(&change.document_id, local.mark_error());
            }
        }
        self.settle(&change.document_id);
        report.dropped.push(DroppedChange {
            id: change.id.clone(),
            document_id: change.document_id.clone(),
            attempts,
            last_error: error.to_string(),
        });
    }

    fn lock_queue(&self) -> MutexGuard<'_, DurableQueue> {
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_states(&self) -> MutexGuard<'_, HashMap<String, DocState>> {
        self.states.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, document_id: &str, state: DocState) {
        let mut states = self.lock_states();
        if state == DocState::Idle {
            states.remove(document_id);
        } else {
            states.insert(document_id.to_string(), state);
        }
    }

    /// Leaves an in-flight state: `Queued` if changes remain, else `Idle`.
    fn settle(&self, document_id: &str) {
        let state = if self.lock_queue().count_for(document_id) > 0 {
            DocState::Queued
        } else {
            DocState::Idle
        };
        self.set_state(document_id, state);
    }
}

impl<R: RemoteStore> Drop for SyncManager<R> {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
