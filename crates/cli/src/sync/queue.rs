// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable queue of changes waiting to reach the remote store.
//!
//! The queue is loaded once at open time and then kept in memory; the
//! in-memory copy is the single source of truth while the process lives.
//! Every mutation is written through to the backing [`QueueStorage`].
//!
//! Failure policy:
//! - Unreadable or corrupt storage at open: start empty, log a warning
//! - Failed write-through: keep the in-memory mutation, log a warning and
//!   mark the queue degraded (in-memory only) for the rest of the session
//!
//! An empty queue therefore does not prove that every change reached the
//! remote; callers must not infer document sync status from it.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tether_core::{jsonl, ChangeId, QueuedChange};

/// Error type for queue storage operations.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// Storage error from the persistence layer.
    #[error("queue storage error: {0}")]
    Storage(#[from] tether_core::Error),
}

/// Result type for queue storage operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// Stable storage behind a [`DurableQueue`].
pub trait QueueStorage: Send + Sync {
    /// Reads the persisted queue in order.
    fn load(&self) -> QueueResult<Vec<QueuedChange>>;

    /// Replaces the persisted queue with `changes`.
    fn save(&self, changes: &[QueuedChange]) -> QueueResult<()>;
}

/// Queue storage in a JSONL file, one change per line.
pub struct JsonlStorage {
    path: PathBuf,
}

impl JsonlStorage {
    pub fn new(path: &Path) -> Self {
        JsonlStorage {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl QueueStorage for JsonlStorage {
    fn load(&self) -> QueueResult<Vec<QueuedChange>> {
        Ok(jsonl::read_all(&self.path)?)
    }

    fn save(&self, changes: &[QueuedChange]) -> QueueResult<()> {
        Ok(jsonl::write_all(&self.path, changes)?)
    }
}

/// Volatile storage. Contents vanish with the process.
#[derive(Default)]
pub struct MemoryStorage {
    changes: Mutex<Vec<QueuedChange>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl QueueStorage for MemoryStorage {
    fn load(&self) -> QueueResult<Vec<QueuedChange>> {
        Ok(self.changes.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, changes: &[QueuedChange]) -> QueueResult<()> {
        *self.changes.lock().unwrap_or_else(|e| e.into_inner()) = changes.to_vec();
        Ok(())
    }
}

/// Ordered, persisted list of pending changes.
pub struct DurableQueue {
    storage: Box<dyn QueueStorage>,
    changes: Vec<QueuedChange>,
    degraded: bool,
}

impl DurableQueue {
    /// Opens the queue, loading its contents once.
    pub fn open(storage: impl QueueStorage + 'static) -> Self {
        let changes = match storage.load() {
            Ok(changes) => changes,
            Err(e) => {
                tracing::warn!("offline queue unreadable, starting empty: {e}");
                Vec::new()
            }
        };
        if !changes.is_empty() {
            tracing::info!(pending = changes.len(), "loaded offline queue");
        }
        DurableQueue {
            storage: Box::new(storage),
            changes,
            degraded: false,
        }
    }

    /// A queue with no stable storage at all.
    pub fn in_memory() -> Self {
        Self::open(MemoryStorage::new())
    }

    /// Appends a change at the tail.
    pub fn append(&mut self, change: QueuedChange) {
        tracing::debug!(id = %change.id, document = %change.document_id, "enqueue change");
        self.changes.push(change);
        self.persist();
    }

    /// Removes the change with the given id. Returns false if absent.
    pub fn remove_by_id(&mut self, id: &ChangeId) -> bool {
        let before = self.changes.len();
        self.changes.retain(|c| &c.id != id);
        let removed = self.changes.len() != before;
        if removed {
            self.persist();
        }
        removed
    }

    /// Replaces the change with the same id in place, keeping its position.
    /// Returns false if no such change is queued.
    pub fn update(&mut self, change: QueuedChange) -> bool {
        let Some(slot) = self.changes.iter_mut().find(|c| c.id == change.id) else {
            return false;
        };
        *slot = change;
        self.persist();
        true
    }

    /// Removes the changes of `document_id` whose snapshot is not newer than
    /// `last_modified`, returning them in queue order.
    pub fn remove_superseded(
        &mut self,
        document_id: &str,
        last_modified: u64,
    ) -> Vec<QueuedChange> {
        let (removed, kept): (Vec<QueuedChange>, Vec<QueuedChange>) =
            std::mem::take(&mut self.changes).into_iter().partition(|c| {
                c.document_id == document_id && c.snapshot.last_modified <= last_modified
            });
        self.changes = kept;
        if !removed.is_empty() {
            self.persist();
        }
        removed
    }

    /// Number of pending changes for one document.
    pub fn count_for(&self, document_id: &str) -> usize {
        self.changes.iter().filter(|c| c.document_id == document_id).count()
    }

    /// All pending changes in FIFO order.
    pub fn all(&self) -> &[QueuedChange] {
        &self.changes
    }

    pub fn get(&self, id: &ChangeId) -> Option<&QueuedChange> {
        self.changes.iter().find(|c| &c.id == id)
    }

    /// Replaces the whole queue.
    pub fn replace_all(&mut self, changes: Vec<QueuedChange>) {
        self.changes = changes;
        self.persist();
    }

    /// Drops every pending change.
    pub fn clear(&mut self) {
        self.replace_all(Vec::new());
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// True once a write-through has failed this session.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    fn persist(&mut self) {
        if self.degraded {
            return;
        }
        if let Err(e) = self.storage.save(&self.changes) {
            tracing::warn!("offline queue persistence failed, continuing in memory only: {e}");
            self.degraded = true;
        }
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
