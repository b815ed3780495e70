// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Document snapshots.
//!
//! A snapshot is the unit of synchronization: an opaque JSON content payload
//! plus the bookkeeping the sync engine needs to decide what to send and
//! which side wins a conflict. Snapshots are values; every transition
//! returns a new snapshot and leaves the original untouched.
//!
//! Invariant: a clean snapshot (`is_dirty == false`) is always `Synced` and
//! carries a `last_synced_at` no older than its `last_modified`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Sync state of a local snapshot as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// Local content matches the last confirmed remote state.
    Synced,
    /// Local changes are waiting to be pushed (possibly queued offline).
    Pending,
    /// The last push attempt failed while online.
    Error,
}

impl SyncStatus {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Synced => "synced",
            SyncStatus::Pending => "pending",
            SyncStatus::Error => "error",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SyncStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "synced" => Ok(SyncStatus::Synced),
            "pending" => Ok(SyncStatus::Pending),
            "error" => Ok(SyncStatus::Error),
            _ => Err(Error::InvalidSyncStatus(s.to_string())),
        }
    }
}

/// The locally held state of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSnapshot {
    /// Opaque document content (elements, viewport, ...).
    pub content: Value,
    /// When the content was last changed, in ms since the Unix epoch.
    pub last_modified: u64,
    /// When the remote last acknowledged this document, if ever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_synced_at: Option<u64>,
    /// True while local content differs from the last confirmed remote state.
    pub is_dirty: bool,
    pub sync_status: SyncStatus,
}

impl DocumentSnapshot {
    /// Creates a fresh, never-synced snapshot.
    pub fn new(content: Value, now: u64) -> Self {
        DocumentSnapshot {
            content,
            last_modified: now,
            last_synced_at: None,
            is_dirty: true,
            sync_status: SyncStatus::Pending,
        }
    }

    /// Returns a copy with new content.
    ///
    /// `last_modified` never goes backwards, even if the wall clock does.
    pub fn edit(&self, content: Value, now: u64) -> Self {
        let last_modified = if now > self.last_modified { now } else { self.last_modified + 1 };
        DocumentSnapshot {
            content,
            last_modified,
            last_synced_at: self.last_synced_at,
            is_dirty: true,
            sync_status: SyncStatus::Pending,
        }
    }

    /// Returns a copy marked as waiting for a push.
    pub fn mark_pending(&self) -> Self {
        DocumentSnapshot {
            is_dirty: true,
            sync_status: SyncStatus::Pending,
            ..self.clone()
        }
    }

    /// Returns a copy marked as confirmed by the remote at `now`.
    pub fn mark_synced(&self, now: u64) -> Self {
        DocumentSnapshot {
            last_synced_at: Some(now.max(self.last_modified)),
            is_dirty: false,
            sync_status: SyncStatus::Synced,
            ..self.clone()
        }
    }

    /// Returns a copy marked as failed to push. The content stays dirty.
    pub fn mark_error(&self) -> Self {
        DocumentSnapshot {
            is_dirty: true,
            sync_status: SyncStatus::Error,
            ..self.clone()
        }
    }

    /// Checks the clean-implies-synced invariant.
    pub fn is_consistent(&self) -> bool {
        if self.is_dirty {
            return true;
        }
        self.sync_status == SyncStatus::Synced
            && self.last_synced_at.is_some_and(|at| at >= self.last_modified)
    }

    /// Returns the sanitized form sent to the remote store.
    pub fn to_remote(&self) -> RemoteSnapshot {
        RemoteSnapshot {
            content: sanitize(&self.content),
            last_modified: self.last_modified,
        }
    }
}

/// The wire form of a snapshot: content and modification time only.
///
/// Local bookkeeping (`is_dirty`, `sync_status`, `last_synced_at`) is never
/// transmitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSnapshot {
    pub content: Value,
    pub last_modified: u64,
}

impl RemoteSnapshot {
    /// Converts a remote snapshot into a clean local snapshot synced at `now`.
    pub fn into_local(self, now: u64) -> DocumentSnapshot {
        DocumentSnapshot {
            content: self.content,
            last_modified: self.last_modified,
            last_synced_at: None,
            is_dirty: false,
            sync_status: SyncStatus::Synced,
        }
        .mark_synced(now)
    }
}

/// Strips `null` object members, recursively.
fn sanitize(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), sanitize(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(sanitize).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
