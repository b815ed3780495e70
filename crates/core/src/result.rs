// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Outcome values returned by sync operations.
//!
//! These are never persisted and never thrown: every push, pull and flush
//! hands one back so callers can branch on it.

use crate::change::ChangeId;

/// Outcome of a single push or pull.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncResult {
    pub success: bool,
    pub error: Option<String>,
    /// Remote acknowledgment time on success.
    pub synced_at: Option<u64>,
    /// True when a push was stored in the offline queue instead of sent.
    pub queued: bool,
}

impl SyncResult {
    pub fn synced(at: u64) -> Self {
        SyncResult {
            success: true,
            error: None,
            synced_at: Some(at),
            queued: false,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        SyncResult {
            success: false,
            error: Some(message.into()),
            synced_at: None,
            queued: false,
        }
    }

    /// A push that went to the offline queue. Not a hard error.
    pub fn queued(message: impl Into<String>) -> Self {
        SyncResult {
            success: false,
            error: Some(message.into()),
            synced_at: None,
            queued: true,
        }
    }
}

/// A change discarded after exhausting its retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedChange {
    pub id: ChangeId,
    pub document_id: String,
    pub attempts: u32,
    pub last_error: String,
}

/// Outcome of one flush of the offline queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Changes pushed and removed from the queue.
    pub synced: usize,
    /// Changes dropped after retry exhaustion (data loss).
    pub dropped: Vec<DroppedChange>,
    /// True when the flush did nothing because another flush was running,
    /// the observer reported offline, or the queue was empty.
    pub skipped: bool,
}

impl FlushReport {
    pub fn skipped() -> Self {
        FlushReport {
            skipped: true,
            ..Default::default()
        }
    }

    pub fn has_data_loss(&self) -> bool {
        !self.dropped.is_empty()
    }
}

#[cfg(test)]
#[path = "result_tests.rs"]
mod tests;
