// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Queued changes.
//!
//! A queued change is the durable record of one push that could not reach
//! the remote store. Its id is assigned once at enqueue time and never
//! changes across retries, so a flush can remove exactly the record it sent.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::snapshot::RemoteSnapshot;

const CHANGE_ID_PREFIX: &str = "chg-";
const CHANGE_ID_HEX_LEN: usize = 16;

/// Unique identifier of a queued change. Format: `chg-{16 hex chars}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChangeId(String);

impl ChangeId {
    /// Generates a new id for a change to `document_id` enqueued at `now`.
    ///
    /// The hash covers a random nonce, so two changes enqueued for the same
    /// document within the same millisecond still get distinct ids.
    pub fn generate(document_id: &str, now: u64) -> Self {
        let nonce: u64 = rand::random();
        let input = format!("{document_id}:{now}:{nonce}");
        let hash = Sha256::digest(input.as_bytes());
        ChangeId(format!("{CHANGE_ID_PREFIX}{}", hex::encode(&hash[..CHANGE_ID_HEX_LEN / 2])))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ChangeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let valid = s.strip_prefix(CHANGE_ID_PREFIX).is_some_and(|hash| {
            hash.len() == CHANGE_ID_HEX_LEN
                && hash.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        });
        if valid {
            Ok(ChangeId(s.to_string()))
        } else {
            Err(Error::InvalidChangeId(s.to_string()))
        }
    }
}

impl TryFrom<String> for ChangeId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<ChangeId> for String {
    fn from(id: ChangeId) -> String {
        id.0
    }
}

/// Opaque reference to a binary attachment held by the blob store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentRef(pub String);

impl AttachmentRef {
    pub fn new(reference: impl Into<String>) -> Self {
        AttachmentRef(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AttachmentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One pending push, owned by the durable queue until removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedChange {
    pub id: ChangeId,
    pub document_id: String,
    /// The sanitized snapshot as it was at enqueue time.
    pub snapshot: RemoteSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<AttachmentRef>,
    pub enqueued_at: u64,
    /// Failed flush attempts so far.
    #[serde(default)]
    pub retries: u32,
}

impl QueuedChange {
    /// Creates a change with a fresh id and a zero retry counter.
    pub fn new(
        document_id: impl Into<String>,
        snapshot: RemoteSnapshot,
        attachment: Option<AttachmentRef>,
        now: u64,
    ) -> Self {
        let document_id = document_id.into();
        QueuedChange {
            id: ChangeId::generate(&document_id, now),
            document_id,
            snapshot,
            attachment,
            enqueued_at: now,
            retries: 0,
        }
    }

    /// Returns a copy with the retry counter incremented. The id is kept.
    pub fn with_retry(&self) -> Self {
        QueuedChange {
            retries: self.retries.saturating_add(1),
            ..self.clone()
        }
    }

    /// Returns true once the change has used up its retries.
    pub fn is_exhausted(&self, max_retries: u32) -> bool {
        self.retries >= max_retries
    }
}

/// Validates a document identifier.
///
/// Document ids double as file names in the local document store, so they
/// are restricted to `[A-Za-z0-9._-]`, must not start with a dot and must
/// not be empty.
pub fn validate_document_id(id: &str) -> Result<()> {
    let valid = !id.is_empty()
        && id.len() <= 128
        && !id.starts_with('.')
        && id.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidDocumentId(id.to_string()))
    }
}

#[cfg(test)]
#[path = "change_tests.rs"]
mod tests;
