// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for tether-core operations.

use thiserror::Error;

/// All possible errors that can occur in tether-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid change id: '{0}'\n  hint: change ids look like chg-0123456789abcdef")]
    InvalidChangeId(String),

    #[error("invalid sync status: '{0}'\n  hint: valid statuses are: synced, pending, error")]
    InvalidSyncStatus(String),

    #[error("invalid document id: '{0}'\n  hint: use letters, digits, '-', '_' or '.'")]
    InvalidDocumentId(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data: {0}")]
    CorruptedData(String),
}

/// A specialized Result type for tether-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
