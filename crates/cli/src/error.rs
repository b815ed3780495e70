// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::sync::NetworkError;

/// All possible errors that can occur in the tetherrs library.
///
/// Remote failures during push, pull and flush are reported through
/// `SyncResult` values instead; these errors cover setup and local I/O.
#[derive(Debug, Error)]
pub enum Error {
    #[error("not initialized: run 'tether init <url>' first")]
    NotInitialized,

    #[error("already initialized at {0}")]
    AlreadyInitialized(String),

    #[error("invalid remote url '{0}'\n  hint: use an http:// or https:// url")]
    InvalidRemoteUrl(String),

    #[error("document not found: {0}")]
    DocumentNotFound(String),

    #[error("another tether process is using {0}")]
    Locked(String),

    #[error("cannot upload attachment {0} while offline\n  hint: push without --attachment")]
    AttachmentOffline(String),

    #[error("{0}")]
    Sync(String),

    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] tether_core::Error),
}

/// A specialized Result type for tetherrs operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
