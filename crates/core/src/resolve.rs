// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Conflict resolution between a dirty local snapshot and the remote one.
//!
//! Resolution rules:
//! - The snapshot with the greater `last_modified` wins as a whole
//! - On an exact tie the remote wins
//! - Fields are never merged
//!
//! Resolution is pure and deterministic: `resolve(s, s) == s`.

use crate::snapshot::DocumentSnapshot;

/// Which side of a resolution won.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Local,
    Remote,
}

/// Decides which snapshot becomes authoritative.
pub fn winner(local: &DocumentSnapshot, remote: &DocumentSnapshot) -> Side {
    if local.last_modified > remote.last_modified {
        Side::Local
    } else {
        Side::Remote
    }
}

/// Returns a copy of the winning snapshot.
pub fn resolve(local: &DocumentSnapshot, remote: &DocumentSnapshot) -> DocumentSnapshot {
    match winner(local, remote) {
        Side::Local => local.clone(),
        Side::Remote => remote.clone(),
    }
}

#[cfg(test)]
#[path = "resolve_tests.rs"]
mod tests;
