// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tether-core: Shared data model for the tether sync engine
//!
//! This crate provides the document snapshot, queued change and sync result
//! types, the last-write-wins conflict resolver, and the persistence
//! primitives used by the `tether` sync engine and CLI.

pub mod change;
pub mod clock;
pub mod error;
pub mod jsonl;
pub mod resolve;
pub mod result;
pub mod snapshot;

pub use change::{validate_document_id, AttachmentRef, ChangeId, QueuedChange};
pub use clock::{ClockSource, ManualClock, SystemClock};
pub use error::{Error, Result};
pub use resolve::{resolve, winner, Side};
pub use result::{DroppedChange, FlushReport, SyncResult};
pub use snapshot::{DocumentSnapshot, RemoteSnapshot, SyncStatus};
