// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Local-first document sync engine.
//!
//! Keeps locally held documents consistent with a remote authoritative
//! store across unreliable connectivity.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Manager   │────►│   Remote    │────►│   Network   │────►│   Remote    │
//! │(SyncManager)│◄────│   (trait)   │◄────│   Client    │◄────│    Store    │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//!    │   │   ▲
//!    │   │   └──── Connectivity (online/offline events)
//!    │   ▼
//!    │ ┌─────────────┐
//!    │ │   Queue     │  (offline changes, JSONL)
//!    │ │(DurableQueue│
//!    │ └─────────────┘
//!    ▼
//! ┌─────────────┐
//! │  Documents  │  (current snapshot per document)
//! └─────────────┘
//! ```
//!
//! # Features
//!
//! - HTTP client with timeout, retry and exponential backoff with jitter
//! - Offline queue persisted as JSONL, loaded once at startup
//! - Automatic flush when connectivity returns
//! - Last-write-wins conflict resolution on pull
//! - Injectable remote and connectivity traits for testing

mod connectivity;
mod document;
mod manager;
mod network;
mod queue;
mod remote;

pub use connectivity::{
    ConnectivityEvent, ConnectivityObserver, ManualConnectivity, ProbeConnectivity, Subscription,
    SubscriptionId,
};
pub use document::DocumentStore;
pub use manager::{DocState, SyncConfig, SyncManager, DEFAULT_MAX_RETRIES};
pub use network::{
    Backoff, ClientConfig, ErrorKind, Method, NetworkClient, NetworkError, RequestBody,
    RequestConfig, Response, DEFAULT_TIMEOUT,
};
pub use queue::{DurableQueue, JsonlStorage, MemoryStorage, QueueError, QueueResult, QueueStorage};
pub use remote::{Ack, BoxFuture, HttpRemote, RemoteStore};

#[cfg(test)]
mod test_helpers;

#[cfg(test)]
mod integration_tests;
