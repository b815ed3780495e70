// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tetherrs - A local-first document sync engine.
//!
//! This crate provides the sync engine behind the `tether` CLI: documents
//! held locally are pushed to a remote store while it is reachable and
//! queued durably while it is not.
//!
//! # Main Components
//!
//! - [`sync::SyncManager`] - Push, pull and flush orchestration
//! - [`sync::NetworkClient`] - HTTP with timeout, retry and backoff
//! - [`sync::DurableQueue`] - Persisted offline change queue
//! - [`Config`] - Project configuration (`.tether/config.toml`)
//! - [`Error`] - Error types for setup and local I/O
//!
//! # Embedding
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tetherrs::sync::*;
//! use tether_core::{DocumentSnapshot, SystemClock};
//!
//! let client = NetworkClient::new(ClientConfig::default())?;
//! let manager = SyncManager::create(
//!     HttpRemote::new(client, "https://sync.example.com"),
//!     Arc::new(ManualConnectivity::new(true)),
//!     DurableQueue::open(JsonlStorage::new(Path::new("queue.jsonl"))),
//!     DocumentStore::open(Path::new("documents")),
//!     Arc::new(SystemClock),
//!     SyncConfig::default(),
//! );
//! let result = manager.push("canvas", &DocumentSnapshot::new(content, now), None).await;
//! ```

mod cli;
mod commands;

pub mod config;
pub mod env;
pub mod error;
pub mod sync;

pub use cli::{Cli, Command, OutputFormat};
pub use config::{find_tether_dir, init_tether_dir, log_path, Config};
pub use error::{Error, Result};

/// Execute a CLI command. This is the main entry point for library users
/// and provides a testable way to run commands without process execution.
pub fn run(command: Command) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    runtime.block_on(run_async(command))
}

async fn run_async(command: Command) -> Result<()> {
    match command {
        Command::Init { url, path } => commands::init::run(&url, path.as_deref()),
        Command::Push {
            document,
            file,
            attachment,
            offline,
        } => {
            commands::push::run(&document, &file, attachment.as_deref(), offline).await
        }
        Command::Pull { document, offline } => commands::pull::run(&document, offline).await,
        Command::Flush => commands::flush::run().await,
        Command::Status { output, offline } => commands::status::run(output, offline).await,
        Command::Show { document, output } => commands::show::run(&document, output),
        Command::Clear => commands::clear::run().await,
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
