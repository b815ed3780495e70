// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod clear;
pub mod flush;
pub mod init;
pub mod pull;
pub mod push;
pub mod show;
pub mod status;

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tether_core::SystemClock;

use crate::config::{documents_dir, find_tether_dir, lock_path, queue_path, Config};
use crate::env;
use crate::error::{Error, Result};
use crate::sync::{
    ClientConfig, ConnectivityObserver, DocumentStore, DurableQueue, HttpRemote, JsonlStorage,
    ManualConnectivity, NetworkClient, ProbeConnectivity, SyncManager,
};

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const PROBE_INTERVAL: Duration = Duration::from_secs(30);

/// How a command should treat the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    /// Probe the remote store.
    Probe,
    /// Assume the remote store is unreachable.
    Offline,
}

impl Connectivity {
    pub fn from_flag(offline: bool) -> Self {
        if offline || env::force_offline() {
            Connectivity::Offline
        } else {
            Connectivity::Probe
        }
    }
}

/// An open sync directory with its manager.
///
/// Holds the exclusive process lock until dropped.
pub struct Session {
    pub manager: Arc<SyncManager>,
    pub config: Config,
    pub tether_dir: PathBuf,
    _lock: File,
}

/// Opens the sync directory found from the current directory.
pub async fn open_session(connectivity: Connectivity) -> Result<Session> {
    let tether_dir = find_tether_dir()?;
    open_session_in(&tether_dir, connectivity).await
}

pub async fn open_session_in(tether_dir: &Path, connectivity: Connectivity) -> Result<Session> {
    let lock = acquire_lock(&lock_path(tether_dir))?;
    let config = load_config(tether_dir)?;

    let client = NetworkClient::new(config.client_config())?;
    let observer = observe(&config, connectivity).await?;
    let manager = SyncManager::create(
        HttpRemote::new(client, &config.remote.url),
        observer,
        DurableQueue::open(JsonlStorage::new(&queue_path(tether_dir))),
        DocumentStore::open(&documents_dir(tether_dir)),
        Arc::new(SystemClock),
        config.sync_config(),
    );

    Ok(Session {
        manager,
        config,
        tether_dir: tether_dir.to_path_buf(),
        _lock: lock,
    })
}

/// Loads the config, applying the `TETHER_REMOTE_URL` override.
pub fn load_config(tether_dir: &Path) -> Result<Config> {
    let config = Config::load(tether_dir)?;
    match env::remote_url() {
        Some(url) => config.with_url(&url),
        None => Ok(config),
    }
}

/// Builds the connectivity observer for a command.
pub async fn observe(
    config: &Config,
    connectivity: Connectivity,
) -> Result<Arc<dyn ConnectivityObserver>> {
    Ok(match connectivity {
        Connectivity::Offline => Arc::new(ManualConnectivity::new(false)),
        Connectivity::Probe => {
            let client = NetworkClient::new(ClientConfig {
                timeout: PROBE_TIMEOUT,
                backoff: config.backoff(),
            })?;
            Arc::new(ProbeConnectivity::start(client, config.probe_url(), PROBE_INTERVAL).await)
        }
    })
}

/// Takes the exclusive lock on the sync directory.
fn acquire_lock(path: &Path) -> Result<File> {
    use fs2::FileExt;

    let file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    file.try_lock_exclusive().map_err(|_| Error::Locked(path.display().to_string()))?;
    Ok(file)
}

/// Formats epoch milliseconds for display.
pub fn format_ms(ms: u64) -> String {
    i64::try_from(ms)
        .ok()
        .and_then(chrono::DateTime::from_timestamp_millis)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ms.to_string())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
