// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Project configuration management.
//!
//! Configuration is stored in `.tether/config.toml`:
//!
//! ```toml
//! [remote]
//! url = "https://sync.example.com/api"
//! timeout_secs = 30
//! push_retries = 0
//!
//! [queue]
//! max_retries = 5
//! backoff_base_ms = 1000
//! backoff_jitter_ms = 500
//!
//! [connectivity]
//! probe_path = "/health"
//! ```
//!
//! Everything but `remote.url` is optional.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::sync::{Backoff, ClientConfig, SyncConfig, DEFAULT_MAX_RETRIES};

const TETHER_DIR_NAME: &str = ".tether";
const CONFIG_FILE_NAME: &str = "config.toml";
const QUEUE_FILE_NAME: &str = "queue.jsonl";
const DOCUMENTS_DIR_NAME: &str = "documents";
const LOCK_FILE_NAME: &str = "tether.lock";
const LOG_FILE_NAME: &str = "sync.log";
const GITIGNORE_FILE_NAME: &str = ".gitignore";

/// Project configuration stored in `.tether/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub remote: RemoteConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub connectivity: ConnectivityConfig,
}

/// Remote document store settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the document store (`http://` or `https://`).
    pub url: String,
    /// Per-request timeout in seconds (default: 30).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Network-level retries for an online push (default: 0).
    #[serde(default)]
    pub push_retries: u32,
}

/// Offline queue settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Failed flush attempts before a change is dropped (default: 5).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base of the exponential backoff in milliseconds (default: 1000).
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    /// Upper bound of the random jitter in milliseconds (default: 500).
    #[serde(default = "default_backoff_jitter_ms")]
    pub backoff_jitter_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        QueueConfig {
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_jitter_ms: default_backoff_jitter_ms(),
        }
    }
}

/// Connectivity probe settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectivityConfig {
    /// Path under the remote URL answering 2xx while the store is reachable.
    #[serde(default = "default_probe_path")]
    pub probe_path: String,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        ConnectivityConfig {
            probe_path: default_probe_path(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_backoff_base_ms() -> u64 {
    1000
}

fn default_backoff_jitter_ms() -> u64 {
    500
}

fn default_probe_path() -> String {
    "/health".to_string()
}

/// Checks that `url` is an http(s) URL with a host.
pub fn validate_url(url: &str) -> Result<()> {
    let rest = url.strip_prefix("https://").or_else(|| url.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() && !host.starts_with('/') => Ok(()),
        _ => Err(Error::InvalidRemoteUrl(url.to_string())),
    }
}

impl Config {
    /// Creates a config pointing at `url` with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRemoteUrl`] if the url is not http(s).
    pub fn new(url: &str) -> Result<Self> {
        validate_url(url)?;
        Ok(Config {
            remote: RemoteConfig {
                url: url.trim_end_matches('/').to_string(),
                timeout_secs: default_timeout_secs(),
                push_retries: 0,
            },
            queue: QueueConfig::default(),
            connectivity: ConnectivityConfig::default(),
        })
    }

    /// Loads configuration from the given `.tether/` directory.
    pub fn load(tether_dir: &Path) -> Result<Self> {
        let config_path = tether_dir.join(CONFIG_FILE_NAME);
        let content = fs::read_to_string(&config_path)
            .map_err(|e| Error::Config(format!("failed to read config: {}", e)))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        validate_url(&config.remote.url)?;
        Ok(config)
    }

    /// Saves configuration to the given `.tether/` directory.
    pub fn save(&self, tether_dir: &Path) -> Result<()> {
        let config_path = tether_dir.join(CONFIG_FILE_NAME);
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        fs::write(&config_path, content)?;
        Ok(())
    }

    /// Returns a copy whose remote url is replaced by `url`.
    pub fn with_url(mut self, url: &str) -> Result<Self> {
        validate_url(url)?;
        self.remote.url = url.trim_end_matches('/').to_string();
        Ok(self)
    }

    /// Backoff between failed flush attempts.
    pub fn backoff(&self) -> Backoff {
        Backoff {
            base: Duration::from_millis(self.queue.backoff_base_ms),
            max_jitter: Duration::from_millis(self.queue.backoff_jitter_ms),
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(self.remote.timeout_secs),
            backoff: self.backoff(),
        }
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            max_retries: self.queue.max_retries,
            push_retries: self.remote.push_retries,
            backoff: self.backoff(),
        }
    }

    /// Full URL of the connectivity probe.
    pub fn probe_url(&self) -> String {
        let path = self.connectivity.probe_path.trim_start_matches('/');
        format!("{}/{path}", self.remote.url.trim_end_matches('/'))
    }
}

/// Find the .tether directory by walking up from the current directory
pub fn find_tether_dir() -> Result<PathBuf> {
    let mut current = std::env::current_dir()?;
    loop {
        let tether_dir = current.join(TETHER_DIR_NAME);
        if tether_dir.join(CONFIG_FILE_NAME).is_file() {
            return Ok(tether_dir);
        }
        if !current.pop() {
            return Err(Error::NotInitialized);
        }
    }
}

/// Initialize a new .tether directory at the given path
pub fn init_tether_dir(path: &Path, url: &str) -> Result<PathBuf> {
    let tether_dir = path.join(TETHER_DIR_NAME);

    if tether_dir.join(CONFIG_FILE_NAME).exists() {
        return Err(Error::AlreadyInitialized(tether_dir.display().to_string()));
    }

    let config = Config::new(url)?;
    fs::create_dir_all(tether_dir.join(DOCUMENTS_DIR_NAME))?;
    config.save(&tether_dir)?;
    write_gitignore(&tether_dir)?;

    Ok(tether_dir)
}

pub fn queue_path(tether_dir: &Path) -> PathBuf {
    tether_dir.join(QUEUE_FILE_NAME)
}

pub fn documents_dir(tether_dir: &Path) -> PathBuf {
    tether_dir.join(DOCUMENTS_DIR_NAME)
}

pub fn lock_path(tether_dir: &Path) -> PathBuf {
    tether_dir.join(LOCK_FILE_NAME)
}

pub fn log_path(tether_dir: &Path) -> PathBuf {
    tether_dir.join(LOG_FILE_NAME)
}

/// Write a .gitignore file to the tether directory.
///
/// Local state (queue, documents, lock, log) is ignored; only the
/// configuration is meant to be shared.
pub fn write_gitignore(tether_dir: &Path) -> Result<()> {
    let content = format!(
        "# Local sync state\n{QUEUE_FILE_NAME}\n{DOCUMENTS_DIR_NAME}/\n{LOCK_FILE_NAME}\n\
         {LOG_FILE_NAME}\n"
    );
    fs::write(tether_dir.join(GITIGNORE_FILE_NAME), content)?;
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
