// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Local snapshot records.
//!
//! One JSON file per document under the store directory
//! (`documents/<id>.json`). Writes replace the file atomically through a
//! temporary sibling and a rename. Records are cached after first read.
//!
//! Like the queue, a failed write never fails the caller: the cached value
//! is kept, a warning is logged and the store is marked degraded.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tether_core::{validate_document_id, DocumentSnapshot};

const RECORD_EXT: &str = "json";

/// Persisted current snapshot of each document.
pub struct DocumentStore {
    dir: Option<PathBuf>,
    cache: Mutex<HashMap<String, DocumentSnapshot>>,
    degraded: AtomicBool,
}

impl DocumentStore {
    /// Opens a store rooted at `dir`. The directory is created on first write.
    pub fn open(dir: &Path) -> Self {
        DocumentStore {
            dir: Some(dir.to_path_buf()),
            cache: Mutex::new(HashMap::new()),
            degraded: AtomicBool::new(false),
        }
    }

    /// A store that never touches the filesystem.
    pub fn in_memory() -> Self {
        DocumentStore {
            dir: None,
            cache: Mutex::new(HashMap::new()),
            degraded: AtomicBool::new(false),
        }
    }

    /// Returns the current snapshot of a document, if any.
    pub fn get(&self, document_id: &str) -> Option<DocumentSnapshot> {
        let mut cache = self.lock();
        if let Some(snapshot) = cache.get(document_id) {
            return Some(snapshot.clone());
        }
        let snapshot = self.load(document_id)?;
        cache.insert(document_id.to_string(), snapshot.clone());
        Some(snapshot)
    }

    /// Stores `snapshot` as the current state of a document.
    pub fn put(&self, document_id: &str, snapshot: DocumentSnapshot) {
        if let Some(path) = self.record_path(document_id) {
            if let Err(e) = write_record(&path, &snapshot) {
                self.degrade(document_id, &e);
            }
        }
        self.lock().insert(document_id.to_string(), snapshot);
    }

    /// Forgets a document. Returns the snapshot it held.
    pub fn remove(&self, document_id: &str) -> Option<DocumentSnapshot> {
        let previous = self.get(document_id);
        self.lock().remove(document_id);
        if let Some(path) = self.record_path(document_id) {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => self.degrade(document_id, &e.into()),
            }
        }
        previous
    }

    /// Ids of every known document, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.lock().keys().cloned().collect();
        if let Some(entries) = self.dir.as_ref().and_then(|dir| fs::read_dir(dir).ok()) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXT) {
                    continue;
                }
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    if validate_document_id(stem).is_ok() {
                        ids.push(stem.to_string());
                    }
                }
            }
        }
        ids.sort();
        ids.dedup();
        ids
    }

    /// True once a write has failed this session.
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, DocumentSnapshot>> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record_path(&self, document_id: &str) -> Option<PathBuf> {
        let dir = self.dir.as_ref()?;
        if let Err(e) = validate_document_id(document_id) {
            tracing::warn!("not persisting document: {e}");
            return None;
        }
        Some(dir.join(format!("{document_id}.{RECORD_EXT}")))
    }

    fn load(&self, document_id: &str) -> Option<DocumentSnapshot> {
        let path = self.record_path(document_id)?;
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(document = document_id, "document record unreadable: {e}");
                return None;
            }
        };
        match serde_json::from_slice(&data) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(document = document_id, "document record corrupt, ignoring: {e}");
                None
            }
        }
    }

    fn degrade(&self, document_id: &str, error: &tether_core::Error) {
        tracing::warn!(
            document = document_id,
            "document persistence failed, keeping in memory: {error}"
        );
        self.degraded.store(true, Ordering::SeqCst);
    }
}

fn write_record(path: &Path, snapshot: &DocumentSnapshot) -> tether_core::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension(format!("{RECORD_EXT}.tmp"));
    {
        let mut file = File::create(&tmp)?;
        serde_json::to_writer_pretty(&mut file, snapshot)?;
        file.write_all(b"\n")?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
