// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;

use serde::Serialize;
use tether_core::{QueuedChange, SyncStatus};

use super::{format_ms, load_config, observe, Connectivity};
use crate::cli::OutputFormat;
use crate::config::{documents_dir, find_tether_dir, queue_path};
use crate::error::Result;
use crate::sync::{DocumentStore, DurableQueue, JsonlStorage};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReport {
    remote: String,
    online: bool,
    queue: Vec<QueuedChange>,
    documents: Vec<DocumentStatus>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentStatus {
    id: String,
    sync_status: SyncStatus,
    is_dirty: bool,
    last_modified: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_synced_at: Option<u64>,
    queued: usize,
}

pub async fn run(output: OutputFormat, offline: bool) -> Result<()> {
    let tether_dir = find_tether_dir()?;
    let config = load_config(&tether_dir)?;
    let online = observe(&config, Connectivity::from_flag(offline)).await?.is_online();

    let report = build_report(&tether_dir, config.remote.url, online);
    println!("{}", render(&report, output)?);
    Ok(())
}

fn build_report(tether_dir: &Path, remote: String, online: bool) -> StatusReport {
    let queue = DurableQueue::open(JsonlStorage::new(&queue_path(tether_dir)));
    let store = DocumentStore::open(&documents_dir(tether_dir));

    let documents = store
        .ids()
        .into_iter()
        .filter_map(|id| {
            let snapshot = store.get(&id)?;
            Some(DocumentStatus {
                queued: queue.count_for(&id),
                id,
                sync_status: snapshot.sync_status,
                is_dirty: snapshot.is_dirty,
                last_modified: snapshot.last_modified,
                last_synced_at: snapshot.last_synced_at,
            })
        })
        .collect();

    StatusReport {
        remote,
        online,
        queue: queue.all().to_vec(),
        documents,
    }
}

fn render(report: &StatusReport, output: OutputFormat) -> Result<String> {
    if output == OutputFormat::Json {
        return Ok(serde_json::to_string(report)?);
    }

    let mut out = String::new();
    let state = if report.online { "online" } else { "offline" };
    out.push_str(&format!("Remote: {} ({state})\n", report.remote));

    if report.queue.is_empty() {
        out.push_str("Queue: empty\n");
    } else {
        out.push_str(&format!("Queue: {} pending change(s)\n", report.queue.len()));
        for change in &report.queue {
            out.push_str(&format!(
                "  {}  {}  retries {}  queued {}\n",
                change.id,
                change.document_id,
                change.retries,
                format_ms(change.enqueued_at)
            ));
        }
    }

    if report.documents.is_empty() {
        out.push_str("Documents: none");
    } else {
        out.push_str("Documents:");
        for doc in &report.documents {
            out.push_str(&format!("\n  {}  {}", doc.id, doc.sync_status));
            if doc.is_dirty {
                out.push_str(" (local changes)");
            }
            if let Some(at) = doc.last_synced_at {
                out.push_str(&format!("  synced {}", format_ms(at)));
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
