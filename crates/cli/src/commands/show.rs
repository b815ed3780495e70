// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;

use tether_core::{validate_document_id, DocumentSnapshot};

use super::format_ms;
use crate::cli::OutputFormat;
use crate::config::{documents_dir, find_tether_dir};
use crate::error::{Error, Result};
use crate::sync::DocumentStore;

pub fn run(document: &str, output: OutputFormat) -> Result<()> {
    let tether_dir = find_tether_dir()?;
    let rendered = run_impl(&tether_dir, document, output)?;
    println!("{rendered}");
    Ok(())
}

/// Renders a document's local snapshot.
pub(crate) fn run_impl(tether_dir: &Path, document: &str, output: OutputFormat) -> Result<String> {
    validate_document_id(document)?;
    let store = DocumentStore::open(&documents_dir(tether_dir));
    let snapshot =
        store.get(document).ok_or_else(|| Error::DocumentNotFound(document.to_string()))?;

    match output {
        OutputFormat::Json => Ok(serde_json::to_string(&snapshot)?),
        OutputFormat::Text => format_text(document, &snapshot),
    }
}

fn format_text(document: &str, snapshot: &DocumentSnapshot) -> Result<String> {
    let mut out = String::new();
    out.push_str(&format!("Document: {document}\n"));
    out.push_str(&format!("Status: {}", snapshot.sync_status));
    if snapshot.is_dirty {
        out.push_str(" (local changes)");
    }
    out.push('\n');
    out.push_str(&format!("Modified: {}\n", format_ms(snapshot.last_modified)));
    match snapshot.last_synced_at {
        Some(at) => out.push_str(&format!("Synced: {}\n", format_ms(at))),
        None => out.push_str("Synced: never\n"),
    }
    out.push('\n');
    out.push_str(&serde_json::to_string_pretty(&snapshot.content)?);
    Ok(out)
}

#[cfg(test)]
#[path = "show_tests.rs"]
mod tests;
