// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Read;
use std::path::Path;

use bytes::Bytes;
use serde_json::Value;
use tether_core::{validate_document_id, ClockSource, DocumentSnapshot, SystemClock};

use super::{format_ms, open_session, Connectivity};
use crate::error::{Error, Result};

pub async fn run(
    document: &str,
    file: &str,
    attachment: Option<&str>,
    offline: bool,
) -> Result<()> {
    validate_document_id(document)?;
    let content = read_content(file)?;

    let session = open_session(Connectivity::from_flag(offline)).await?;
    let manager = &session.manager;

    // Queued changes only carry references to already uploaded attachments
    if let Some(path) = attachment {
        if !manager.is_online() {
            return Err(Error::AttachmentOffline(path.to_string()));
        }
    }

    let attachment = match attachment {
        Some(path) => {
            let bytes = Bytes::from(std::fs::read(Path::new(path))?);
            Some(manager.upload(bytes).await?)
        }
        None => None,
    };

    let now = SystemClock.now_ms();
    let snapshot = match manager.document(document) {
        Some(existing) => existing.edit(content, now),
        None => DocumentSnapshot::new(content, now),
    };

    let result = manager.push(document, &snapshot, attachment).await;
    if result.success {
        match result.synced_at {
            Some(at) => println!("Pushed {document} (synced {})", format_ms(at)),
            None => println!("Pushed {document}"),
        }
        return Ok(());
    }
    if result.queued {
        println!(
            "Queued {document}: {} ({} pending)",
            result.error.unwrap_or_default(),
            manager.queue_len()
        );
        return Ok(());
    }
    Err(Error::Sync(format!(
        "push failed: {}",
        result.error.unwrap_or_else(|| "unknown error".to_string())
    )))
}

/// Reads JSON content from a file, or stdin for `-`.
fn read_content(file: &str) -> Result<Value> {
    let text = if file == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(file)?
    };
    Ok(serde_json::from_str(&text)?)
}
