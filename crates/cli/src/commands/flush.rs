// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use super::{open_session, Connectivity};
use crate::error::{Error, Result};

pub async fn run() -> Result<()> {
    let session = open_session(Connectivity::from_flag(false)).await?;
    let manager = &session.manager;

    let report = manager.flush().await;
    let remaining = manager.queue_len();

    if report.skipped {
        if remaining == 0 {
            println!("Nothing to flush");
        } else if !manager.is_online() {
            println!("Offline: {remaining} change(s) queued");
        } else {
            println!("Flush already running: {remaining} change(s) queued");
        }
        return Ok(());
    }

    println!("Flushed {} change(s), {remaining} remaining", report.synced);
    for dropped in &report.dropped {
        eprintln!(
            "warning: dropped {} for {} after {} attempt(s): {}",
            dropped.id, dropped.document_id, dropped.attempts, dropped.last_error
        );
    }
    if report.has_data_loss() {
        return Err(Error::Sync(format!(
            "{} change(s) dropped after exhausting retries",
            report.dropped.len()
        )));
    }
    Ok(())
}
