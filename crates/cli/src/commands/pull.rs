// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use super::{format_ms, open_session, Connectivity};
use crate::error::{Error, Result};

pub async fn run(document: &str, offline: bool) -> Result<()> {
    let session = open_session(Connectivity::from_flag(offline)).await?;
    let result = session.manager.pull(document).await;

    if !result.success {
        return Err(Error::Sync(format!(
            "pull failed: {}",
            result.error.unwrap_or_else(|| "unknown error".to_string())
        )));
    }

    match session.manager.document(document) {
        Some(snapshot) => println!(
            "Pulled {document} (modified {}, synced {})",
            format_ms(snapshot.last_modified),
            result.synced_at.map(format_ms).unwrap_or_else(|| "-".to_string())
        ),
        None => println!("Pulled {document}"),
    }
    Ok(())
}
