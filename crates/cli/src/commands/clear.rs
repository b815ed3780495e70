// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use super::{open_session, Connectivity};
use crate::error::Result;

pub async fn run() -> Result<()> {
    let session = open_session(Connectivity::Offline).await?;
    let cleared = session.manager.clear_queue();
    println!("Cleared {cleared} queued change(s)");
    Ok(())
}
