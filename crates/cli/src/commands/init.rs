// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use crate::config::init_tether_dir;
use crate::error::Result;

pub fn run(url: &str, path: Option<&str>) -> Result<()> {
    let target_path = match path {
        Some(p) => PathBuf::from(p),
        None => std::env::current_dir()?,
    };

    let tether_dir = init_tether_dir(&target_path, url)?;

    println!("Initialized sync directory at {}", tether_dir.display());
    println!("Remote: {}", url.trim_end_matches('/'));
    Ok(())
}
