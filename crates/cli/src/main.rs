// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::fs;
use std::path::Path;

use clap::Parser;
use tetherrs::Cli;

fn main() {
    let cli = Cli::parse();
    let log_path = tetherrs::find_tether_dir().ok().map(|dir| tetherrs::log_path(&dir));
    setup_logging(log_path.as_deref());

    if let Err(e) = tetherrs::run(cli.command) {
        tracing::debug!("command failed: {e}");
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

/// Installs the tracing subscriber, filtered by `TETHER_LOG` (default `info`).
///
/// Events go to `.tether/sync.log` when a sync directory is found and the
/// file can be opened, otherwise to stderr.
fn setup_logging(log_path: Option<&Path>) {
    use tracing_subscriber::EnvFilter;

    let filter = tetherrs::env::log_filter()
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new("info"));

    let file = log_path.and_then(|path| {
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
    });
    if let Some(file) = file {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(file)
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}
