// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

/// Unreachable remote used by tests that never go online.
pub const DEAD_REMOTE: &str = "http://127.0.0.1:1";

pub fn tether() -> Command {
    let mut cmd = cargo_bin_cmd!("tether");
    cmd.env_remove("TETHER_OFFLINE").env_remove("TETHER_REMOTE_URL");
    cmd
}

/// Helper to create an initialized temp directory pointing at `url`
pub fn init_temp_with(url: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    tether().arg("init").arg(url).current_dir(temp.path()).assert().success();
    temp
}

/// Helper to create an initialized temp directory with an unreachable remote
pub fn init_temp() -> TempDir {
    init_temp_with(DEAD_REMOTE)
}

/// Helper to write a JSON document file and return its name
pub fn write_doc(temp: &TempDir, name: &str, json: &str) -> String {
    let file = format!("{name}.json");
    std::fs::write(temp.path().join(&file), json).unwrap();
    file
}

/// Helper to push a document while offline
pub fn push_offline(temp: &TempDir, doc: &str, json: &str) {
    let file = write_doc(temp, doc, json);
    tether()
        .args(["push", doc, &file, "--offline"])
        .current_dir(temp.path())
        .assert()
        .success();
}

/// Helper to read `status -o json` output
pub fn status_json(temp: &TempDir) -> serde_json::Value {
    let output = tether()
        .args(["status", "-o", "json", "--offline"])
        .current_dir(temp.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).unwrap()
}
