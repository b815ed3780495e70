// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! All runtime environment variables used by the CLI are defined here
//! with typed accessor functions. The variable name constants are generated
//! by `build.rs` and live in the [`vars`] submodule.

/// Generated environment variable name constants.
pub mod vars {
    include!(concat!(env!("OUT_DIR"), "/env_vars.rs"));
}

/// Returns the log filter directive from `TETHER_LOG`, if set.
pub fn log_filter() -> Option<String> {
    std::env::var(vars::TETHER_LOG).ok().filter(|v| !v.trim().is_empty())
}

/// Returns the remote URL override from `TETHER_REMOTE_URL`, if set.
pub fn remote_url() -> Option<String> {
    std::env::var(vars::TETHER_REMOTE_URL).ok().filter(|v| !v.trim().is_empty())
}

/// Returns `true` if `TETHER_OFFLINE=1`.
pub fn force_offline() -> bool {
    std::env::var(vars::TETHER_OFFLINE).is_ok_and(|v| v == "1")
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
