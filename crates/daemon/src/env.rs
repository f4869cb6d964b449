// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration, resolved once at startup from the environment.

use std::path::PathBuf;
use std::time::Duration;

/// Resolved daemon configuration.
///
/// Handlers receive this through [`crate::listener::DaemonCtx`]; nothing in
/// the daemon reads the environment after startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the Unix stream socket clients connect to.
    pub socket_path: PathBuf,
    /// Root directory holding `metadata.db` and `logs/`.
    pub data_dir: PathBuf,
    /// Verbose logging (`DEBUG` set to a non-empty value).
    pub debug: bool,
}

impl Config {
    /// Load configuration from `BOBBIT_SOCKET_PATH`, `BOBBIT_DATA_DIR` /
    /// `BOBBITD_LOGS_DIR`, and `DEBUG`.
    pub fn load() -> Self {
        Self {
            socket_path: bobbit_core::config::socket_path(),
            data_dir: bobbit_core::config::data_dir(),
            debug: bobbit_core::config::debug_enabled(),
        }
    }
}

/// Deadline for reading the request envelope off a fresh connection.
pub fn ipc_timeout() -> Duration {
    std::env::var("BOBBIT_IPC_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}
