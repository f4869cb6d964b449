// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment-driven configuration shared by the daemon and the CLI.

use std::path::PathBuf;

/// Default Unix socket path when `BOBBIT_SOCKET_PATH` is unset.
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/bobbitd.sock";

/// Default data root when neither `BOBBIT_DATA_DIR` nor `BOBBITD_LOGS_DIR`
/// is set.
pub const DEFAULT_DATA_DIR: &str = "/tmp/bobbitd";

fn env_or(var: &str, default: &str) -> String {
    match std::env::var(var) {
        Ok(value) if !value.is_empty() => value,
        _ => default.to_string(),
    }
}

/// Path of the daemon's Unix stream socket.
pub fn socket_path() -> PathBuf {
    PathBuf::from(env_or("BOBBIT_SOCKET_PATH", DEFAULT_SOCKET_PATH))
}

/// Data root holding `metadata.db` and the per-job log tree.
///
/// `BOBBIT_DATA_DIR` wins; `BOBBITD_LOGS_DIR` is the older name and is kept
/// as a fallback.
pub fn data_dir() -> PathBuf {
    match std::env::var("BOBBIT_DATA_DIR") {
        Ok(value) if !value.is_empty() => PathBuf::from(value),
        _ => PathBuf::from(env_or("BOBBITD_LOGS_DIR", DEFAULT_DATA_DIR)),
    }
}

/// `DEBUG` set to any non-empty value enables verbose logging.
pub fn debug_enabled() -> bool {
    std::env::var("DEBUG").map(|v| !v.is_empty()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env-var reads are process-global; mutate distinct variables per test
    // so parallel execution stays safe.

    #[test]
    fn socket_path_default() {
        assert_eq!(socket_path(), PathBuf::from(DEFAULT_SOCKET_PATH));
    }

    #[test]
    fn data_dir_default() {
        assert_eq!(data_dir(), PathBuf::from(DEFAULT_DATA_DIR));
    }

    #[test]
    fn env_or_ignores_empty() {
        assert_eq!(env_or("BOBBIT_TEST_UNSET_VAR", "fallback"), "fallback");
    }
}
