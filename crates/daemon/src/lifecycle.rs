// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: startup checks, socket binding, graceful shutdown.

use std::os::unix::fs::{FileTypeExt, PermissionsExt};
use std::path::PathBuf;
use std::sync::Arc;

use bobbit_core::JobFilter;
use bobbit_storage::StoreError;
use thiserror::Error;
use tokio::net::UnixListener;
use tracing::{info, warn};

use crate::env::Config;
use crate::executor;
use crate::listener::DaemonCtx;
use crate::logpath;

/// Lifecycle errors. Any of these at startup exits the daemon with code 100.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("socket {0} already exists: is another bobbitd running?")]
    AlreadyRunning(PathBuf),

    #[error("failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, #[source] std::io::Error),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything startup produces: the shared handler context and the bound
/// listener, returned separately so main can spawn the accept loop.
pub struct StartupResult {
    pub ctx: Arc<DaemonCtx>,
    pub listener: UnixListener,
}

/// Start the daemon: refuse a live socket, create the data root, open the
/// store, bind the listener.
///
/// Must be called from within the tokio runtime (the listener registers
/// with the reactor at bind time).
pub fn startup(config: Config) -> Result<StartupResult, LifecycleError> {
    // An existing socket file means a daemon is (or recently was) bound
    // here. Refuse rather than steal the path out from under it.
    match std::fs::metadata(&config.socket_path) {
        Ok(meta) if meta.file_type().is_socket() => {
            return Err(LifecycleError::AlreadyRunning(config.socket_path));
        }
        Ok(_) => {
            // leftover non-socket file; clear it before binding
            std::fs::remove_file(&config.socket_path)?;
        }
        Err(_) => {}
    }

    logpath::create_dir_tree(&config.data_dir)?;
    let store = bobbit_storage::JobStore::open(&config.data_dir)?;

    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    // Not world-accessible: the socket is the only access control there is.
    let mut perms = std::fs::metadata(&config.socket_path)?.permissions();
    perms.set_mode(0o600);
    std::fs::set_permissions(&config.socket_path, perms)?;

    info!(
        socket = %config.socket_path.display(),
        data_dir = %config.data_dir.display(),
        "daemon started"
    );
    Ok(StartupResult { ctx: Arc::new(DaemonCtx { config, store }), listener })
}

/// Graceful shutdown: terminate every RUNNING job's process group, then
/// remove the socket file.
pub fn shutdown(ctx: &DaemonCtx) {
    info!("shutting down daemon...");

    match ctx.store.get(&JobFilter { active_only: true, ..JobFilter::default() }) {
        Ok(running) => {
            for job in running {
                if let Err(e) = executor::stop_job(ctx, &job) {
                    warn!(job_id = %job.id, "failed to stop job on shutdown: {e}");
                }
            }
        }
        Err(e) => warn!("could not enumerate running jobs: {e}"),
    }

    if ctx.config.socket_path.exists() {
        if let Err(e) = std::fs::remove_file(&ctx.config.socket_path) {
            warn!("failed to remove socket file: {e}");
        }
    }

    info!("daemon shutdown complete");
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
