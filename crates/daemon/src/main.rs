// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! bobbitd: the bobbit job supervisor daemon.

use std::sync::Arc;

use bobbit_daemon::{lifecycle, Config, Listener};
use tracing::error;
use tracing_subscriber::EnvFilter;

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let config = Config::load();
    init_tracing(config.debug);

    let startup = match lifecycle::startup(config) {
        Ok(result) => result,
        Err(e) => {
            error!("startup failed: {e}");
            std::process::exit(100);
        }
    };

    let ctx = Arc::clone(&startup.ctx);
    let listener = Listener::new(startup.listener, startup.ctx);

    tokio::select! {
        () = listener.run() => {}
        () = shutdown_signal() => {}
    }

    lifecycle::shutdown(&ctx);
}

/// Resolve when SIGINT or SIGTERM arrives.
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let ctrl_c = tokio::signal::ctrl_c();
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = ctrl_c => {}
                _ = sigterm.recv() => {}
            }
        }
        Err(e) => {
            error!("cannot install SIGTERM handler: {e}");
            let _ = ctrl_c.await;
        }
    }
}
