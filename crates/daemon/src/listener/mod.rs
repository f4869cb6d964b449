// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task and per-connection request dispatcher.
//!
//! The listener accepts connections and spawns one task per connection.
//! Each connection carries exactly one request; handlers that block (WAIT)
//! are raced against client disconnect so an abandoned connection does not
//! leak a polling task.

mod jobs;
mod tail;

use std::sync::Arc;

use bobbit_storage::{JobStore, StoreError};
use bobbit_wire::{
    CountReply, Envelope, ErrorFrame, JobReply, RequestBody, WireError,
};
use chrono::Utc;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Instrument};

use crate::env::{self, Config};
use crate::executor;

/// Shared daemon context for all request handlers.
pub struct DaemonCtx {
    pub config: Config,
    pub store: JobStore,
}

/// Listener task accepting socket connections.
pub struct Listener {
    unix: UnixListener,
    ctx: Arc<DaemonCtx>,
}

/// Errors surfaced by request handlers.
///
/// The dispatcher is the sole site that encodes these as `{"error": ...}`
/// frames; handlers never write both a success body and an error.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Invalid payload: {0}")]
    BadRequest(String),

    #[error("No job found")]
    NotFound,

    #[error("Failed to launch job {id}: {source}")]
    LaunchFailed {
        id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Job {id} exited with code {code}")]
    NonZeroExit { id: String, code: i32 },

    #[error("Failed to open log file for job {id}: {source}")]
    LogFile {
        id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to signal job {id}: {source}")]
    Signal {
        id: String,
        #[source]
        source: nix::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Protocol error: {0}")]
    Wire(#[from] WireError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HandlerError {
    /// Cancellation is not an error; the connection just goes away.
    fn is_silent(&self) -> bool {
        matches!(self, HandlerError::Store(StoreError::Cancelled))
    }
}

/// Result of a successfully dispatched request.
#[derive(Debug)]
pub(crate) enum Outcome {
    /// No response body; the clean close is the answer (EXECUTE, VIBE_CHECK).
    None,
    Job(JobReply),
    Jobs(Vec<JobReply>),
    Count(i64),
}

impl Listener {
    pub fn new(unix: UnixListener, ctx: Arc<DaemonCtx>) -> Self {
        Self { unix, ctx }
    }

    /// Accept loop. Per-accept failures are logged and tolerated; each
    /// connection runs in its own task.
    pub async fn run(self) {
        loop {
            match self.unix.accept().await {
                Ok((stream, _)) => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        // short correlation id for cross-referencing log lines
                        let conn_id: String =
                            bobbit_core::generate_job_id().chars().take(8).collect();
                        let span = tracing::debug_span!("conn", id = %conn_id);
                        let (reader, writer) = stream.into_split();
                        if let Err(e) =
                            handle_connection(BufReader::new(reader), writer, &ctx)
                                .instrument(span)
                                .await
                        {
                            warn!("connection error: {e}");
                        }
                    });
                }
                Err(e) => error!("accept error: {e}"),
            }
        }
    }
}

/// Handle a single client connection: decode one envelope, route it, write
/// zero or more response frames, close.
///
/// Generic over reader/writer so tests can drive it with in-memory streams.
async fn handle_connection<R, W>(
    mut reader: R,
    mut writer: W,
    ctx: &DaemonCtx,
) -> Result<(), HandlerError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut envelope: Envelope =
        match bobbit_wire::read_value(&mut reader, env::ipc_timeout()).await {
            Ok(envelope) => envelope,
            Err(WireError::ConnectionClosed) => {
                debug!("client disconnected before sending a request");
                return Ok(());
            }
            Err(e) => {
                // Transport/decode failure is fatal to the connection; no
                // error frame, the peer may not even speak the protocol.
                warn!("failed to decode request: {e}");
                return Ok(());
            }
        };
    let received_at = envelope.timestamp.unwrap_or_else(Utc::now);
    envelope.timestamp = Some(received_at);

    let body = match envelope.body() {
        Ok(body) => body,
        Err(e) => {
            warn!("bad request metadata: {e}");
            let _ = bobbit_wire::write_value(
                &mut writer,
                &ErrorFrame { error: format!("Invalid payload: {e}") },
            )
            .await;
            return Ok(());
        }
    };

    // LIST and VIBE_CHECK are frequent polling traffic; keep them at debug
    match &body {
        RequestBody::List(_) | RequestBody::VibeCheck => {
            debug!(kind = %envelope.request, "request received");
        }
        _ => info!(kind = %envelope.request, "request received"),
    }

    let body = match body {
        // TAIL_LOG streams frames and owns the connection until done.
        RequestBody::TailLog(query) => {
            return tail::handle(reader, writer, ctx, query).await;
        }
        // EXECUTE runs the job to completion. The submitting client may
        // hang up immediately; the job must keep running, so there is no
        // disconnect race.
        RequestBody::Execute(detail) => {
            if let Err(e) = executor::execute(ctx, detail, received_at).await {
                log_handler_error(&e);
                let _ = bobbit_wire::write_value(
                    &mut writer,
                    &ErrorFrame { error: e.to_string() },
                )
                .await;
            }
            return Ok(());
        }
        other => other,
    };

    let is_wait = matches!(body, RequestBody::Wait(_));

    // Race the handler against client disconnect so an abandoned WAIT does
    // not keep polling the store.
    let cancel = CancellationToken::new();
    let outcome = tokio::select! {
        result = dispatch(body, ctx, &cancel) => result,
        () = detect_client_disconnect(&mut reader) => {
            cancel.cancel();
            debug!("client disconnected, cancelling handler");
            return Ok(());
        }
    };

    match outcome {
        Ok(Outcome::None) => {}
        Ok(Outcome::Job(reply)) => bobbit_wire::write_value(&mut writer, &reply).await?,
        Ok(Outcome::Jobs(replies)) => bobbit_wire::write_value(&mut writer, &replies).await?,
        Ok(Outcome::Count(count)) => {
            bobbit_wire::write_value(&mut writer, &CountReply { count }).await?;
        }
        Err(e) if e.is_silent() => return Ok(()),
        Err(e) => {
            log_handler_error(&e);
            let _ = bobbit_wire::write_value(&mut writer, &ErrorFrame { error: e.to_string() })
                .await;
            return Ok(());
        }
    }

    if is_wait {
        // Half-close so the client sees EOF after the single reply, then
        // drain whatever the read side still holds.
        let _ = writer.shutdown().await;
        drain(&mut reader).await;
    }

    Ok(())
}

/// Route a decoded request to its handler.
async fn dispatch(
    body: RequestBody,
    ctx: &DaemonCtx,
    cancel: &CancellationToken,
) -> Result<Outcome, HandlerError> {
    match body {
        RequestBody::VibeCheck => Ok(Outcome::None),
        RequestBody::List(query) => jobs::handle_list(ctx, &query),
        RequestBody::Status(query) => jobs::handle_status(ctx, &query.search),
        RequestBody::Wait(query) => jobs::handle_wait(ctx, &query.search, cancel).await,
        RequestBody::Stop(query) => jobs::handle_stop(ctx, &query.search),
        // Intercepted in handle_connection before reaching dispatch
        RequestBody::Execute(_) | RequestBody::TailLog(_) => unreachable!(),
    }
}

fn log_handler_error(e: &HandlerError) {
    match e {
        HandlerError::BadRequest(_) | HandlerError::NotFound => debug!("{e}"),
        HandlerError::NonZeroExit { .. } => info!("{e}"),
        _ => warn!("{e}"),
    }
}

/// Detect client disconnect by reading from the socket after the request.
///
/// The client sends one request then waits; a read completing (EOF or
/// stray bytes) means it is no longer waiting for us.
async fn detect_client_disconnect<R: AsyncRead + Unpin>(reader: &mut R) {
    let mut buf = [0u8; 1];
    let _ = reader.read(&mut buf).await;
}

/// Consume the read side until EOF after a half-close.
async fn drain<R: AsyncRead + Unpin>(reader: &mut R) {
    let mut buf = [0u8; 256];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
    }
}

#[cfg(test)]
pub(crate) fn test_ctx(dir: &std::path::Path) -> DaemonCtx {
    DaemonCtx {
        config: Config {
            socket_path: dir.join("bobbitd.sock"),
            data_dir: dir.to_path_buf(),
            debug: false,
        },
        store: JobStore::open_in_memory().unwrap(),
    }
}

#[cfg(test)]
#[path = "../listener_tests.rs"]
mod tests;
