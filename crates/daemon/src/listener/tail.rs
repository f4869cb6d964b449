// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TAIL_LOG: stream a job's log file as `{"line": ...}` frames.

use bobbit_core::JobFilter;
use bobbit_storage::WAIT_POLL_INTERVAL;
use bobbit_wire::{ErrorFrame, LineFrame, TailQuery};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use super::{detect_client_disconnect, DaemonCtx, HandlerError};
use crate::logpath;

/// Handle a TAIL_LOG request: attach to the job's log file, ship appended
/// lines, optionally follow the active writer.
///
/// Owns both stream halves: the reader is watched for client disconnect
/// while frames flow out the writer.
pub(crate) async fn handle<R, W>(
    mut reader: R,
    mut writer: W,
    ctx: &DaemonCtx,
    query: TailQuery,
) -> Result<(), HandlerError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let result = tokio::select! {
        result = stream_log(&mut writer, ctx, &query) => result,
        () = detect_client_disconnect(&mut reader) => {
            debug!("client disconnected, aborting tail");
            return Ok(());
        }
    };

    match result {
        Ok(()) => {
            let _ = writer.shutdown().await;
            Ok(())
        }
        Err(e) => {
            warn!("tail failed: {e}");
            let _ =
                bobbit_wire::write_value(&mut writer, &ErrorFrame { error: e.to_string() }).await;
            Ok(())
        }
    }
}

async fn stream_log<W>(
    writer: &mut W,
    ctx: &DaemonCtx,
    query: &TailQuery,
) -> Result<(), HandlerError>
where
    W: AsyncWrite + Unpin,
{
    let job = ctx
        .store
        .get(&JobFilter::latest(&query.search))?
        .into_iter()
        .next()
        .ok_or(HandlerError::NotFound)?;

    let path = logpath::job_log_path(&ctx.config.data_dir, &job.id, job.created_at);
    let mut file = tokio::fs::File::open(&path)
        .await
        .map_err(|source| HandlerError::LogFile { id: job.id.clone(), source })?;

    let mut chunk = [0u8; 8192];
    let mut pending: Vec<u8> = Vec::new();
    // Set once the store shows the job out of RUNNING; one more read pass
    // then picks up bytes written just before the status flip.
    let mut job_done = false;

    loop {
        let read = file.read(&mut chunk).await?;
        if read > 0 {
            pending.extend_from_slice(&chunk[..read]);
            flush_lines(writer, &mut pending).await?;
            continue;
        }

        if !query.follow || job_done {
            break;
        }
        if !job_is_running(ctx, &job.id)? {
            job_done = true;
            continue;
        }
        tokio::time::sleep(WAIT_POLL_INTERVAL).await;
    }

    // a trailing line without a newline still belongs to the job's output
    if !pending.is_empty() {
        let line = String::from_utf8_lossy(&pending).into_owned();
        bobbit_wire::write_value(writer, &LineFrame { line }).await?;
    }
    Ok(())
}

/// Ship every complete line buffered in `pending`.
async fn flush_lines<W>(writer: &mut W, pending: &mut Vec<u8>) -> Result<(), HandlerError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
        let raw: Vec<u8> = pending.drain(..=pos).collect();
        let line = String::from_utf8_lossy(&raw[..raw.len() - 1]).into_owned();
        bobbit_wire::write_value(writer, &LineFrame { line }).await?;
    }
    Ok(())
}

fn job_is_running(ctx: &DaemonCtx, id: &str) -> Result<bool, HandlerError> {
    let row = ctx.store.get(&JobFilter::by_id(id))?.into_iter().next();
    Ok(row.is_some_and(|job| job.is_running()))
}

#[cfg(test)]
#[path = "tail_tests.rs"]
mod tests;
