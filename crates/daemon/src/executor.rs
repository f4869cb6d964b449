// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job execution engine: launch a child command in its own process group,
//! stream its output to the job's log file, persist the terminal exit.

use std::os::unix::process::CommandExt;
use std::process::Stdio;

use bobbit_core::{generate_job_id, Job, JobStatus};
use bobbit_wire::JobDetail;
use chrono::{DateTime, Utc};
use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use tracing::{info, warn};

use crate::listener::{DaemonCtx, HandlerError};
use crate::logpath;

/// Execute one validated EXECUTE request to completion.
///
/// The row is inserted as `NOT_RUNNING`, flipped to `RUNNING` once the
/// child is launched, and settled via `mark_finished` after the child is
/// reaped. A failed launch rolls the row back so no phantom job remains.
pub(crate) async fn execute(
    ctx: &DaemonCtx,
    mut detail: JobDetail,
    received_at: DateTime<Utc>,
) -> Result<(), HandlerError> {
    if detail.job_name.is_empty() || detail.command.is_empty() {
        return Err(HandlerError::BadRequest(
            "job_name or command not provided".to_string(),
        ));
    }
    if detail.id.is_empty() {
        detail.id = generate_job_id();
    }
    let created_at = detail.created_at.unwrap_or(received_at);
    let updated_at = detail.updated_at.unwrap_or(created_at);

    let metadata_json = if detail.metadata.is_empty() {
        String::new()
    } else {
        serde_json::to_string(&detail.metadata)
            .map_err(|e| HandlerError::BadRequest(format!("unserializable metadata: {e}")))?
    };

    let stdout_log = logpath::create_log_file(&ctx.config.data_dir, &detail.id, created_at)
        .map_err(|source| HandlerError::LogFile { id: detail.id.clone(), source })?;
    let stderr_log = stdout_log
        .try_clone()
        .map_err(|source| HandlerError::LogFile { id: detail.id.clone(), source })?;

    let job = Job {
        id: detail.id,
        job_name: detail.job_name,
        command: detail.command,
        status: JobStatus::NotRunning,
        exit_code: -1,
        pid: 0,
        metadata: detail.metadata,
        created_at,
        updated_at,
    };
    ctx.store.insert(&job)?;

    // The child leads its own process group so the stop path can signal
    // the whole tree with one killpg.
    let mut command = std::process::Command::new(&job.command[0]);
    command
        .args(&job.command[1..])
        .env("JOB_ID", &job.id)
        .env("JOB_NAME", &job.job_name)
        .env("JOB_METADATA", &metadata_json)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout_log))
        .stderr(Stdio::from(stderr_log))
        .process_group(0);

    let mut child = match tokio::process::Command::from(command).spawn() {
        Ok(child) => child,
        Err(source) => {
            if let Err(e) = ctx.store.delete(&job.id) {
                warn!(job_id = %job.id, "failed to roll back unlaunched job: {e}");
            }
            return Err(HandlerError::LaunchFailed { id: job.id.clone(), source });
        }
    };

    let pid = child.id().map(|p| p as i32).unwrap_or(0);
    let mut running = job.clone();
    running.status = JobStatus::Running;
    running.pid = pid;
    if let Err(e) = ctx.store.update(&running) {
        warn!(job_id = %job.id, "failed to record running state: {e}");
    }
    info!(job_id = %job.id, job_name = %job.job_name, pid, "job started");

    let exit_code = match child.wait().await {
        // killed by a signal → no code → 127
        Ok(status) => status.code().unwrap_or(127),
        Err(e) => {
            warn!(job_id = %job.id, "failed to reap child: {e}");
            127
        }
    };
    ctx.store.mark_finished(&job.id, exit_code)?;
    info!(job_id = %job.id, exit_code, "job finished");

    if exit_code > 0 {
        return Err(HandlerError::NonZeroExit { id: job.id.clone(), code: exit_code });
    }
    Ok(())
}

/// Terminate a running job's process group and record `STOPPED`.
///
/// Returns `false` without touching anything when the job is not running -
/// STOP on a settled job is a no-op. The executor's reaper still owns the
/// final `mark_finished` for the signalled child, so the row may settle as
/// `FAILED` shortly after.
pub(crate) fn stop_job(ctx: &DaemonCtx, job: &Job) -> Result<bool, HandlerError> {
    if !job.is_running() || job.pid <= 0 {
        return Ok(false);
    }

    match killpg(Pid::from_raw(job.pid), Signal::SIGTERM) {
        // the group died on its own; proceed to record the stop
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(source) => {
            return Err(HandlerError::Signal { id: job.id.clone(), source });
        }
    }

    let mut stopped = job.clone();
    stopped.status = JobStatus::Stopped;
    stopped.pid = 0;
    ctx.store.update(&stopped)?;
    info!(job_id = %job.id, "job stopped");
    Ok(true)
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
