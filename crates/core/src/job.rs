// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job record and status enum.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle status of a job.
///
/// Each variant maps to a distinct bit so that subsets can be tested with a
/// bitwise AND: the store's `finish_only` filter matches
/// `status & (FINISH | FAILED)` in a single predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum JobStatus {
    /// The executor currently has an unreaped child for this job.
    Running,
    /// The child exited with code 0.
    Finish,
    /// The child exited non-zero or was killed by a signal.
    Failed,
    /// Row inserted, child not launched yet.
    NotRunning,
    /// Terminated externally via the stop handler or daemon shutdown.
    Stopped,
}

impl JobStatus {
    /// Statuses that settle a job for good: the child has been reaped or
    /// externally terminated. `NotRunning` is excluded: it is the
    /// pre-launch state and a job passes through it on the way up.
    pub const TERMINAL_MASK: i32 =
        JobStatus::Finish.bits() | JobStatus::Failed.bits() | JobStatus::Stopped.bits();

    /// Mask matched by the `finish_only` filter.
    pub const FINISHED_MASK: i32 = JobStatus::Finish.bits() | JobStatus::Failed.bits();

    /// The wire and database representation of this status.
    pub const fn bits(self) -> i32 {
        match self {
            JobStatus::Running => 1,
            JobStatus::Finish => 2,
            JobStatus::Failed => 4,
            JobStatus::NotRunning => 8,
            JobStatus::Stopped => 16,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.bits() & Self::TERMINAL_MASK != 0
    }

    /// Human-readable label used by the CLI.
    pub fn label(self) -> &'static str {
        match self {
            JobStatus::Running => "Running",
            JobStatus::Finish => "Finished",
            JobStatus::Failed => "Failed",
            JobStatus::NotRunning => "Not running",
            JobStatus::Stopped => "Stopped",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Error for an integer that names no [`JobStatus`] variant.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown job status {0}")]
pub struct UnknownStatus(pub i32);

impl TryFrom<i32> for JobStatus {
    type Error = UnknownStatus;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(JobStatus::Running),
            2 => Ok(JobStatus::Finish),
            4 => Ok(JobStatus::Failed),
            8 => Ok(JobStatus::NotRunning),
            16 => Ok(JobStatus::Stopped),
            other => Err(UnknownStatus(other)),
        }
    }
}

impl From<JobStatus> for i32 {
    fn from(status: JobStatus) -> i32 {
        status.bits()
    }
}

/// A single row of the job store.
///
/// The store owns all rows and is the single source of truth for `status`;
/// after insertion only the executor (and the stop path) write `status`,
/// `pid`, and `exit_code`.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    /// Stable opaque identifier, unique within the store.
    pub id: String,
    /// Human label; may repeat across jobs.
    pub job_name: String,
    /// Argv vector; never empty for a validly created job.
    pub command: Vec<String>,
    pub status: JobStatus,
    /// `-1` until the child has been reaped.
    pub exit_code: i32,
    /// Process-group leader pid; `0` whenever the job is not running.
    pub pid: i32,
    /// Arbitrary caller-supplied JSON object.
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn is_running(&self) -> bool {
        self.status == JobStatus::Running
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
