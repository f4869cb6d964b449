// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Response frames written by the daemon.

use bobbit_core::{Job, JobStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

type JsonMap = serde_json::Map<String, serde_json::Value>;

/// The job response shape shared by STATUS, WAIT, STOP, and LIST rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobReply {
    pub status: JobStatus,
    #[serde(rename = "exitcode")]
    pub exit_code: i32,
    pub id: String,
    pub job_name: String,
    #[serde(default)]
    pub command: Vec<String>,
    #[serde(default)]
    pub metadata: JsonMap,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobReply {
    /// The empty reply returned when STOP targets a job that is not
    /// running. Clients recognize it by the empty `id`.
    pub fn empty() -> Self {
        Self {
            status: JobStatus::NotRunning,
            exit_code: -1,
            id: String::new(),
            job_name: String::new(),
            command: Vec::new(),
            metadata: JsonMap::new(),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }
}

impl From<Job> for JobReply {
    fn from(job: Job) -> Self {
        Self {
            status: job.status,
            exit_code: job.exit_code,
            id: job.id,
            job_name: job.job_name,
            command: job.command,
            metadata: job.metadata,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

/// LIST response when `number_only` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountReply {
    pub count: i64,
}

/// The single error envelope; always the last frame on its connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorFrame {
    pub error: String,
}

/// One line of job output in a TAIL_LOG stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineFrame {
    pub line: String,
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
