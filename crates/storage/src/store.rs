// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `jobs` table: filtered query, insertion, partial update, and the
//! wait-until-terminal rendezvous.

use std::path::Path;
use std::time::Duration;

use bobbit_core::{Job, JobFilter, JobStatus};
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::schema;

/// Cadence of the wait rendezvous poll. The transition to a terminal status
/// becomes observable to waiters no later than one interval after commit.
pub const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Errors from the job store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("job {0} already exists")]
    Conflict(String),

    #[error("no job found")]
    NotFound,

    #[error("job disappeared while waiting")]
    Disappeared,

    #[error("wait cancelled")]
    Cancelled,

    #[error("invalid row for job {id}: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Handle to the embedded job database.
///
/// A single connection serialized behind a mutex: SQLite allows one writer
/// at a time and the daemon's default pool is one open, one idle connection.
/// Callers must assume queries may block briefly.
pub struct JobStore {
    conn: Mutex<Connection>,
    json_functions: bool,
}

impl JobStore {
    /// Open (creating if needed) `metadata.db` under `data_dir` and run the
    /// schema bootstrap.
    pub fn open(data_dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(data_dir)?;
        let conn = Connection::open(data_dir.join("metadata.db"))?;
        Self::from_connection(conn)
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        schema::apply_pragmas(&conn);
        schema::migrate(&conn)?;
        schema::normalize_metadata(&conn)?;
        let json_functions = schema::json_functions_available(&conn)?;
        if !json_functions {
            warn!("SQLite lacks JSON functions; metadata filters degrade to substring matching");
        }
        Ok(Self { conn: Mutex::new(conn), json_functions })
    }

    /// Atomic insert of a new row. Fails with [`StoreError::Conflict`] when
    /// the id already exists.
    pub fn insert(&self, job: &Job) -> Result<(), StoreError> {
        let command = serde_json::to_string(&job.command)
            .map_err(|e| corrupt(&job.id, format!("command: {e}")))?;
        let metadata = serde_json::to_string(&job.metadata)
            .map_err(|e| corrupt(&job.id, format!("metadata: {e}")))?;

        let conn = self.conn.lock();
        let result = conn.execute(
            "INSERT INTO jobs (id, job_name, command, status, exit_code, pid, metadata, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                job.id,
                job.job_name,
                command,
                job.status.bits(),
                job.exit_code,
                job.pid,
                metadata,
                to_db_time(job.created_at),
                to_db_time(job.updated_at),
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::Conflict(job.id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Unconditional row removal; used only to roll back failed starts.
    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.conn.lock().execute("DELETE FROM jobs WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Write the mutable columns of a row, keyed by id. `updated_at` is
    /// maintained by the schema trigger.
    pub fn update(&self, job: &Job) -> Result<(), StoreError> {
        let command = serde_json::to_string(&job.command)
            .map_err(|e| corrupt(&job.id, format!("command: {e}")))?;
        let metadata = serde_json::to_string(&job.metadata)
            .map_err(|e| corrupt(&job.id, format!("metadata: {e}")))?;

        self.conn.lock().execute(
            "UPDATE jobs
             SET job_name = ?1, command = ?2, status = ?3, exit_code = ?4, pid = ?5, metadata = ?6
             WHERE id = ?7",
            params![
                job.job_name,
                command,
                job.status.bits(),
                job.exit_code,
                job.pid,
                metadata,
                job.id,
            ],
        )?;
        Ok(())
    }

    /// Record the terminal exit of a job in a single statement: `FINISH`
    /// for exit code 0, `FAILED` otherwise, and the pid cleared.
    pub fn mark_finished(&self, id: &str, exit_code: i32) -> Result<(), StoreError> {
        let status =
            if exit_code == 0 { JobStatus::Finish } else { JobStatus::Failed };
        self.conn.lock().execute(
            "UPDATE jobs SET status = ?1, exit_code = ?2, pid = 0 WHERE id = ?3",
            params![status.bits(), exit_code, id],
        )?;
        Ok(())
    }

    /// Fetch rows matching `filter`, ordered by `created_at` (ties broken by
    /// id for stability).
    pub fn get(&self, filter: &JobFilter) -> Result<Vec<Job>, StoreError> {
        if filter.is_contradictory() {
            return Ok(Vec::new());
        }

        let (clause, mut params) = self.build_predicates(filter);
        let command_column = if filter.hide_command { "'[]'" } else { "command" };
        let mut sql = format!(
            "SELECT id, job_name, {command_column}, status, exit_code, pid, metadata, created_at, updated_at
             FROM jobs{clause}"
        );
        sql.push_str(if filter.sort_desc {
            " ORDER BY created_at DESC, id ASC"
        } else {
            " ORDER BY created_at ASC, id ASC"
        });
        if filter.limit > 0 {
            sql.push_str(" LIMIT ?");
            params.push(SqlValue::from(i64::from(filter.limit)));
            if filter.offset > 0 {
                sql.push_str(" OFFSET ?");
                params.push(SqlValue::from(i64::from(filter.offset)));
            }
        }

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params), |row| {
            Ok(RawJob {
                id: row.get(0)?,
                job_name: row.get(1)?,
                command: row.get(2)?,
                status: row.get(3)?,
                exit_code: row.get(4)?,
                pid: row.get(5)?,
                metadata: row.get(6)?,
                created_at: row.get(7)?,
                updated_at: row.get(8)?,
            })
        })?;

        let mut jobs = Vec::new();
        for raw in rows {
            jobs.push(raw?.into_job()?);
        }
        Ok(jobs)
    }

    /// Count rows matching `filter`, ignoring pagination.
    pub fn count(&self, filter: &JobFilter) -> Result<i64, StoreError> {
        if filter.is_contradictory() {
            return Ok(0);
        }
        let (clause, params) = self.build_predicates(filter);
        let sql = format!("SELECT COUNT(*) FROM jobs{clause}");
        let conn = self.conn.lock();
        let count = conn.query_row(&sql, params_from_iter(params), |row| row.get(0))?;
        Ok(count)
    }

    /// Poll `get(filter)` (limit forced to 1) until the matched row settles
    /// in a terminal status, the row disappears, or `cancel` fires.
    ///
    /// `NOT_RUNNING` counts as pending: a freshly inserted row passes
    /// through it before the executor records the launch, and waiting out
    /// that window keeps WAIT from answering before the job ever ran.
    pub async fn wait_for_terminal(
        &self,
        filter: &JobFilter,
        cancel: &CancellationToken,
    ) -> Result<Job, StoreError> {
        let mut filter = filter.clone();
        filter.limit = 1;

        let mut seen = false;
        loop {
            match self.get(&filter)?.into_iter().next() {
                Some(job) => {
                    if job.status.is_terminal() {
                        return Ok(job);
                    }
                    seen = true;
                }
                None if seen => return Err(StoreError::Disappeared),
                None => return Err(StoreError::NotFound),
            }

            tokio::select! {
                () = cancel.cancelled() => return Err(StoreError::Cancelled),
                () = tokio::time::sleep(WAIT_POLL_INTERVAL) => {}
            }
        }
    }

    /// WHERE clause and parameters for `filter`, shared by `get` and
    /// `count`.
    fn build_predicates(&self, filter: &JobFilter) -> (String, Vec<SqlValue>) {
        let mut predicates: Vec<String> = Vec::new();
        let mut params: Vec<SqlValue> = Vec::new();

        if !filter.id_prefix.is_empty() {
            predicates.push("id LIKE ?".into());
            params.push(SqlValue::from(format!("{}%", filter.id_prefix)));
        }
        if !filter.name_substring.is_empty() {
            predicates.push("job_name LIKE ?".into());
            params.push(SqlValue::from(format!("%{}%", filter.name_substring)));
        }
        if !filter.general_search.is_empty() {
            predicates.push("(id LIKE ? OR job_name LIKE ?)".into());
            params.push(SqlValue::from(format!("{}%", filter.general_search)));
            params.push(SqlValue::from(format!("%{}%", filter.general_search)));
        }
        if filter.active_only {
            predicates.push("status = ?".into());
            params.push(SqlValue::from(i64::from(JobStatus::Running.bits())));
        }
        if filter.finish_only {
            predicates.push("(status & ?) != 0".into());
            params.push(SqlValue::from(i64::from(JobStatus::FINISHED_MASK)));
        }
        for (key, value) in &filter.metadata_equals {
            let clean = sanitize_json_key(key);
            if clean.is_empty() {
                warn!(key = %key, "skipping metadata filter key with no usable characters");
                continue;
            }
            if self.json_functions {
                predicates.push("json_extract(metadata, ?) = ?".into());
                params.push(SqlValue::from(format!("$.{clean}")));
                params.push(SqlValue::from(value.clone()));
            } else {
                predicates.push("metadata LIKE ?".into());
                params.push(SqlValue::from(format!("%\"{clean}\":\"{value}\"%")));
            }
        }

        let clause = if predicates.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", predicates.join(" AND "))
        };
        (clause, params)
    }
}

/// Restrict a metadata key to `[A-Za-z0-9_]` before it reaches a JSON path.
fn sanitize_json_key(key: &str) -> String {
    key.chars().filter(|c| c.is_ascii_alphanumeric() || *c == '_').collect()
}

fn corrupt(id: &str, reason: String) -> StoreError {
    StoreError::Corrupt { id: id.to_string(), reason }
}

fn to_db_time(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn from_db_time(id: &str, raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| corrupt(id, format!("timestamp {raw:?}: {e}")))
}

/// Row image before JSON columns and timestamps are decoded.
struct RawJob {
    id: String,
    job_name: String,
    command: String,
    status: i32,
    exit_code: i32,
    pid: i32,
    metadata: String,
    created_at: String,
    updated_at: String,
}

impl RawJob {
    fn into_job(self) -> Result<Job, StoreError> {
        let status = JobStatus::try_from(self.status)
            .map_err(|e| corrupt(&self.id, e.to_string()))?;
        let command: Vec<String> = serde_json::from_str(&self.command)
            .map_err(|e| corrupt(&self.id, format!("command: {e}")))?;
        let metadata = if self.metadata.is_empty() {
            serde_json::Map::new()
        } else {
            serde_json::from_str(&self.metadata)
                .map_err(|e| corrupt(&self.id, format!("metadata: {e}")))?
        };
        let created_at = from_db_time(&self.id, &self.created_at)?;
        let updated_at = from_db_time(&self.id, &self.updated_at)?;
        Ok(Job {
            id: self.id,
            job_name: self.job_name,
            command,
            status,
            exit_code: self.exit_code,
            pid: self.pid,
            metadata,
            created_at,
            updated_at,
        })
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
