// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schema bootstrap for the `jobs` table.

use rusqlite::Connection;
use tracing::{debug, warn};

/// JSON functions ship with SQLite 3.38.0; older builds fall back to
/// substring matching on the serialized metadata column.
const MIN_JSON_VERSION: (u32, u32, u32) = (3, 38, 0);

const CREATE_JOBS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS jobs (
    id          TEXT PRIMARY KEY,
    job_name    TEXT NOT NULL,
    command     TEXT NOT NULL,
    status      INTEGER NOT NULL DEFAULT 8,
    exit_code   INTEGER NOT NULL DEFAULT -1,
    pid         INTEGER NOT NULL DEFAULT 0,
    metadata    TEXT NOT NULL DEFAULT '',
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
)";

const CREATE_CREATED_AT_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS jobs_created_at_idx ON jobs (created_at)";

// `OF` excludes updated_at itself so the trigger cannot re-fire even with
// recursive triggers enabled.
const CREATE_UPDATED_AT_TRIGGER: &str = "
CREATE TRIGGER IF NOT EXISTS jobs_update_updated_at
AFTER UPDATE OF job_name, command, status, exit_code, pid, metadata ON jobs
FOR EACH ROW
BEGIN
    UPDATE jobs SET updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
    WHERE id = NEW.id;
END";

/// Create the `jobs` table, index, and `updated_at` trigger. Idempotent.
pub(crate) fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(CREATE_JOBS_TABLE, [])?;
    conn.execute(CREATE_CREATED_AT_INDEX, [])?;
    conn.execute(CREATE_UPDATED_AT_TRIGGER, [])?;
    Ok(())
}

/// Apply connection pragmas. Failures are logged and tolerated: an old
/// SQLite without WAL support still works, just slower.
pub(crate) fn apply_pragmas(conn: &Connection) {
    for (pragma, value) in [
        ("journal_mode", "WAL"),
        ("foreign_keys", "ON"),
        ("busy_timeout", "5000"),
        ("synchronous", "NORMAL"),
    ] {
        if let Err(e) = conn.pragma_update(None, pragma, value) {
            warn!(pragma, value, "cannot enable pragma: {e}");
        }
    }
}

/// Rewrite legacy empty-string metadata to an empty JSON object so that
/// JSON-extract predicates never see unparseable input.
pub(crate) fn normalize_metadata(conn: &Connection) -> rusqlite::Result<()> {
    let rewritten = conn.execute("UPDATE jobs SET metadata = '{}' WHERE metadata = ''", [])?;
    if rewritten > 0 {
        debug!(rewritten, "normalized empty job metadata");
    }
    Ok(())
}

/// Detect whether the connected SQLite supports JSON functions.
pub(crate) fn json_functions_available(conn: &Connection) -> rusqlite::Result<bool> {
    let version: String = conn.query_row("SELECT sqlite_version()", [], |row| row.get(0))?;
    Ok(parse_version(&version).is_some_and(|v| v >= MIN_JSON_VERSION))
}

fn parse_version(version: &str) -> Option<(u32, u32, u32)> {
    let mut parts = version.split('.').map(|p| p.parse::<u32>().ok());
    Some((parts.next()??, parts.next()??, parts.next()??))
}
