// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic mapping from a job to its log file path.

use std::fs::{DirBuilder, File, OpenOptions};
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Utc};

/// Log file path for a job: `<data_root>/logs/<YYYY>/<MM>/<id>/log`.
///
/// A pure function of `(id, created_at)`: stable across daemon restarts.
pub fn job_log_path(data_root: &Path, id: &str, created_at: DateTime<Utc>) -> PathBuf {
    data_root
        .join("logs")
        .join(format!("{:04}", created_at.year()))
        .join(format!("{:02}", created_at.month()))
        .join(id)
        .join("log")
}

/// Open a job's log file append-write, creating the parent chain as needed.
pub fn create_log_file(
    data_root: &Path,
    id: &str,
    created_at: DateTime<Utc>,
) -> std::io::Result<File> {
    let path = job_log_path(data_root, id, created_at);
    if let Some(parent) = path.parent() {
        create_dir_tree(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Recursive mkdir with mode 0755. Idempotent.
pub(crate) fn create_dir_tree(path: &Path) -> std::io::Result<()> {
    DirBuilder::new().recursive(true).mode(0o755).create(path)
}
