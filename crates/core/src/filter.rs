// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Query description for the job store.

use std::collections::BTreeMap;

/// Filter for `get`/`count`/`wait_for_terminal` on the job store.
///
/// All fields are optional; an empty filter matches every row. `active_only`
/// and `finish_only` are mutually exclusive: when both are set the query
/// yields an empty result rather than an error, preserving the behavior of
/// earlier releases.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobFilter {
    /// Match `id LIKE '<prefix>%'`.
    pub id_prefix: String,
    /// Match `job_name LIKE '%<substring>%'`.
    pub name_substring: String,
    /// Match either of the above: `id LIKE 's%' OR job_name LIKE '%s%'`.
    pub general_search: String,
    /// Only rows with status `RUNNING`.
    pub active_only: bool,
    /// Only rows with status `FINISH` or `FAILED`.
    pub finish_only: bool,
    /// JSON-extract equality on metadata keys (substring fallback when the
    /// store lacks JSON functions).
    pub metadata_equals: BTreeMap<String, String>,
    /// Suppress the `command` column in results.
    pub hide_command: bool,
    /// Maximum rows returned; `0` means unlimited.
    pub limit: u32,
    /// Rows skipped before the first result.
    pub offset: u32,
    /// Order by `created_at` descending instead of ascending.
    pub sort_desc: bool,
}

impl JobFilter {
    /// Filter matching a user-supplied search key against id or name.
    pub fn search(key: &str) -> Self {
        Self { general_search: key.to_string(), ..Self::default() }
    }

    /// Resolve a search key to the newest matching row.
    ///
    /// Duplicate names are permitted; every "resolve by name" path picks the
    /// latest row by `created_at`.
    pub fn latest(key: &str) -> Self {
        Self { general_search: key.to_string(), sort_desc: true, limit: 1, ..Self::default() }
    }

    /// Filter matching exactly one job by its full id.
    pub fn by_id(id: &str) -> Self {
        Self { id_prefix: id.to_string(), limit: 1, ..Self::default() }
    }

    /// Apply 1-based pagination: `offset = (page - 1) * limit`.
    pub fn with_page(mut self, page: u32, limit: u32) -> Self {
        self.limit = limit;
        self.offset = page.saturating_sub(1).saturating_mul(limit);
        self
    }

    /// Both exclusive status filters set at once; callers short-circuit to
    /// an empty result.
    pub fn is_contradictory(&self) -> bool {
        self.active_only && self.finish_only
    }
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;
