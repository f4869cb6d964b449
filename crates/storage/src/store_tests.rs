// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use bobbit_core::{Job, JobFilter, JobStatus};
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use tokio_util::sync::CancellationToken;
use yare::parameterized;

use super::*;

fn meta(pairs: &[(&str, &str)]) -> serde_json::Map<String, serde_json::Value> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), serde_json::Value::String((*v).to_string())))
        .collect()
}

/// Job fixture with `created_at` offset by `age` seconds for deterministic
/// ordering.
fn make_job(id: &str, name: &str, age: i64) -> Job {
    let created =
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap() + ChronoDuration::seconds(age);
    Job {
        id: id.to_string(),
        job_name: name.to_string(),
        command: vec!["/bin/sh".into(), "-c".into(), "true".into()],
        status: JobStatus::NotRunning,
        exit_code: -1,
        pid: 0,
        metadata: serde_json::Map::new(),
        created_at: created,
        updated_at: created,
    }
}

fn store_with(jobs: &[Job]) -> JobStore {
    let store = JobStore::open_in_memory().unwrap();
    for job in jobs {
        store.insert(job).unwrap();
    }
    store
}

#[test]
fn insert_then_get_round_trips() {
    let mut job = make_job("aaa1", "backup", 0);
    job.metadata = meta(&[("env", "prod")]);
    let store = store_with(&[job.clone()]);

    let rows = store.get(&JobFilter::default()).unwrap();
    assert_eq!(rows, vec![job]);
}

#[test]
fn insert_duplicate_id_is_conflict() {
    let store = store_with(&[make_job("aaa1", "backup", 0)]);
    let result = store.insert(&make_job("aaa1", "other", 1));
    assert!(matches!(result, Err(StoreError::Conflict(id)) if id == "aaa1"));
}

#[test]
fn delete_removes_row() {
    let store = store_with(&[make_job("aaa1", "backup", 0)]);
    store.delete("aaa1").unwrap();
    assert!(store.get(&JobFilter::default()).unwrap().is_empty());
    // deleting an absent row is not an error
    store.delete("aaa1").unwrap();
}

#[test]
fn update_writes_mutable_columns() {
    let job = make_job("aaa1", "backup", 0);
    let store = store_with(&[job.clone()]);

    let mut running = job;
    running.status = JobStatus::Running;
    running.pid = 4242;
    store.update(&running).unwrap();

    let row = &store.get(&JobFilter::default()).unwrap()[0];
    assert_eq!(row.status, JobStatus::Running);
    assert_eq!(row.pid, 4242);
    // trigger refreshed updated_at
    assert!(row.updated_at >= row.created_at);
}

#[parameterized(
    success = { 0, JobStatus::Finish },
    failure = { 7, JobStatus::Failed },
)]
fn mark_finished_maps_exit_code(exit_code: i32, expected: JobStatus) {
    let mut job = make_job("aaa1", "backup", 0);
    job.status = JobStatus::Running;
    job.pid = 4242;
    let store = store_with(&[job]);

    store.mark_finished("aaa1", exit_code).unwrap();

    let row = &store.get(&JobFilter::default()).unwrap()[0];
    assert_eq!(row.status, expected);
    assert_eq!(row.exit_code, exit_code);
    assert_eq!(row.pid, 0, "mark_finished must clear the pid");
}

#[test]
fn general_search_matches_id_prefix_or_name_substring() {
    let store = store_with(&[
        make_job("aaa1", "db-backup", 0),
        make_job("bbb2", "cleanup", 1),
        make_job("ccc3", "report", 2),
    ]);

    // id prefix
    let rows = store.get(&JobFilter::search("aa")).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, "aaa1");

    // name substring
    let rows = store.get(&JobFilter::search("backup")).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].job_name, "db-backup");

    // no match
    assert!(store.get(&JobFilter::search("zzz")).unwrap().is_empty());
}

#[test]
fn id_prefix_is_anchored() {
    let store = store_with(&[make_job("aaa1", "backup", 0)]);
    assert!(store.get(&JobFilter::search("aa1")).unwrap().is_empty());
}

#[test]
fn active_and_finish_filters() {
    let mut running = make_job("aaa1", "one", 0);
    running.status = JobStatus::Running;
    running.pid = 10;
    let mut finished = make_job("bbb2", "two", 1);
    finished.status = JobStatus::Finish;
    finished.exit_code = 0;
    let mut failed = make_job("ccc3", "three", 2);
    failed.status = JobStatus::Failed;
    failed.exit_code = 7;
    let mut stopped = make_job("ddd4", "four", 3);
    stopped.status = JobStatus::Stopped;
    let store = store_with(&[running, finished, failed, stopped]);

    let active = store
        .get(&JobFilter { active_only: true, ..JobFilter::default() })
        .unwrap();
    assert_eq!(active.iter().map(|j| j.id.as_str()).collect::<Vec<_>>(), ["aaa1"]);

    let done = store
        .get(&JobFilter { finish_only: true, ..JobFilter::default() })
        .unwrap();
    assert_eq!(
        done.iter().map(|j| j.id.as_str()).collect::<Vec<_>>(),
        ["bbb2", "ccc3"],
        "finish_only is FINISH|FAILED, not STOPPED"
    );
}

#[test]
fn contradictory_filter_yields_empty_result() {
    let store = store_with(&[make_job("aaa1", "one", 0)]);
    let filter =
        JobFilter { active_only: true, finish_only: true, ..JobFilter::default() };
    assert!(store.get(&filter).unwrap().is_empty());
    assert_eq!(store.count(&filter).unwrap(), 0);
}

#[test]
fn metadata_filter_with_json_functions() {
    let mut prod = make_job("aaa1", "one", 0);
    prod.metadata = meta(&[("env", "prod")]);
    let mut dev = make_job("bbb2", "two", 1);
    dev.metadata = meta(&[("env", "dev")]);
    let store = store_with(&[prod, dev]);

    let filter = JobFilter {
        metadata_equals: [("env".to_string(), "prod".to_string())].into(),
        ..JobFilter::default()
    };
    let rows = store.get(&filter).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, "aaa1");
    assert_eq!(store.count(&filter).unwrap(), 1);
}

#[test]
fn metadata_filter_substring_fallback() {
    let mut prod = make_job("aaa1", "one", 0);
    prod.metadata = meta(&[("env", "prod")]);
    let mut dev = make_job("bbb2", "two", 1);
    dev.metadata = meta(&[("env", "dev")]);
    let mut store = store_with(&[prod, dev]);
    store.json_functions = false;

    let filter = JobFilter {
        metadata_equals: [("env".to_string(), "prod".to_string())].into(),
        ..JobFilter::default()
    };
    let rows = store.get(&filter).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, "aaa1");
}

#[test]
fn metadata_filter_sanitizes_keys() {
    let mut job = make_job("aaa1", "one", 0);
    job.metadata = meta(&[("env", "prod")]);
    let store = store_with(&[job]);

    // hostile characters are stripped from the key before it reaches SQL
    let filter = JobFilter {
        metadata_equals: [("e'nv".to_string(), "prod".to_string())].into(),
        ..JobFilter::default()
    };
    let rows = store.get(&filter).unwrap();
    assert_eq!(rows.len(), 1);

    // a key that sanitizes to nothing is skipped, not an error
    let filter = JobFilter {
        metadata_equals: [("'--".to_string(), "prod".to_string())].into(),
        ..JobFilter::default()
    };
    assert_eq!(store.get(&filter).unwrap().len(), 1);
}

#[test]
fn hide_command_suppresses_the_column() {
    let store = store_with(&[make_job("aaa1", "one", 0)]);
    let rows = store
        .get(&JobFilter { hide_command: true, ..JobFilter::default() })
        .unwrap();
    assert!(rows[0].command.is_empty());
}

#[test]
fn ordering_and_tie_break() {
    let store = store_with(&[
        make_job("bbb2", "tie", 0),
        make_job("aaa1", "tie", 0),
        make_job("ccc3", "late", 5),
    ]);

    let asc = store.get(&JobFilter::default()).unwrap();
    assert_eq!(
        asc.iter().map(|j| j.id.as_str()).collect::<Vec<_>>(),
        ["aaa1", "bbb2", "ccc3"],
        "ties resolve by id"
    );

    let desc = store
        .get(&JobFilter { sort_desc: true, ..JobFilter::default() })
        .unwrap();
    assert_eq!(desc[0].id, "ccc3");
}

#[test]
fn limit_and_offset_paginate() {
    let store = store_with(&[
        make_job("aaa1", "one", 0),
        make_job("bbb2", "two", 1),
        make_job("ccc3", "three", 2),
    ]);

    let page2 = store.get(&JobFilter::default().with_page(2, 1)).unwrap();
    assert_eq!(page2.len(), 1);
    assert_eq!(page2[0].id, "bbb2");
}

#[test]
fn count_matches_get_length() {
    let store = store_with(&[
        make_job("aaa1", "db-backup", 0),
        make_job("bbb2", "db-restore", 1),
        make_job("ccc3", "report", 2),
    ]);
    let filter = JobFilter::search("db");
    assert_eq!(
        store.count(&filter).unwrap() as usize,
        store.get(&filter).unwrap().len()
    );
    assert_eq!(store.count(&JobFilter::default()).unwrap(), 3);
}

#[test]
fn latest_resolution_picks_newest_name_match() {
    let mut old = make_job("aaa1", "backup", 0);
    old.status = JobStatus::Finish;
    old.exit_code = 0;
    let new = make_job("bbb2", "backup", 10);
    let store = store_with(&[old, new]);

    let rows = store.get(&JobFilter::latest("backup")).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, "bbb2");
}

#[tokio::test]
async fn wait_returns_after_transition() {
    let mut job = make_job("aaa1", "backup", 0);
    job.status = JobStatus::Running;
    job.pid = 999;
    let store = Arc::new(store_with(&[job]));

    let writer = Arc::clone(&store);
    let handle = tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        writer.mark_finished("aaa1", 0).unwrap();
    });

    let cancel = CancellationToken::new();
    let job = store
        .wait_for_terminal(&JobFilter::latest("backup"), &cancel)
        .await
        .unwrap();
    assert_eq!(job.status, JobStatus::Finish);
    assert_eq!(job.exit_code, 0);
    handle.await.unwrap();
}

#[tokio::test]
async fn wait_returns_immediately_for_terminal_row() {
    let mut job = make_job("aaa1", "backup", 0);
    job.status = JobStatus::Failed;
    job.exit_code = 7;
    let store = store_with(&[job]);

    let cancel = CancellationToken::new();
    let job = store
        .wait_for_terminal(&JobFilter::latest("backup"), &cancel)
        .await
        .unwrap();
    assert_eq!(job.exit_code, 7);
}

#[tokio::test]
async fn wait_on_unknown_job_is_not_found() {
    let store = store_with(&[]);
    let cancel = CancellationToken::new();
    let result = store.wait_for_terminal(&JobFilter::latest("ghost"), &cancel).await;
    assert!(matches!(result, Err(StoreError::NotFound)));
}

#[tokio::test]
async fn wait_is_cancellable() {
    let mut job = make_job("aaa1", "backup", 0);
    job.status = JobStatus::Running;
    job.pid = 999;
    let store = store_with(&[job]);

    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    let handle = tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let result = store.wait_for_terminal(&JobFilter::latest("backup"), &cancel).await;
    assert!(matches!(result, Err(StoreError::Cancelled)));
    handle.await.unwrap();
}

#[tokio::test]
async fn wait_reports_disappeared_rows() {
    let mut job = make_job("aaa1", "backup", 0);
    job.status = JobStatus::Running;
    job.pid = 999;
    let store = Arc::new(store_with(&[job]));

    let writer = Arc::clone(&store);
    let handle = tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        writer.delete("aaa1").unwrap();
    });

    let cancel = CancellationToken::new();
    let result = store.wait_for_terminal(&JobFilter::latest("backup"), &cancel).await;
    assert!(matches!(result, Err(StoreError::Disappeared)));
    handle.await.unwrap();
}

#[test]
fn open_creates_database_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    {
        let store = JobStore::open(&data_dir).unwrap();
        store.insert(&make_job("aaa1", "backup", 0)).unwrap();
    }
    assert!(data_dir.join("metadata.db").exists());

    // reopen and observe the persisted row
    let store = JobStore::open(&data_dir).unwrap();
    let rows = store.get(&JobFilter::default()).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, "aaa1");
}
