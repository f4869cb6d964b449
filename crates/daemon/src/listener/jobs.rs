// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handlers for LIST, STATUS, WAIT, and STOP.

use bobbit_core::{Job, JobFilter};
use bobbit_storage::StoreError;
use bobbit_wire::{JobReply, ListQuery};
use tokio_util::sync::CancellationToken;

use super::{DaemonCtx, HandlerError, Outcome};
use crate::executor;

/// Map LIST wire metadata onto a store filter.
///
/// `request_meta` opts into the full command detail; plain listings elide
/// the column. Pagination is 1-based and only applies when both `page` and
/// `limit` are given.
pub(crate) fn filter_from_query(query: &ListQuery) -> JobFilter {
    let mut filter = JobFilter {
        general_search: query.search.clone(),
        active_only: query.active_only,
        finish_only: query.finish_only,
        metadata_equals: query.metadata_filter.clone(),
        hide_command: !query.request_meta,
        limit: query.limit,
        sort_desc: query.sort_desc,
        ..JobFilter::default()
    };
    if query.page > 0 && query.limit > 0 {
        filter = filter.with_page(query.page, query.limit);
    }
    filter
}

pub(crate) fn handle_list(ctx: &DaemonCtx, query: &ListQuery) -> Result<Outcome, HandlerError> {
    let filter = filter_from_query(query);
    if query.number_only {
        Ok(Outcome::Count(ctx.store.count(&filter)?))
    } else {
        let replies = ctx.store.get(&filter)?.into_iter().map(JobReply::from).collect();
        Ok(Outcome::Jobs(replies))
    }
}

pub(crate) fn handle_status(ctx: &DaemonCtx, search: &str) -> Result<Outcome, HandlerError> {
    let job = resolve(ctx, search)?.ok_or(HandlerError::NotFound)?;
    Ok(Outcome::Job(job.into()))
}

pub(crate) async fn handle_wait(
    ctx: &DaemonCtx,
    search: &str,
    cancel: &CancellationToken,
) -> Result<Outcome, HandlerError> {
    let job = ctx
        .store
        .wait_for_terminal(&JobFilter::latest(search), cancel)
        .await
        .map_err(|e| match e {
            StoreError::NotFound => HandlerError::NotFound,
            other => other.into(),
        })?;
    Ok(Outcome::Job(job.into()))
}

pub(crate) fn handle_stop(ctx: &DaemonCtx, search: &str) -> Result<Outcome, HandlerError> {
    let job = resolve(ctx, search)?.ok_or(HandlerError::NotFound)?;
    if !executor::stop_job(ctx, &job)? {
        // not running: a no-op answered with the empty job response
        return Ok(Outcome::Job(JobReply::empty()));
    }
    let stopped = ctx
        .store
        .get(&JobFilter::by_id(&job.id))?
        .into_iter()
        .next()
        .ok_or(HandlerError::NotFound)?;
    Ok(Outcome::Job(stopped.into()))
}

/// Resolve a search key to the newest matching job, if any.
fn resolve(ctx: &DaemonCtx, search: &str) -> Result<Option<Job>, HandlerError> {
    Ok(ctx.store.get(&JobFilter::latest(search))?.into_iter().next())
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;
