// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use bobbit_wire::{CountReply, JobReply, ListQuery, RequestBody};
use chrono::Local;

use crate::client::Client;
use crate::exit::CliResult;

use super::parse_meta_pairs;

pub struct ListOpts {
    pub search: Option<String>,
    pub active: bool,
    pub finished: bool,
    pub count: bool,
    pub limit: Option<u32>,
    pub page: Option<u32>,
    pub desc: bool,
    pub request_meta: bool,
    pub meta: Vec<String>,
}

pub fn list(opts: ListOpts) -> CliResult {
    let metadata_filter = parse_meta_pairs(&opts.meta)?.into_iter().collect();
    let query = ListQuery {
        search: opts.search.unwrap_or_default(),
        active_only: opts.active,
        finish_only: opts.finished,
        limit: opts.limit.unwrap_or(0),
        page: opts.page.unwrap_or(0),
        number_only: opts.count,
        sort_desc: opts.desc,
        request_meta: opts.request_meta,
        metadata_filter,
    };
    let number_only = query.number_only;

    let mut client = Client::connect()?;
    client.send(&RequestBody::List(query))?;

    if number_only {
        let reply: CountReply = client.read_reply()?;
        println!("{}", reply.count);
    } else {
        let replies: Vec<JobReply> = client.read_reply()?;
        render_table(&replies);
    }
    Ok(())
}

fn render_table(jobs: &[JobReply]) {
    eprintln!("{:<19}  {:<32}  {:<11}  {:>9}", "TIME", "ID", "STATUS", "EXIT CODE");
    for job in jobs {
        eprintln!(
            "{:<19}  {:<32}  {:<11}  {:>9}",
            job.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
            job.id,
            job.status.label(),
            job.exit_code,
        );
    }
}
