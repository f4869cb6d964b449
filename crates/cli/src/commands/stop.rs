// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use anyhow::anyhow;
use bobbit_wire::{JobReply, RequestBody, SearchQuery};

use crate::client::Client;
use crate::exit::{failure, CliResult};

pub fn stop(search: &str) -> CliResult {
    let mut client = Client::connect()?;
    client.send(&RequestBody::Stop(SearchQuery { search: search.to_string() }))?;
    let job: JobReply = client.read_reply()?;

    // the empty reply means the job existed but was not running
    if job.is_empty() {
        return Err(failure(anyhow!("Job {search} is not running.")));
    }
    eprintln!("Job {} [{}] has been stopped!", job.job_name, job.id);
    Ok(())
}
