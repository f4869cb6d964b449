// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use bobbit_wire::{JobReply, RequestBody, SearchQuery};

use crate::client::Client;
use crate::exit::CliResult;

/// Block until the job settles, then report how it went.
pub fn wait(search: &str) -> CliResult {
    let mut client = Client::connect()?;
    client.send(&RequestBody::Wait(SearchQuery { search: search.to_string() }))?;
    let job: JobReply = client.read_reply()?;

    eprintln!("Job {} is finished with status \"{}\".", search, job.status.label());
    Ok(())
}
