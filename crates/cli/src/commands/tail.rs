// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use bobbit_wire::{RequestBody, TailQuery};

use crate::client::Client;
use crate::exit::CliResult;

/// Print a job's log line by line; with `follow`, stream until the job
/// settles (or until interrupted: closing the connection aborts the
/// daemon-side stream).
pub fn tail(search: &str, follow: bool) -> CliResult {
    let mut client = Client::connect()?;
    client.send(&RequestBody::TailLog(TailQuery { search: search.to_string(), follow }))?;

    while let Some(line) = client.next_line()? {
        println!("{line}");
    }
    Ok(())
}
