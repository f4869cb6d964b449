// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use bobbit_wire::{JobReply, RequestBody, SearchQuery};
use chrono::SecondsFormat;

use crate::client::Client;
use crate::exit::CliResult;

pub fn status(search: &str, show_metadata: bool) -> CliResult {
    let mut client = Client::connect()?;
    client.send(&RequestBody::Status(SearchQuery { search: search.to_string() }))?;
    let job: JobReply = client.read_reply()?;

    eprintln!("Status for Job: {}", job.job_name);
    eprintln!("------------------------");
    eprintln!("  ID:        {}", job.id);
    eprintln!("  Status:    {}", job.status.label());
    eprintln!("  Exit Code: {}", job.exit_code);
    eprintln!("  Created:   {}", job.created_at.to_rfc3339_opts(SecondsFormat::Secs, true));
    eprintln!("  Updated:   {}", job.updated_at.to_rfc3339_opts(SecondsFormat::Secs, true));
    if show_metadata && !job.metadata.is_empty() {
        match serde_json::to_string_pretty(&job.metadata) {
            Ok(pretty) => eprintln!("  Metadata:\n{pretty}"),
            Err(e) => eprintln!("  Metadata: <unprintable: {e}>"),
        }
    }
    Ok(())
}
