// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use bobbit_wire::{JobDetail, RequestBody};

use crate::client::Client;
use crate::exit::{usage, CliResult};

use super::parse_meta_pairs;

/// Submit a job and return without waiting for it.
///
/// EXECUTE is answered by a clean close only when the job has finished, so
/// the client fires and forgets; use `wait` or `status` to observe the
/// outcome.
pub fn create(
    job_name: &str,
    id: Option<&str>,
    meta: &[String],
    command: Vec<String>,
) -> CliResult {
    if job_name.is_empty() {
        return Err(usage("job name must not be empty"));
    }
    if command.is_empty() {
        return Err(usage("no command specified; pass it after --"));
    }
    let metadata = parse_meta_pairs(meta)?
        .into_iter()
        .map(|(key, value)| (key, serde_json::Value::String(value)))
        .collect();

    let mut client = Client::connect()?;
    client.send(&RequestBody::Execute(JobDetail {
        id: id.unwrap_or_default().to_string(),
        job_name: job_name.to_string(),
        command,
        metadata,
        created_at: None,
        updated_at: None,
    }))?;

    eprintln!("Job {job_name} created!");
    Ok(())
}
