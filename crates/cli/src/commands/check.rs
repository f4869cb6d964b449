// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use bobbit_wire::RequestBody;

use crate::client::Client;
use crate::exit::CliResult;

/// Liveness probe: a clean no-error close means the daemon is accepting
/// work.
pub fn is_running() -> CliResult {
    let mut client = Client::connect()?;
    client.send(&RequestBody::VibeCheck)?;
    client.expect_clean_close()?;
    eprintln!("Daemon is running.");
    Ok(())
}
