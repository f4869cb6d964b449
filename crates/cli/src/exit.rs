// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process exit codes: 0 success, 3 daemon unreachable or handler error,
//! 8 malformed client input.

use crate::client::ClientError;

pub const EXIT_FAILURE: i32 = 3;
pub const EXIT_USAGE: i32 = 8;

/// An error carrying the process exit code to die with.
#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub source: anyhow::Error,
}

pub type CliResult = Result<(), ExitError>;

/// Malformed client input (exit 8).
pub fn usage(message: impl Into<String>) -> ExitError {
    ExitError { code: EXIT_USAGE, source: anyhow::anyhow!(message.into()) }
}

/// Daemon-side or transport failure (exit 3).
pub fn failure(error: impl Into<anyhow::Error>) -> ExitError {
    ExitError { code: EXIT_FAILURE, source: error.into() }
}

impl From<ClientError> for ExitError {
    fn from(error: ClientError) -> Self {
        failure(error)
    }
}
