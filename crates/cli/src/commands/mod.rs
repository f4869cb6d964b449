// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One module per subcommand.
//!
//! Human-readable output goes to stderr; stdout carries only data a script
//! would consume (tail lines, counts).

mod check;
mod create;
mod list;
mod status;
mod stop;
mod tail;
mod wait;

pub use check::is_running;
pub use create::create;
pub use list::{list, ListOpts};
pub use status::status;
pub use stop::stop;
pub use tail::tail;
pub use wait::wait;

use crate::exit::{usage, ExitError};

/// Parse repeated `KEY=VALUE` arguments.
pub(crate) fn parse_meta_pairs(
    entries: &[String],
) -> Result<Vec<(String, String)>, ExitError> {
    let mut pairs = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                pairs.push((key.to_string(), value.to_string()));
            }
            _ => {
                return Err(usage(format!(
                    "invalid --meta {entry:?}: expected KEY=VALUE"
                )));
            }
        }
    }
    Ok(pairs)
}
