// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistent job store backed by an embedded SQLite database.
//!
//! The store is the single source of truth for job status and the
//! rendezvous point for the daemon's wait primitive: the executor writes
//! status transitions, waiting handlers poll for them.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod schema;
mod store;

pub use store::{JobStore, StoreError, WAIT_POLL_INTERVAL};
