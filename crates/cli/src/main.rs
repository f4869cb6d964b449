// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! bobbit: command-line front-end for the bobbitd job daemon.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod commands;
mod exit;

use clap::{Parser, Subcommand};

use crate::exit::CliResult;

#[derive(Parser)]
#[command(name = "bobbit", about = "Simply \"yet\" UNIX socket based job runner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new job
    Create {
        /// Human label for the job; names may repeat
        job_name: String,
        /// Pre-supplied job id (generated by the daemon when omitted)
        #[arg(long)]
        id: Option<String>,
        /// Attach metadata as key=value (repeatable)
        #[arg(long = "meta", value_name = "KEY=VALUE")]
        meta: Vec<String>,
        /// Command to execute, after `--`
        #[arg(last = true)]
        command: Vec<String>,
    },

    /// List jobs
    List {
        /// Filter by id prefix or name substring
        #[arg(long)]
        search: Option<String>,
        /// Only running jobs
        #[arg(long)]
        active: bool,
        /// Only finished or failed jobs
        #[arg(long)]
        finished: bool,
        /// Print the number of matching jobs instead of rows
        #[arg(long)]
        count: bool,
        /// Maximum rows to return
        #[arg(long)]
        limit: Option<u32>,
        /// 1-based page (needs --limit)
        #[arg(long)]
        page: Option<u32>,
        /// Newest first
        #[arg(long)]
        desc: bool,
        /// Include the full command of each job
        #[arg(long)]
        request_meta: bool,
        /// Filter by metadata equality, key=value (repeatable)
        #[arg(long = "meta", value_name = "KEY=VALUE")]
        meta: Vec<String>,
    },

    /// Check status of a specific job
    Status {
        /// Job id or name; the newest match wins
        search: String,
        /// Show job metadata
        #[arg(long)]
        show_metadata: bool,
    },

    /// Block until a job completes
    Wait {
        /// Job id or name; the newest match wins
        search: String,
    },

    /// Stop a running job
    Stop {
        /// Job id or name; the newest match wins
        search: String,
    },

    /// Stream a job's log
    Tail {
        /// Job id or name; the newest match wins
        search: String,
        /// Follow the log while the job runs
        #[arg(short, long)]
        follow: bool,
    },

    /// Check if the bobbit daemon is running
    IsRunning,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("{:#}", e.source);
        std::process::exit(e.code);
    }
}

fn run(cli: Cli) -> CliResult {
    match cli.command {
        Commands::Create { job_name, id, meta, command } => {
            commands::create(&job_name, id.as_deref(), &meta, command)
        }
        Commands::List {
            search,
            active,
            finished,
            count,
            limit,
            page,
            desc,
            request_meta,
            meta,
        } => commands::list(commands::ListOpts {
            search,
            active,
            finished,
            count,
            limit,
            page,
            desc,
            request_meta,
            meta,
        }),
        Commands::Status { search, show_metadata } => commands::status(&search, show_metadata),
        Commands::Wait { search } => commands::wait(&search),
        Commands::Stop { search } => commands::stop(&search),
        Commands::Tail { search, follow } => commands::tail(&search, follow),
        Commands::IsRunning => commands::is_running(),
    }
}
