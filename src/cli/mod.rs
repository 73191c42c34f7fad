// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Command line (clap derive).
//!
//! ```text
//! rp-provision [global options] <command>
//! boot
//! export
//! fetch <key> <dest> [--workers N] [--chunk-size MB]
//! options
//! configs
//! version
//! ```

pub mod fetch;
pub mod global;

#[cfg(test)]
mod tests;

use crate::cli::fetch::FetchArgs;
use crate::cli::global::GlobalOptions;
use clap::{Parser, Subcommand};

/// Container boot-time provisioning.
#[derive(Debug, Parser)]
#[command(
    name = "rp-provision",
    author,
    version,
    about = "Container boot-time provisioning",
    long_about = "rp-provision Copyright (C) 2026 Romeo Ahmed\n\
                  This program comes with ABSOLUTELY NO WARRANTY\n\
                  This is free software, and you are welcome to redistribute it\n\
                  under certain conditions; see LICENSE for details.\n\n\
                  Prepares a container at boot: persists the RUNPOD_* environment,\n\
                  installs packages, fetches and unpacks the workload, then hands\n\
                  off to its start script. If /app/cnode/start.sh exists it is run\n\
                  instead of all of the above.\n\n\
                  `rp-provision boot` is the container entry point. See\n\
                  `rp-provision <command> --help` for more information about a command.",
    after_help = "CONFIG FILES:\n\n\
                  /etc/rp-provision.toml and ./rp-provision.toml are loaded when\n\
                  present, in that order. Files given with --config are loaded\n\
                  after them and must exist. RP_PROVISION_SECTION__KEY environment\n\
                  variables override files, and --set overrides everything."
)]
pub struct Cli {
    /// Global options shared by all commands
    #[command(flatten)]
    pub global: GlobalOptions,

    /// Command to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Shows the version.
    #[command(visible_alias = "-v")]
    Version,

    /// Lists all options and their values.
    Options,

    /// Lists the configuration files in use.
    Configs,

    /// Delegates to the start script or provisions the container.
    Boot,

    /// Persists the selected environment only.
    Export,

    /// Downloads an object from the configured S3 bucket.
    Fetch(FetchArgs),
}

/// Parses `std::env::args`, exiting with usage on error.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}
