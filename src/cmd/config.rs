// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! `options` and `configs`: print the effective settings and where they came from.

use std::io::{self, Write};

use crate::config::Config;
use crate::error::Result;

fn print_lines<I>(lines: I) -> Result<()>
where
    I: IntoIterator,
    I::Item: std::fmt::Display,
{
    let mut out = io::stdout().lock();
    for line in lines {
        writeln!(out, "{line}")?;
    }
    out.flush()?;
    Ok(())
}

/// Prints every option as `key = value`, secrets redacted.
///
/// # Errors
///
/// Fails only if stdout cannot be written.
pub fn run_options_command(config: &Config) -> Result<()> {
    print_lines(config.format_options())
}

/// Prints the configuration files that were found, in load order.
///
/// # Errors
///
/// Fails only if stdout cannot be written.
pub fn run_configs_command(config_files: &[String]) -> Result<()> {
    if config_files.is_empty() {
        return print_lines(["No configuration files loaded"]);
    }
    print_lines(config_files)
}
