// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Options accepted before any command.
//!
//! ```text
//! -c/--config FILE      extra TOML layer, repeatable, must exist
//! --no-default-configs  skip /etc/rp-provision.toml and ./rp-provision.toml
//! -s/--set KEY=VAL      raw override, repeatable
//! -l/--log-level N      global.output_log_level (0-6)
//! --file-log-level N    global.file_log_level, defaults to -l
//! --log-file FILE       global.log_file
//! --dry                 global.dry
//!
//! dedicated flags > --set > RP_PROVISION_* > files > defaults
//! ```

use std::path::PathBuf;

use clap::builder::RangedI64ValueParser;
use clap::{ArgAction, Args};

fn log_level() -> RangedI64ValueParser<u8> {
    clap::value_parser!(u8).range(0..=6)
}

#[derive(Debug, Clone, Default, Args)]
pub struct GlobalOptions {
    /// Additional TOML configuration file; repeatable, later files win.
    #[arg(short = 'c', long = "config", value_name = "FILE", action = ArgAction::Append)]
    pub configs: Vec<PathBuf>,

    /// Logs what would be written, installed, downloaded or run without doing it.
    #[arg(long)]
    pub dry: bool,

    /// Console verbosity: 0 silent, 3 info (default), 6 everything.
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", value_parser = log_level())]
    pub log_level: Option<u8>,

    /// Log file verbosity; defaults to --log-level.
    #[arg(long = "file-log-level", value_name = "LEVEL", value_parser = log_level())]
    pub file_log_level: Option<u8>,

    /// Also log to this file, appending.
    #[arg(long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Sets an option, such as 'export.mode=append' or 'packages.packages=git,jq'.
    #[arg(short = 's', long = "set", value_name = "OPTION", action = ArgAction::Append)]
    pub options: Vec<String>,

    /// Skips /etc/rp-provision.toml and ./rp-provision.toml.
    #[arg(long = "no-default-configs")]
    pub no_default_configs: bool,
}

impl GlobalOptions {
    /// Flags as `section.key=value` overrides, `--set` entries first so the
    /// dedicated flags are applied last.
    #[must_use]
    pub fn to_config_overrides(&self) -> Vec<String> {
        let file_level = self.file_log_level.or(self.log_level);
        let flags = [
            self.log_level
                .map(|level| format!("global.output_log_level={level}")),
            file_level.map(|level| format!("global.file_log_level={level}")),
            self.log_file
                .as_ref()
                .map(|path| format!("global.log_file={}", path.display())),
            self.dry.then(|| "global.dry=true".to_string()),
        ];
        self.options
            .iter()
            .cloned()
            .chain(flags.into_iter().flatten())
            .collect()
    }
}
