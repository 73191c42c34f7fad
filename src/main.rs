// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Entry point.
//!
//! ```text
//! cli::parse() --> Config --> Logging --> Command Dispatch
//!   Boot | Export | Fetch | Options | Configs | Version
//! ```

use std::process::ExitCode;

use rp_provision::cli::global::GlobalOptions;
use rp_provision::cli::{self, Command};
use rp_provision::cmd::boot::run_boot_command;
use rp_provision::cmd::config::{run_configs_command, run_options_command};
use rp_provision::cmd::export::run_export_command;
use rp_provision::cmd::fetch::run_fetch_command;
use rp_provision::config::Config;
use rp_provision::config::loader::ConfigLoader;
use rp_provision::error::child_exit_code;
use rp_provision::logging::{LogConfig, init_logging};

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const SYSTEM_CONFIG: &str = "/etc/rp-provision.toml";
const LOCAL_CONFIG: &str = "rp-provision.toml";
const ENV_PREFIX: &str = "RP_PROVISION";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::parse();

    match &cli.command {
        Some(Command::Version) => {
            handle_version_command();
            return ExitCode::SUCCESS;
        }
        Some(Command::Configs) => {
            let files = build_config_loader(&cli.global).format_loaded_files();
            return match run_configs_command(&files) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("Error: {e:#}");
                    ExitCode::FAILURE
                }
            };
        }
        None => {
            eprintln!("No command specified. Use --help for usage information.");
            return ExitCode::FAILURE;
        }
        Some(_) => {}
    }

    let config = match load_config(&cli.global) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = match init_logging(&build_log_config(&config)) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    dispatch_command(&cli, &config).await
}

fn build_log_config(config: &Config) -> LogConfig {
    LogConfig::builder()
        .with_console_level(config.global.output_log_level)
        .with_file_level(config.global.file_log_level)
        .maybe_with_log_file(config.global.log_file.clone())
        .build()
}

async fn dispatch_command(cli: &cli::Cli, config: &Config) -> ExitCode {
    let result = match &cli.command {
        Some(Command::Options) => run_options_command(config),
        Some(Command::Boot) => run_boot_command(config).await,
        Some(Command::Export) => run_export_command(config).await,
        Some(Command::Fetch(args)) => run_fetch_command(args, config).await,
        Some(Command::Version | Command::Configs) | None => Ok(()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            exit_code_for(&e)
        }
    }
}

/// A failing child's own exit code, or 1.
fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    match child_exit_code(err).and_then(|code| u8::try_from(code).ok()) {
        Some(code) if code != 0 => ExitCode::from(code),
        _ => ExitCode::FAILURE,
    }
}

fn handle_version_command() {
    println!("{}", env!("CARGO_PKG_VERSION"));
}

fn build_config_loader(global: &GlobalOptions) -> ConfigLoader {
    let mut loader = ConfigLoader::new();
    if !global.no_default_configs {
        loader = loader
            .add_toml_file_optional(SYSTEM_CONFIG)
            .add_toml_file_optional(LOCAL_CONFIG);
    }
    for path in &global.configs {
        loader = loader.add_toml_file(path);
    }
    loader.with_env_prefix(ENV_PREFIX)
}

fn load_config(global: &GlobalOptions) -> rp_provision::error::Result<Config> {
    build_config_loader(global)
        .apply_overrides(&global.to_config_overrides())?
        .build()
}
