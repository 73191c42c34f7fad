// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Fetch command: parallel S3 download.

use tokio_util::sync::CancellationToken;

use super::cancel_on_ctrl_c;
use crate::cli::fetch::FetchArgs;
use crate::config::Config;
use crate::core::env::current_env;
use crate::error::Result;
use crate::s3::{S3Downloader, S3Settings};

const MIB: u64 = 1024 * 1024;

/// Main handler for the fetch command.
///
/// Prints the downloaded file's path on success.
///
/// # Errors
///
/// Returns an error if credentials are missing, the object does not exist,
/// or any part of the transfer fails.
pub async fn run_fetch_command(args: &FetchArgs, config: &Config) -> Result<()> {
    let settings = S3Settings::from_env(&current_env())?;
    let downloader = build_downloader(args, config, settings);

    let token = CancellationToken::new();
    cancel_on_ctrl_c(token.clone());

    let path = downloader
        .cancel_token(token)
        .download(&args.key, &args.dest)
        .await?;
    println!("{}", path.display());
    Ok(())
}

/// Applies command-line settings over `[s3]` config.
#[must_use]
pub fn build_downloader(args: &FetchArgs, config: &Config, settings: S3Settings) -> S3Downloader {
    let workers = args.workers.map_or(config.s3.workers, usize::from);
    let chunk = args
        .chunk_size
        .map_or_else(|| config.s3.chunk_size_bytes(), |mb| mb.saturating_mul(MIB));

    let downloader = S3Downloader::new(settings).workers(workers).chunk_size(chunk);
    if args.quiet { downloader.silent() } else { downloader }
}
