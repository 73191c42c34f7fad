// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Arguments for the `fetch` command.

use clap::Args;
use std::path::PathBuf;

/// Downloads `s3://$RUNPOD_S3_BUCKET/<key>` into a folder.
///
/// Credentials come from `RUNPOD_S3_ACCESS_KEY_ID`,
/// `RUNPOD_S3_SECRET_ACCESS_KEY` and `RUNPOD_S3_REGION`; `RUNPOD_S3_ENDPOINT`
/// selects an S3-compatible endpoint.
#[derive(Debug, Clone, Args)]
pub struct FetchArgs {
    /// Object key inside the bucket.
    #[arg(value_name = "KEY")]
    pub key: String,

    /// Destination folder; the file keeps the key's basename.
    #[arg(value_name = "DEST")]
    pub dest: PathBuf,

    /// Concurrent ranged requests [default: s3.workers].
    #[arg(short = 'w', long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: Option<u16>,

    /// Chunk size in MiB [default: s3.chunk_size_mb].
    #[arg(long = "chunk-size", value_name = "MB", value_parser = clap::value_parser!(u64).range(1..))]
    pub chunk_size: Option<u64>,

    /// Hides the progress bar.
    #[arg(short = 'q', long)]
    pub quiet: bool,
}
