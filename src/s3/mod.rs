// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Native S3 object download.
//!
//! ```text
//! S3Settings::from_env(env)     RUNPOD_S3_{BUCKET,ACCESS_KEY_ID,SECRET_ACCESS_KEY,REGION}
//!        |                      RUNPOD_S3_ENDPOINT (default https://s3.<region>.amazonaws.com)
//!        v
//! S3Downloader::download(key, dest_dir)
//!        |
//!   HEAD <endpoint>/<bucket>/<key>   (SigV4, UNSIGNED-PAYLOAD) -> size
//!        |
//!   size < chunk ----------> single GET, streamed to dest
//!        |
//!   plan_ranges(size, chunk) -> [bytes=0-N, ...]
//!   buffer_unordered(min(workers, chunks))
//!        |                   each part written at its offset
//!        v
//!   dest_dir/<basename(key)>   (removed on any failure)
//! ```

pub mod client;
pub mod download;
pub mod settings;
pub mod sigv4;


pub use download::{S3Downloader, plan_ranges};
pub use settings::S3Settings;
