// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Parallel ranged download of one S3 object.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use futures_util::stream;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::client::S3Client;
use super::settings::S3Settings;
use crate::error::{FsError, NetworkError, ProvisionResult, S3Error};
use crate::net::{PartialFileGuard, ProgressDisplay};

pub const DEFAULT_WORKERS: usize = 12;
pub const DEFAULT_CHUNK_SIZE: u64 = 64 * 1024 * 1024;

/// An inclusive byte range `start..=end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub index: u64,
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered; never zero for a planned range.
    #[must_use]
    pub const fn byte_len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Range` header value.
    #[must_use]
    pub fn header(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }
}

/// Splits `size` bytes into `ceil(size / chunk)` ranges; the last one is
/// truncated to `size - 1`.
#[must_use]
pub fn plan_ranges(size: u64, chunk: u64) -> Vec<ByteRange> {
    let chunk = chunk.max(1);
    (0..size.div_ceil(chunk))
        .map(|index| {
            let start = index * chunk;
            ByteRange {
                index,
                start,
                end: (start + chunk - 1).min(size - 1),
            }
        })
        .collect()
}

/// Final path of `key` inside `dest_dir`.
#[must_use]
pub fn destination_path(dest_dir: &Path, key: &str) -> PathBuf {
    let name = key.rsplit('/').next().unwrap_or(key);
    dest_dir.join(name)
}

/// Downloads S3 objects with a bounded number of concurrent ranged requests.
///
/// # Example
/// ```ignore
/// use rp_provision::s3::download::S3Downloader;
///
/// let path = S3Downloader::new(settings)
///     .workers(8)
///     .chunk_size(128 * 1024 * 1024)
///     .download("models/checkpoint.safetensors", "/workspace/models".as_ref())
///     .await?;
/// ```
#[derive(Debug)]
pub struct S3Downloader {
    client: S3Client,
    workers: usize,
    chunk_size: u64,
    progress_display: ProgressDisplay,
    cancel: CancellationToken,
}

impl S3Downloader {
    #[must_use]
    pub fn new(settings: S3Settings) -> Self {
        Self {
            client: S3Client::new(settings),
            workers: DEFAULT_WORKERS,
            chunk_size: DEFAULT_CHUNK_SIZE,
            progress_display: ProgressDisplay::Bar,
            cancel: CancellationToken::new(),
        }
    }

    /// Maximum concurrent requests (at least 1).
    #[must_use]
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Range size in bytes (at least 1).
    #[must_use]
    pub fn chunk_size(mut self, bytes: u64) -> Self {
        self.chunk_size = bytes.max(1);
        self
    }

    #[must_use]
    pub const fn silent(mut self) -> Self {
        self.progress_display = ProgressDisplay::Silent;
        self
    }

    #[must_use]
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    #[must_use]
    pub const fn worker_count(&self) -> usize {
        self.workers
    }

    #[must_use]
    pub const fn chunk_bytes(&self) -> u64 {
        self.chunk_size
    }

    #[must_use]
    pub const fn progress_display(&self) -> ProgressDisplay {
        self.progress_display
    }

    /// Downloads `key` to `dest_dir/<basename(key)>` and returns that path.
    ///
    /// The destination file is removed if the download fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the object is missing, any request fails, a part
    /// comes back short, the file cannot be written, or the token is
    /// cancelled.
    pub async fn download(&self, key: &str, dest_dir: &Path) -> ProvisionResult<PathBuf> {
        let bucket = &self.client.settings().bucket;
        let dest = destination_path(dest_dir, key);
        info!(
            bucket = %bucket,
            key = %key,
            dest = %dest.display(),
            workers = self.workers,
            chunk_size_mb = self.chunk_size / (1024 * 1024),
            "downloading from s3"
        );

        let size = self.client.head_object(key).await?;
        info!(size, "object size {:.2} MB", size as f64 / (1024.0 * 1024.0));

        tokio::fs::create_dir_all(dest_dir)
            .await
            .map_err(|e| FsError::io(dest_dir, e))?;

        let mut file = tokio::fs::File::create(&dest)
            .await
            .map_err(|e| FsError::io(&dest, e))?;
        let mut guard = PartialFileGuard::new(dest.clone());

        if size < self.chunk_size {
            debug!("small object, single request");
            self.fetch_whole(key, &dest, &mut file).await?;
        } else {
            file.set_len(size).await.map_err(|e| FsError::io(&dest, e))?;
            self.fetch_ranges(key, size, &dest, &mut file).await?;
        }

        file.flush().await.map_err(|e| FsError::io(&dest, e))?;
        guard.keep();

        info!(path = %dest.display(), "s3 download complete");
        Ok(dest)
    }

    async fn fetch_whole(
        &self,
        key: &str,
        dest: &Path,
        file: &mut tokio::fs::File,
    ) -> ProvisionResult<()> {
        let response = self.client.get_object(key, None).await?;
        let progress_bar = self
            .progress_display
            .start(response.content_length().unwrap_or(0));
        let mut body = response.bytes_stream();

        loop {
            let chunk = tokio::select! {
                () = self.cancel.cancelled() => {
                    if let Some(pb) = &progress_bar {
                        pb.abandon_with_message("interrupted");
                    }
                    return Err(NetworkError::Interrupted.into());
                }
                next = body.next() => match next {
                    Some(chunk) => chunk.map_err(NetworkError::Reqwest)?,
                    None => break,
                },
            };
            file.write_all(&chunk)
                .await
                .map_err(|e| FsError::io(dest, e))?;
            if let Some(pb) = &progress_bar {
                pb.inc(chunk.len() as u64);
            }
        }

        if let Some(pb) = progress_bar {
            pb.finish_with_message("done");
        }
        Ok(())
    }

    async fn fetch_ranges(
        &self,
        key: &str,
        size: u64,
        dest: &Path,
        file: &mut tokio::fs::File,
    ) -> ProvisionResult<()> {
        let ranges = plan_ranges(size, self.chunk_size);
        let chunks = ranges.len();
        let workers = self.workers.min(chunks);
        info!(chunks, workers, "downloading in chunks");

        let progress_bar = self.progress_display.start(size);
        let client = &self.client;
        let mut parts = stream::iter(ranges)
            .map(|range| async move {
                let data = client
                    .get_object(key, Some(range))
                    .await?
                    .bytes()
                    .await
                    .map_err(NetworkError::Reqwest)?;
                ProvisionResult::Ok((range, data))
            })
            .buffer_unordered(workers);

        let mut done = 0usize;
        loop {
            let part = tokio::select! {
                () = self.cancel.cancelled() => {
                    if let Some(pb) = &progress_bar {
                        pb.abandon_with_message("interrupted");
                    }
                    return Err(NetworkError::Interrupted.into());
                }
                next = parts.next() => match next {
                    Some(part) => part?,
                    None => break,
                },
            };
            let (range, data) = part;

            if data.len() as u64 != range.byte_len() {
                return Err(S3Error::ShortChunk {
                    index: range.index,
                    expected: range.byte_len(),
                    actual: data.len() as u64,
                }
                .into());
            }

            file.seek(SeekFrom::Start(range.start))
                .await
                .map_err(|e| FsError::io(dest, e))?;
            file.write_all(&data)
                .await
                .map_err(|e| FsError::io(dest, e))?;

            done += 1;
            if let Some(pb) = &progress_bar {
                pb.inc(range.byte_len());
            }
            debug!(
                chunk = range.index + 1,
                chunks,
                bytes = data.len(),
                "progress {:.1}%",
                done as f64 / chunks as f64 * 100.0
            );
        }

        if let Some(pb) = progress_bar {
            pb.finish_with_message("done");
        }
        Ok(())
    }
}
