// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Plain HTTP(S) artifact downloads and SHA-256 checks.
//!
//! ```text
//! Downloader { url, target, headers, progress, cancel }
//!   GET --> status check --> create target (+ parent dirs)
//!       --> body chunks --> target      progress: bar | spinner | none
//!   any early exit drops PartialFileGuard, which deletes the target
//!
//! verify_sha256(path, hex) --> ChecksumMismatch unless digests agree
//! ```
//!
//! One `reqwest::Client` is shared with the S3 client for connection reuse.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use sha2::{Digest, Sha256};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use crate::error::{NetworkError, ProvisionResult};

const HASH_BUFFER: usize = 64 * 1024;

/// Deletes `path` when dropped, unless [`keep`](Self::keep) was called.
pub(crate) struct PartialFileGuard {
    path: PathBuf,
    complete: bool,
}

impl PartialFileGuard {
    pub(crate) const fn new(path: PathBuf) -> Self {
        Self {
            path,
            complete: false,
        }
    }

    pub(crate) const fn keep(&mut self) {
        self.complete = true;
    }
}

impl Drop for PartialFileGuard {
    fn drop(&mut self) {
        if !self.complete {
            // nothing useful to do if the file is already gone
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

pub(crate) fn global_client() -> &'static Client {
    static CLIENT: OnceLock<Client> = OnceLock::new();
    CLIENT.get_or_init(|| {
        Client::builder()
            .user_agent(concat!("rp-provision/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new())
    })
}

fn progress_style(size_known: bool) -> ProgressStyle {
    static SIZED: OnceLock<ProgressStyle> = OnceLock::new();
    static UNSIZED: OnceLock<ProgressStyle> = OnceLock::new();
    if size_known {
        SIZED
            .get_or_init(|| {
                ProgressStyle::with_template(
                    "{spinner:.green} {elapsed_precise} [{wide_bar:.cyan/blue}] \
                     {bytes}/{total_bytes} {binary_bytes_per_sec} eta {eta}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> ")
            })
            .clone()
    } else {
        UNSIZED
            .get_or_init(|| {
                ProgressStyle::with_template(
                    "{spinner:.green} {elapsed_precise} {bytes} {binary_bytes_per_sec}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
            })
            .clone()
    }
}

/// How a transfer reports progress on the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressDisplay {
    /// A bar when the size is known, otherwise a spinner.
    #[default]
    Bar,
    Spinner,
    Silent,
}

impl ProgressDisplay {
    /// `total` of 0 means the size is unknown.
    pub(crate) fn start(self, total: u64) -> Option<ProgressBar> {
        let sized = self == Self::Bar && total > 0;
        let bar = match self {
            Self::Silent => return None,
            _ if sized => ProgressBar::new(total),
            _ => ProgressBar::new_spinner(),
        };
        bar.set_style(progress_style(sized));
        Some(bar)
    }
}

fn io_failure(url: &str, action: &str, path: &Path, err: &std::io::Error) -> NetworkError {
    NetworkError::DownloadFailed {
        url: url.to_string(),
        message: format!("cannot {action} {}: {err}", path.display()),
    }
}

/// Streams one URL into one file.
///
/// ```ignore
/// use rp_provision::net::Downloader;
///
/// Downloader::new()
///     .url("https://example.com/bundle.tar.gz")
///     .file("/workspace/downloads/bundle.tar.gz")
///     .download()
///     .await?;
/// ```
pub struct Downloader {
    client: Client,
    url: Option<String>,
    target: Option<PathBuf>,
    headers: Vec<(String, String)>,
    cancel: CancellationToken,
    progress: ProgressDisplay,
}

impl Default for Downloader {
    fn default() -> Self {
        Self::new()
    }
}

impl Downloader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: global_client().clone(),
            url: None,
            target: None,
            headers: Vec::new(),
            cancel: CancellationToken::new(),
            progress: ProgressDisplay::default(),
        }
    }

    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    #[must_use]
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.target = Some(path.into());
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub const fn progress(mut self, display: ProgressDisplay) -> Self {
        self.progress = display;
        self
    }

    #[must_use]
    pub const fn silent(self) -> Self {
        self.progress(ProgressDisplay::Silent)
    }

    #[must_use]
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    async fn create_target(url: &str, target: &Path) -> ProvisionResult<File> {
        if let Some(dir) = target.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| io_failure(url, "create directory", dir, &e))?;
        }
        let file = File::create(target)
            .await
            .map_err(|e| io_failure(url, "create", target, &e))?;
        Ok(file)
    }

    /// Fetches the URL into the target file.
    ///
    /// Nothing is left on disk unless the whole body was written.
    ///
    /// # Errors
    ///
    /// [`NetworkError::HttpError`] for a non-2xx status,
    /// [`NetworkError::Interrupted`] when the token fires, and
    /// `DownloadFailed`/`Reqwest` for local I/O or transport failures.
    pub async fn download(&self) -> ProvisionResult<()> {
        let url = self
            .url
            .as_deref()
            .ok_or_else(|| NetworkError::InvalidUrl("no url set".to_string()))?;
        let target = self
            .target
            .as_deref()
            .ok_or_else(|| NetworkError::DownloadFailed {
                url: url.to_string(),
                message: "no target file set".to_string(),
            })?;
        if self.cancel.is_cancelled() {
            return Err(NetworkError::Interrupted.into());
        }

        let request = self
            .headers
            .iter()
            .fold(self.client.get(url), |req, (name, value)| {
                req.header(name.as_str(), value.as_str())
            });
        let response = request.send().await.map_err(NetworkError::Reqwest)?;
        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::HttpError {
                status: status.as_u16(),
                url: url.to_string(),
            }
            .into());
        }

        let bar = self.progress.start(response.content_length().unwrap_or(0));
        let mut file = Self::create_target(url, target).await?;
        let mut guard = PartialFileGuard::new(target.to_path_buf());
        let mut body = response.bytes_stream();

        loop {
            let next = tokio::select! {
                () = self.cancel.cancelled() => {
                    if let Some(bar) = &bar {
                        bar.abandon_with_message("interrupted");
                    }
                    return Err(NetworkError::Interrupted.into());
                }
                next = body.next() => next,
            };
            let Some(chunk) = next else { break };
            let chunk = chunk.map_err(NetworkError::Reqwest)?;
            file.write_all(&chunk)
                .await
                .map_err(|e| io_failure(url, "write", target, &e))?;
            if let Some(bar) = &bar {
                bar.inc(chunk.len() as u64);
            }
        }
        file.flush()
            .await
            .map_err(|e| io_failure(url, "flush", target, &e))?;

        guard.keep();
        if let Some(bar) = bar {
            bar.finish_and_clear();
        }
        Ok(())
    }
}

/// Lowercase hex SHA-256 of a file's contents.
///
/// # Errors
///
/// Returns [`NetworkError::Io`] if the file cannot be read.
pub async fn sha256_file(path: &Path) -> ProvisionResult<String> {
    let mut file = File::open(path).await.map_err(NetworkError::Io)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; HASH_BUFFER];
    while let n @ 1.. = file.read(&mut buf).await.map_err(NetworkError::Io)? {
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Compares a file's digest with `expected`, ignoring hex case.
///
/// # Errors
///
/// [`NetworkError::ChecksumMismatch`] when they differ.
pub async fn verify_sha256(path: &Path, expected: &str) -> ProvisionResult<()> {
    let actual = sha256_file(path).await?;
    if actual.eq_ignore_ascii_case(expected) {
        return Ok(());
    }
    Err(NetworkError::ChecksumMismatch {
        path: path.display().to_string(),
        expected: expected.to_ascii_lowercase(),
        actual,
    }
    .into())
}
