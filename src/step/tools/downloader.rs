// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Artifact download over HTTP(S) with mirror fallback.
//!
//! ```text
//! primary url, mirror 1, mirror 2 ...   first success wins
//!       |
//!       v
//! net::Downloader --> target file (partial file removed on failure)
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tracing::{info, warn};

use super::{BoxFuture, Tool, ToolContext};
use crate::error::{NetworkError, ProvisionError, Result};
use crate::net::{Downloader, ProgressDisplay};

#[derive(Debug, Clone, Default)]
pub struct DownloaderTool {
    /// Primary URL first, then mirrors.
    sources: Vec<String>,
    target: Option<PathBuf>,
    force: bool,
}

impl DownloaderTool {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sources: Vec::new(),
            target: None,
            force: false,
        }
    }

    /// Appends a source; sources are tried in insertion order.
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.sources.push(url.into());
        self
    }

    #[must_use]
    pub fn urls(mut self, urls: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.sources.extend(urls.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.target = Some(path.into());
        self
    }

    /// Re-download even when the target already exists.
    #[must_use]
    pub const fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    fn interrupted() -> anyhow::Error {
        ProvisionError::from(NetworkError::Interrupted).into()
    }

    async fn fetch(&self, ctx: &ToolContext) -> Result<()> {
        let target = self.target.as_deref().context("download target not set")?;
        let Some((primary, mirrors)) = self.sources.split_first() else {
            return Err(anyhow!("no source url configured for {}", target.display()));
        };

        if ctx.is_cancelled() {
            return Err(Self::interrupted());
        }
        if target.exists() && !self.force {
            info!(file = %target.display(), "artifact already present, not downloading");
            return Ok(());
        }
        if ctx.is_dry_run() {
            info!(
                url = %primary,
                fallbacks = mirrors.len(),
                file = %target.display(),
                "[dry-run] Would download"
            );
            return Ok(());
        }

        let mut failures = Vec::with_capacity(self.sources.len());
        for url in &self.sources {
            if ctx.is_cancelled() {
                return Err(Self::interrupted());
            }
            match Self::fetch_one(ctx, url, target).await {
                Ok(()) => {
                    info!(url = %url, file = %target.display(), "artifact downloaded");
                    return Ok(());
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "source failed");
                    failures.push(e);
                }
            }
        }

        let tried = failures.len();
        let last = failures.pop().unwrap_or_else(|| anyhow!("no sources"));
        Err(last.context(format!("all download URLs failed ({tried} tried)")))
    }

    async fn fetch_one(ctx: &ToolContext, url: &str, target: &Path) -> Result<()> {
        Downloader::new()
            .url(url)
            .file(target)
            .progress(ProgressDisplay::Bar)
            .cancel_token(ctx.cancel_token().clone())
            .download()
            .await
            .map_err(Into::into)
    }
}

impl Tool for DownloaderTool {
    fn name(&self) -> &'static str {
        "downloader"
    }

    fn run<'a>(&'a self, ctx: &'a ToolContext) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.fetch(ctx))
    }
}
