// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Artifact download.
//!
//! ```text
//! source = "url"  DownloaderTool(url, fallback_urls...) -> download_dir/<url file name>
//! source = "s3"   S3Downloader(s3_key)                 -> download_dir/<basename(key)>
//! sha256 set      verify_sha256(file)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use futures_util::future::BoxFuture;
use tracing::info;

use crate::config::Config;
use crate::config::types::{ArtifactConfig, ArtifactSource};
use crate::error::Result;
use crate::net::verify_sha256;
use crate::s3::download::destination_path;
use crate::s3::{S3Downloader, S3Settings};
use crate::step::tools::Tool;
use crate::step::tools::downloader::DownloaderTool;
use crate::step::{StepContext, Stepable};

/// Last path segment of `url`, without query or fragment.
#[must_use]
pub fn url_file_name(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let path = path.split_once("://").map_or(path, |(_, rest)| rest);
    let (_, name) = path.rsplit_once('/')?;
    (!name.is_empty() && name != "." && name != "..").then_some(name)
}

/// Local path the artifact is downloaded to, if a source is configured.
#[must_use]
pub fn artifact_path(artifact: &ArtifactConfig) -> Option<PathBuf> {
    if !artifact.has_source() {
        return None;
    }
    match artifact.source {
        ArtifactSource::Url => {
            url_file_name(&artifact.url).map(|name| artifact.download_dir.join(name))
        }
        ArtifactSource::S3 => Some(destination_path(&artifact.download_dir, &artifact.s3_key)),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FetchStep;

impl FetchStep {
    async fn execute(&self, ctx: &StepContext) -> Result<()> {
        let config = Arc::clone(ctx.config());
        let artifact = &config.artifact;
        let path = artifact_path(artifact).with_context(|| {
            format!("cannot derive a file name from artifact url '{}'", artifact.url)
        })?;

        match artifact.source {
            ArtifactSource::Url => {
                DownloaderTool::new()
                    .url(&artifact.url)
                    .urls(&artifact.fallback_urls)
                    .file(&path)
                    .force(artifact.force)
                    .run(&ctx.tool_context())
                    .await?;
            }
            ArtifactSource::S3 => self.fetch_s3(ctx, &path).await?,
        }

        if !artifact.sha256.is_empty() && !ctx.is_dry_run() {
            verify_sha256(&path, &artifact.sha256).await?;
            info!(file = %path.display(), "checksum verified");
        }
        Ok(())
    }

    async fn fetch_s3(&self, ctx: &StepContext, path: &std::path::Path) -> Result<()> {
        let config = ctx.config();
        let artifact = &config.artifact;

        if !artifact.force && path.exists() {
            info!(file = %path.display(), "artifact already present, not downloading");
            return Ok(());
        }

        if ctx.is_dry_run() {
            info!(
                key = %artifact.s3_key,
                file = %path.display(),
                "[dry-run] Would download from s3"
            );
            return Ok(());
        }

        let settings = S3Settings::from_env(ctx.env())?;
        S3Downloader::new(settings)
            .workers(config.s3.workers)
            .chunk_size(config.s3.chunk_size_bytes())
            .cancel_token(ctx.cancel_token().clone())
            .download(&artifact.s3_key, &artifact.download_dir)
            .await?;
        Ok(())
    }
}

impl Stepable for FetchStep {
    fn name(&self) -> &'static str {
        "fetch"
    }

    fn enabled(&self, config: &Config) -> bool {
        config.artifact.enabled && config.artifact.has_source()
    }

    fn run<'a>(&'a self, ctx: &'a mut StepContext) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.execute(ctx))
    }
}
