// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Unpacks the downloaded artifact.
//!
//! ```text
//! .tar.gz .tgz .tar   tar + flate2 on the blocking pool
//! .zip                unzip -o -q <archive> -d <dest>, with the context Env
//! dest already has entries and !force   skip
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use tokio::fs;
use tracing::{debug, info};

use super::{BoxFuture, Tool, ToolContext};
use crate::core::process::builder::ProcessBuilder;
use crate::error::{Result, StepError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    TarGz,
    Tar,
}

/// Longest suffix first so `.tar.gz` is not mistaken for something else.
const SUFFIXES: &[(&str, ArchiveFormat)] = &[
    (".tar.gz", ArchiveFormat::TarGz),
    (".tgz", ArchiveFormat::TarGz),
    (".tar", ArchiveFormat::Tar),
    (".zip", ArchiveFormat::Zip),
];

impl ArchiveFormat {
    /// Case-insensitive match on the file name.
    #[must_use]
    pub fn from_extension(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        SUFFIXES
            .iter()
            .find(|(suffix, _)| name.ends_with(suffix))
            .map(|&(_, format)| format)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExtractorTool {
    archive: Option<PathBuf>,
    dest: Option<PathBuf>,
    format: Option<ArchiveFormat>,
    force: bool,
}

impl ExtractorTool {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            archive: None,
            dest: None,
            format: None,
            force: false,
        }
    }

    #[must_use]
    pub fn archive(mut self, path: impl Into<PathBuf>) -> Self {
        self.archive = Some(path.into());
        self
    }

    #[must_use]
    pub fn output(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dest = Some(dir.into());
        self
    }

    /// Skips detection from the file name.
    #[must_use]
    pub const fn format(mut self, format: ArchiveFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Extract even into a non-empty destination.
    #[must_use]
    pub const fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    fn archive_path(&self) -> Result<&Path> {
        self.archive.as_deref().context("archive path not set")
    }

    pub(crate) fn detect_format(&self) -> Result<ArchiveFormat> {
        match self.format {
            Some(format) => Ok(format),
            None => {
                let archive = self.archive_path()?;
                ArchiveFormat::from_extension(archive).with_context(|| {
                    format!(
                        "unsupported archive {}; expected .tar.gz, .tgz, .tar or .zip",
                        archive.display()
                    )
                })
            }
        }
    }

    async fn extract(&self, ctx: &ToolContext) -> Result<()> {
        let archive = self.archive_path()?;
        let dest = self.dest.as_deref().context("extraction directory not set")?;
        let format = self.detect_format()?;

        if !self.force && has_entries(dest).await {
            info!(dest = %dest.display(), "extraction directory not empty, leaving it as is");
            return Ok(());
        }
        if ctx.is_dry_run() {
            info!(
                archive = %archive.display(),
                dest = %dest.display(),
                format = ?format,
                "[dry-run] Would extract archive"
            );
            return Ok(());
        }
        if ctx.is_cancelled() {
            return Err(StepError::Interrupted("extract".to_string()).into());
        }

        fs::create_dir_all(dest)
            .await
            .with_context(|| format!("failed to create {}", dest.display()))?;
        debug!(archive = %archive.display(), format = ?format, "unpacking");

        match format {
            ArchiveFormat::Tar => unpack_tar(archive, dest, false).await?,
            ArchiveFormat::TarGz => unpack_tar(archive, dest, true).await?,
            ArchiveFormat::Zip => unzip(ctx, archive, dest).await?,
        }
        info!(archive = %archive.display(), dest = %dest.display(), "archive extracted");
        Ok(())
    }
}

async fn has_entries(dir: &Path) -> bool {
    let Ok(mut entries) = fs::read_dir(dir).await else {
        return false;
    };
    matches!(entries.next_entry().await, Ok(Some(_)))
}

async fn unzip(ctx: &ToolContext, archive: &Path, dest: &Path) -> Result<()> {
    let output = ProcessBuilder::new("unzip")
        .args(["-o", "-q"])
        .arg(archive)
        .arg("-d")
        .arg(dest)
        .env(ctx.env().clone())
        .run_with_cancellation(ctx.cancel_token().clone())
        .await
        .with_context(|| format!("unzip of {} failed", archive.display()))?;
    if output.is_interrupted() {
        bail!("unzip of {} was interrupted", archive.display());
    }
    Ok(())
}

async fn unpack_tar(archive: &Path, dest: &Path, gzip: bool) -> Result<()> {
    let (archive, dest) = (archive.to_path_buf(), dest.to_path_buf());
    tokio::task::spawn_blocking(move || -> Result<()> {
        let file = std::io::BufReader::new(
            std::fs::File::open(&archive)
                .with_context(|| format!("failed to open {}", archive.display()))?,
        );
        let unpacked = if gzip {
            tar::Archive::new(flate2::read::GzDecoder::new(file)).unpack(&dest)
        } else {
            tar::Archive::new(file).unpack(&dest)
        };
        unpacked.with_context(|| {
            format!("failed to unpack {} into {}", archive.display(), dest.display())
        })
    })
    .await
    .context("extraction task panicked")?
}

impl Tool for ExtractorTool {
    fn name(&self) -> &'static str {
        "extractor"
    }

    fn run<'a>(&'a self, ctx: &'a ToolContext) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.extract(ctx))
    }
}
