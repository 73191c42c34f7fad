// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Artifact extraction into `artifact.extract_dir`.

use anyhow::Context;
use futures_util::future::BoxFuture;

use super::fetch::artifact_path;
use crate::config::Config;
use crate::error::Result;
use crate::step::tools::Tool;
use crate::step::tools::extractor::ExtractorTool;
use crate::step::{StepContext, Stepable};

#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractStep;

impl ExtractStep {
    async fn execute(&self, ctx: &StepContext) -> Result<()> {
        let artifact = &ctx.config().artifact;
        let archive = artifact_path(artifact).context("no artifact to extract")?;

        ExtractorTool::new()
            .archive(&archive)
            .output(&artifact.extract_dir)
            .force(artifact.force)
            .run(&ctx.tool_context())
            .await
    }
}

impl Stepable for ExtractStep {
    fn name(&self) -> &'static str {
        "extract"
    }

    fn enabled(&self, config: &Config) -> bool {
        config.artifact.enabled && config.artifact.extract && config.artifact.has_source()
    }

    fn run<'a>(&'a self, ctx: &'a mut StepContext) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.execute(ctx))
    }
}
