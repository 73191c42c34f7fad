// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Persists the selected environment.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::export::sink::{FileSink, LineSink, MemorySink};
use crate::export::{Exporter, expand_home};
use crate::step::{StepContext, Stepable};

#[derive(Debug, Clone, Copy, Default)]
pub struct ExportStep;

impl ExportStep {
    async fn execute(&self, ctx: &mut StepContext) -> Result<()> {
        let config = Arc::clone(ctx.config());
        let export = &config.export;
        let exporter = Exporter::from_config(export)?;

        let mut env_file = FileSink::new(&export.env_file);
        let mut shell_rc = FileSink::new(expand_home(&export.shell_rc, ctx.env()));

        if ctx.is_dry_run() {
            // Same passes against copies; the context env still gets the
            // derived variables so later dry-run steps see them.
            let mut env_copy = MemorySink::new("env_file").with_lines(env_file.read_lines()?);
            let mut rc_copy = MemorySink::new("shell_rc").with_lines(shell_rc.read_lines()?);
            let report = exporter.run(ctx.env_mut(), &mut env_copy, &mut rc_copy)?;
            info!(
                file = %env_file.describe(),
                rc = %shell_rc.describe(),
                exported = report.exported.len(),
                derived = report.derived.len(),
                changed = report.changed,
                "[dry-run] Would persist environment"
            );
            return Ok(());
        }

        exporter.run(ctx.env_mut(), &mut env_file, &mut shell_rc)?;
        Ok(())
    }
}

impl Stepable for ExportStep {
    fn name(&self) -> &'static str {
        "export"
    }

    fn enabled(&self, config: &Config) -> bool {
        config.export.enabled
    }

    fn run<'a>(&'a self, ctx: &'a mut StepContext) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.execute(ctx))
    }
}
