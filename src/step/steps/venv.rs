// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Python virtual environment.
//!
//! ```text
//! <interpreter> -m venv <venv_dir>        unless <venv_dir>/bin/python exists
//! env: PATH=<venv_dir>/bin:..., VIRTUAL_ENV=<venv_dir>, PYTHONHOME unset
//! <venv_dir>/bin/pip install <packages>
//! <venv_dir>/bin/pip install -r <requirements>
//! ```

use std::sync::Arc;

use futures_util::future::BoxFuture;
use tracing::{debug, info};

use super::run_command;
use crate::config::Config;
use crate::core::process::builder::ProcessBuilder;
use crate::error::Result;
use crate::step::{StepContext, Stepable};

#[derive(Debug, Clone, Copy, Default)]
pub struct VenvStep;

impl VenvStep {
    async fn execute(&self, ctx: &mut StepContext) -> Result<()> {
        let config = Arc::clone(ctx.config());
        let python = &config.python;
        let bin_dir = python.venv_dir.join("bin");

        if bin_dir.join("python").exists() {
            debug!(venv = %python.venv_dir.display(), "virtual environment exists");
        } else {
            let create = ProcessBuilder::new(&python.interpreter)
                .arg("-m")
                .arg("venv")
                .arg(&python.venv_dir)
                .env(ctx.env().clone());
            run_command(ctx, self.name(), create).await?;
        }

        ctx.env_mut()
            .prepend_path(&bin_dir)
            .set("VIRTUAL_ENV", python.venv_dir.display().to_string())
            .remove("PYTHONHOME");

        let pip = bin_dir.join("pip");
        if !python.packages.is_empty() {
            let install = ProcessBuilder::new(&pip)
                .arg("install")
                .args(&python.packages)
                .env(ctx.env().clone());
            run_command(ctx, self.name(), install).await?;
        }
        if let Some(requirements) = &python.requirements {
            let install = ProcessBuilder::new(&pip)
                .arg("install")
                .arg("-r")
                .arg(requirements)
                .env(ctx.env().clone());
            run_command(ctx, self.name(), install).await?;
        }

        info!(
            venv = %python.venv_dir.display(),
            packages = python.packages.len(),
            "python environment ready"
        );
        Ok(())
    }
}

impl Stepable for VenvStep {
    fn name(&self) -> &'static str {
        "venv"
    }

    /// Runs only when something is to be installed into the venv.
    fn enabled(&self, config: &Config) -> bool {
        config.python.enabled
            && (!config.python.packages.is_empty() || config.python.requirements.is_some())
    }

    fn run<'a>(&'a self, ctx: &'a mut StepContext) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.execute(ctx))
    }
}
