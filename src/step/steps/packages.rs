// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! System package installation.
//!
//! ```text
//! <manager> update              (packages.update)
//! <manager> install -y <pkgs>   DEBIAN_FRONTEND=noninteractive
//! ```

use futures_util::future::BoxFuture;

use super::run_command;
use crate::config::Config;
use crate::config::types::PackagesConfig;
use crate::core::env::container::Env;
use crate::core::process::builder::ProcessBuilder;
use crate::error::{ProcessError, Result};
use crate::step::{StepContext, Stepable};

#[derive(Debug, Clone, Copy, Default)]
pub struct PackagesStep;

impl PackagesStep {
    /// Commands run for `config`, in order.
    #[must_use]
    pub fn commands(config: &PackagesConfig, env: &Env) -> Vec<ProcessBuilder> {
        let mut env = env.clone();
        env.set("DEBIAN_FRONTEND", "noninteractive");

        let mut commands = Vec::with_capacity(2);
        if config.update {
            commands.push(
                ProcessBuilder::new(&config.manager)
                    .arg("update")
                    .env(env.clone()),
            );
        }
        commands.push(
            ProcessBuilder::new(&config.manager)
                .arg("install")
                .arg("-y")
                .args(&config.packages)
                .env(env),
        );
        commands
    }

    async fn execute(&self, ctx: &StepContext) -> Result<()> {
        let packages = &ctx.config().packages;
        if !ctx.is_dry_run() && ProcessBuilder::find_in(&packages.manager, ctx.env()).is_none() {
            return Err(ProcessError::ExecutableNotFound {
                name: packages.manager.clone(),
            }
            .into());
        }

        for command in Self::commands(packages, ctx.env()) {
            run_command(ctx, self.name(), command).await?;
        }
        Ok(())
    }
}

impl Stepable for PackagesStep {
    fn name(&self) -> &'static str {
        "packages"
    }

    fn enabled(&self, config: &Config) -> bool {
        config.packages.enabled && !config.packages.packages.is_empty()
    }

    fn run<'a>(&'a self, ctx: &'a mut StepContext) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.execute(ctx))
    }
}
