// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Downstream start script.
//!
//! The script runs with inherited stdio and the provisioned environment. A
//! non-zero exit surfaces as [`ProcessError::NonZeroExit`] so the caller can
//! exit with the same code.
//!
//! [`ProcessError::NonZeroExit`]: crate::error::ProcessError::NonZeroExit

use std::path::Path;

use futures_util::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::core::env::container::Env;
use crate::core::process::builder::ProcessBuilder;
use crate::error::{Result, StepError};
use crate::step::{StepContext, Stepable};

/// Builds `<shell> <script> <args...>` with inherited stdio.
#[must_use]
pub fn script_command(shell: &str, script: &Path, args: &[String], env: &Env) -> ProcessBuilder {
    ProcessBuilder::new(shell)
        .arg(script)
        .args(args)
        .env(env.clone())
        .inherit_stdio()
        .name(script.display().to_string())
}

/// Runs a script to completion.
///
/// # Errors
///
/// Returns [`ProcessError::NonZeroExit`] with the script's exit code if it
/// fails, or [`StepError::Interrupted`] if `cancel` fires first.
///
/// [`ProcessError::NonZeroExit`]: crate::error::ProcessError::NonZeroExit
pub async fn run_script(
    shell: &str,
    script: &Path,
    args: &[String],
    env: &Env,
    cancel: &CancellationToken,
) -> Result<()> {
    info!(script = %script.display(), "running script");
    let output = script_command(shell, script, args, env)
        .run_with_cancellation(cancel.clone())
        .await?;
    if output.is_interrupted() {
        return Err(StepError::Interrupted(script.display().to_string()).into());
    }
    info!(script = %script.display(), "script finished");
    Ok(())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StartStep;

impl StartStep {
    async fn execute(&self, ctx: &StepContext) -> Result<()> {
        let start = &ctx.config().start;

        if !start.script.exists() {
            warn!(script = %start.script.display(), "start script not found, nothing to start");
            return Ok(());
        }

        if ctx.is_dry_run() {
            let command = script_command(&start.shell, &start.script, &start.args, ctx.env());
            info!(cmd = %command.command_line(), "[dry-run] Would run start script");
            return Ok(());
        }

        run_script(
            &start.shell,
            &start.script,
            &start.args,
            ctx.env(),
            ctx.cancel_token(),
        )
        .await
    }
}

impl Stepable for StartStep {
    fn name(&self) -> &'static str {
        "start"
    }

    fn enabled(&self, config: &Config) -> bool {
        config.start.enabled
    }

    fn run<'a>(&'a self, ctx: &'a mut StepContext) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.execute(ctx))
    }
}
