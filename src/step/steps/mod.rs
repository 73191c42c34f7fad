// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Concrete provisioning steps.

pub mod export;
pub mod extract;
pub mod fetch;
pub mod packages;
pub mod start;
pub mod venv;

use tracing::info;

use super::StepContext;
use crate::core::process::builder::ProcessBuilder;
use crate::error::{Result, StepError};

/// Runs `command` with the context's cancellation token, or only logs it in
/// a dry run.
pub(crate) async fn run_command(
    ctx: &StepContext,
    step: &str,
    command: ProcessBuilder,
) -> Result<()> {
    if ctx.is_dry_run() {
        info!(step = %step, cmd = %command.command_line(), "[dry-run] Would run");
        return Ok(());
    }

    let output = command
        .run_with_cancellation(ctx.cancel_token().clone())
        .await?;
    if output.is_interrupted() {
        return Err(StepError::Interrupted(step.to_string()).into());
    }
    Ok(())
}
