// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Boot command: the container entry point.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use super::cancel_on_ctrl_c;
use crate::config::Config;
use crate::core::env::container::Env;
use crate::core::env::current_env;
use crate::error::Result;
use crate::plan::BootPlan;
use crate::step::runner::StepRunner;
use crate::step::steps::start::{run_script, script_command};

/// Main handler for the boot command.
///
/// # Errors
///
/// Returns the delegation target's or a step's error. A failing script
/// surfaces as [`ProcessError::NonZeroExit`], recoverable with
/// [`child_exit_code`].
///
/// [`ProcessError::NonZeroExit`]: crate::error::ProcessError::NonZeroExit
/// [`child_exit_code`]: crate::error::child_exit_code
pub async fn run_boot_command(config: &Config) -> Result<()> {
    let config = Arc::new(config.clone());
    let token = CancellationToken::new();
    cancel_on_ctrl_c(token.clone());
    boot(config, current_env(), token).await
}

/// Runs the boot decision against an explicit environment.
///
/// # Errors
///
/// See [`run_boot_command`].
pub async fn boot(config: Arc<Config>, env: Env, token: CancellationToken) -> Result<()> {
    match BootPlan::detect(&config) {
        BootPlan::Delegate { script } => {
            info!(script = %script.display(), "delegation target found, skipping provisioning");
            let shell = &config.delegate.shell;
            if config.global.dry {
                let command = script_command(shell, &script, &[], &env);
                info!(cmd = %command.command_line(), "[dry-run] Would run delegation target");
                return Ok(());
            }
            run_script(shell, &script, &[], &env, &token).await
        }
        BootPlan::Provision => {
            let runner = StepRunner::provisioning(Arc::clone(&config)).with_cancel_token(token);
            info!(steps = ?runner.enabled_steps(), "provisioning container");
            runner.run_all(env).await.map(drop)
        }
    }
}
