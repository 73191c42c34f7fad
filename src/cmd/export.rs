// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Export command: persist the environment without provisioning.

use std::sync::Arc;

use super::cancel_on_ctrl_c;
use crate::config::Config;
use crate::core::env::current_env;
use crate::error::Result;
use crate::step::Step;
use crate::step::runner::StepRunner;
use crate::step::steps::export::ExportStep;

/// Runs the export step alone.
///
/// Runs even when `export.enabled` is false in the config: asking for it on
/// the command line is explicit enough.
///
/// # Errors
///
/// Returns an error if either persisted file cannot be written.
pub async fn run_export_command(config: &Config) -> Result<()> {
    let mut config = config.clone();
    config.export.enabled = true;

    let mut runner = StepRunner::new(Arc::new(config));
    runner.add(Step::Export(ExportStep));
    cancel_on_ctrl_c(runner.cancel_token());

    let env = runner.run_all(current_env()).await?;
    tracing::info!(vars = env.len(), "environment exported");
    Ok(())
}
