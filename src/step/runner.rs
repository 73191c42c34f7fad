// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Sequential step execution.
//!
//! ```text
//! StepRunner::new(config)
//!   .add()  .with_cancel_token()  .with_dry_run()
//!   .run_all(env).await
//!       per step: cancelled? -> enabled? -> run -> first error aborts
//! ```

use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::Config;
use crate::core::env::container::Env;
use crate::error::{Result, StepError};

use super::{Step, StepContext, Stepable};

/// Runs steps in the order they were added.
pub struct StepRunner {
    steps: Vec<Step>,
    cancel_token: CancellationToken,
    config: Arc<Config>,
    dry_run: bool,
}

impl StepRunner {
    /// Creates a runner with no steps; dry-run follows `global.dry`.
    #[must_use]
    pub fn new(config: Arc<Config>) -> Self {
        let dry_run = config.global.dry;
        Self {
            steps: Vec::new(),
            cancel_token: CancellationToken::new(),
            config,
            dry_run,
        }
    }

    /// Creates a runner holding every provisioning step.
    #[must_use]
    pub fn provisioning(config: Arc<Config>) -> Self {
        let mut runner = Self::new(config);
        for step in Step::provisioning() {
            runner.add(step);
        }
        runner
    }

    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    #[must_use]
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = token;
        self
    }

    pub fn add(&mut self, step: Step) {
        self.steps.push(step);
    }

    #[must_use]
    pub const fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Names of the steps that would run under the current config.
    #[must_use]
    pub fn enabled_steps(&self) -> Vec<&'static str> {
        self.steps
            .iter()
            .filter(|step| step.enabled(&self.config))
            .map(Stepable::name)
            .collect()
    }

    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Runs all steps against `env` and returns the resulting environment.
    ///
    /// # Errors
    ///
    /// Returns the first step error, wrapped with the step name, or
    /// [`StepError::Interrupted`] if cancellation is requested between
    /// steps.
    pub async fn run_all(&self, env: Env) -> Result<Env> {
        let mut ctx = StepContext::new(Arc::clone(&self.config), self.cancel_token.clone(), env)
            .with_dry_run(self.dry_run);

        info!(
            step_count = self.steps.len(),
            dry_run = self.dry_run,
            "Starting provisioning"
        );

        for (i, step) in self.steps.iter().enumerate() {
            if ctx.is_cancelled() {
                return Err(StepError::Interrupted(step.name().to_string()).into());
            }

            if !step.enabled(&self.config) {
                debug!(step = %step.name(), "Step disabled, skipping");
                continue;
            }

            info!(
                step = %step.name(),
                index = i + 1,
                total = self.steps.len(),
                "Running step"
            );

            step.run(&mut ctx)
                .await
                .with_context(|| format!("Step '{}' failed", step.name()))?;
        }

        info!("Provisioning complete");
        Ok(ctx.into_env())
    }
}
