// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Provisioning steps.
//!
//! # Architecture
//!
//! ```text
//! StepRunner
//!      |
//!      v
//!   Step enum ----> StepContext (config, cancel token, dry run, Env)
//!      |
//!      v
//!  export -> packages -> venv -> fetch -> extract -> start
//!                                  |         |
//!                                  v         v
//!                                Tools (downloader, extractor)
//! ```
//!
//! # Key Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`runner::StepRunner`] | Runs steps in order, aborting on the first failure |
//! | [`Step`] | Enum dispatching to concrete step implementations |
//! | [`Stepable`] | Common step interface |
//! | [`StepContext`] | Config, cancellation token and the environment children see |
//!
//! Steps that change the environment (`export`, `venv`) do so through
//! [`StepContext::env_mut`]; every later step spawns its processes with the
//! updated [`Env`].
//!
//! ## Adding a New Step
//!
//! 1. Create the step struct in `steps/`
//! 2. Implement `Stepable` for it
//! 3. Add a variant to the `Step` enum and to `impl_stepable_for_step!`
//! 4. Insert it into [`Step::provisioning`] at its position

pub mod runner;
pub mod steps;
pub mod tools;

use futures_util::future::BoxFuture;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::core::env::container::Env;
use crate::error::Result;
use crate::step::tools::ToolContext;

use steps::export::ExportStep;
use steps::extract::ExtractStep;
use steps::fetch::FetchStep;
use steps::packages::PackagesStep;
use steps::start::StartStep;
use steps::venv::VenvStep;

/// Common interface of provisioning steps.
///
/// Dispatch from the [`Step`] enum is generated by `impl_stepable_for_step!`.
pub trait Stepable {
    /// Returns the step name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Returns whether this step should run under `config`.
    fn enabled(&self, config: &Config) -> bool;

    /// Executes the step.
    fn run<'a>(&'a self, ctx: &'a mut StepContext) -> BoxFuture<'a, Result<()>>;
}

/// State shared by the steps of one run.
#[derive(Debug, Clone)]
pub struct StepContext {
    config: Arc<Config>,
    cancel_token: CancellationToken,
    dry_run: bool,
    env: Env,
}

impl StepContext {
    #[must_use]
    pub const fn new(config: Arc<Config>, cancel_token: CancellationToken, env: Env) -> Self {
        Self {
            config,
            cancel_token,
            dry_run: false,
            env,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &Arc<Config> {
        &self.config
    }

    #[must_use]
    pub const fn cancel_token(&self) -> &CancellationToken {
        &self.cancel_token
    }

    #[must_use]
    pub const fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Environment passed to every child process.
    #[must_use]
    pub const fn env(&self) -> &Env {
        &self.env
    }

    pub const fn env_mut(&mut self) -> &mut Env {
        &mut self.env
    }

    /// Consumes the context, returning the final environment.
    #[must_use]
    pub fn into_env(self) -> Env {
        self.env
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Creates a `ToolContext` sharing this context's state.
    #[must_use]
    pub fn tool_context(&self) -> ToolContext {
        ToolContext::new(
            Arc::clone(&self.config),
            self.cancel_token.clone(),
            self.dry_run,
        )
        .with_env(self.env.clone())
    }
}

/// A provisioning step.
#[derive(Debug, Clone)]
pub enum Step {
    Export(ExportStep),
    Packages(PackagesStep),
    Venv(VenvStep),
    Fetch(FetchStep),
    Extract(ExtractStep),
    Start(StartStep),
}

impl Step {
    /// All steps in execution order.
    #[must_use]
    pub fn provisioning() -> Vec<Self> {
        vec![
            Self::Export(ExportStep),
            Self::Packages(PackagesStep),
            Self::Venv(VenvStep),
            Self::Fetch(FetchStep),
            Self::Extract(ExtractStep),
            Self::Start(StartStep),
        ]
    }
}

macro_rules! impl_stepable_for_step {
    ($($variant:ident),+ $(,)?) => {
        impl Stepable for Step {
            fn name(&self) -> &'static str {
                match self {
                    $(Step::$variant(s) => Stepable::name(s),)+
                }
            }

            fn enabled(&self, config: &Config) -> bool {
                match self {
                    $(Step::$variant(s) => Stepable::enabled(s, config),)+
                }
            }

            fn run<'a>(&'a self, ctx: &'a mut StepContext) -> BoxFuture<'a, Result<()>> {
                match self {
                    $(Step::$variant(s) => Stepable::run(s, ctx),)+
                }
            }
        }
    };
}

impl_stepable_for_step!(Export, Packages, Venv, Fetch, Extract, Start);

#[cfg(test)]
pub(crate) mod test_utils;
