// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tool abstractions for step execution.
//!
//! ```text
//! Step --> ToolContext --> Tools
//!   downloader (HTTP, fallback URLs)
//!   extractor  (tar, tar.gz natively; zip via unzip)
//! ToolContext: cancel token, dry run, Env for spawned processes
//! ```

use std::sync::Arc;

use futures_util::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::core::env::container::Env;
use crate::error::Result;

pub mod downloader;
pub mod extractor;

/// Context provided to tools during execution.
#[derive(Debug, Clone)]
pub struct ToolContext {
    cancel_token: CancellationToken,
    /// Tools only log what they would do when set.
    dry_run: bool,
    config: Arc<Config>,
    env: Env,
}

impl ToolContext {
    #[must_use]
    pub fn new(config: Arc<Config>, cancel_token: CancellationToken, dry_run: bool) -> Self {
        Self {
            cancel_token,
            dry_run,
            config,
            env: Env::new(),
        }
    }

    /// Sets the environment for processes the tool spawns.
    #[must_use]
    pub fn with_env(mut self, env: Env) -> Self {
        self.env = env;
        self
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
    pub const fn env(&self) -> &Env {
        &self.env
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

/// A single operation used by steps.
///
/// Tools respect `ctx.is_dry_run()` and check the cancellation token before
/// doing anything irreversible.
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn run<'a>(&'a self, ctx: &'a ToolContext) -> BoxFuture<'a, Result<()>>;
}
