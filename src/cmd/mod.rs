// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Command implementations.
//!
//! ```text
//! CLI args --> cmd::run_* handlers
//!   boot, export, fetch, config
//! ```

pub mod boot;
pub mod config;
pub mod export;
pub mod fetch;

use tokio_util::sync::CancellationToken;

/// Cancels `token` on the first Ctrl+C (or SIGINT from the container runtime).
pub(crate) fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Received Ctrl+C, interrupting...");
            token.cancel();
        }
    });
}
