// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Async process spawning and management.
//!
//! ```text
//! ProcessBuilder::new("apt-get") / resolve_in("apt-get", &env)
//!   .args() .env(Env) .capture_stdout()
//!   .run() / .run_with_cancellation()
//!       --> tokio::process::Command (env_clear + Env when set)
//!           stream stdout/stderr
//!       --> ProcessOutput { exit_code, stdout, stderr }
//!       --> ProcessError::NonZeroExit on a disallowed exit code
//! ```

pub mod builder;
mod io;
mod runner;
#[cfg(test)]
mod tests;
