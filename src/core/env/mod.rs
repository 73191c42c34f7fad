// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Environment variable management.
//!
//! # Architecture
//!
//! ```text
//! Env (copy-on-write BTreeMap<String, String>)
//! Sources: current_env(), Env::from_map(), collect()
//! Ops: set/get/remove/prepend_path
//! ```
//!
//! The provisioning run never mutates the real process environment. Steps
//! mutate an [`container::Env`] instead, and every child process is spawned
//! with that environment, so children observe the same variables they would
//! after an `export` in a shell script.

use std::ffi::OsString;

use tracing::warn;

pub mod container;

#[cfg(test)]
mod tests;

/// Captures the current process environment.
///
/// Variables whose key or value is not valid UTF-8 are skipped with a warning.
#[must_use]
pub fn current_env() -> container::Env {
    env_from_os(std::env::vars_os())
}

/// Builds an [`container::Env`] from raw OS pairs, dropping non UTF-8 entries.
#[must_use]
pub fn env_from_os<I>(vars: I) -> container::Env
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
            (Ok(key), Ok(value)) => Some((key, value)),
            (key, _) => {
                let key = key.unwrap_or_else(|raw| raw.to_string_lossy().into_owned());
                warn!(key = %key, "skipping environment variable that is not valid UTF-8");
                None
            }
        })
        .collect()
}
