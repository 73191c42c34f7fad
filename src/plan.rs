// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Delegate-or-provision decision made once at boot.
//!
//! ```text
//! delegate.enabled && delegate.script exists
//!     yes --> Delegate { script }   run it alone, exit with its code
//!     no  --> Provision             export, packages, venv, fetch, extract, start
//! ```

use std::path::PathBuf;

use crate::config::Config;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootPlan {
    /// Run the delegation target instead of provisioning.
    Delegate { script: PathBuf },
    /// Run the provisioning steps.
    Provision,
}

impl BootPlan {
    /// Inspects the filesystem once; the result is not re-evaluated.
    #[must_use]
    pub fn detect(config: &Config) -> Self {
        let script = &config.delegate.script;
        if config.delegate.enabled && script.is_file() {
            Self::Delegate {
                script: script.clone(),
            }
        } else {
            Self::Provision
        }
    }

    #[must_use]
    pub const fn is_delegate(&self) -> bool {
        matches!(self, Self::Delegate { .. })
    }
}
