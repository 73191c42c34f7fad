// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Boot-time provisioning for RunPod-style containers.
//!
//! ```text
//! rp-provision boot
//!   |
//!   |  config: defaults < /etc < ./ < --config < RP_PROVISION_* < --set
//!   v
//! plan::BootPlan::detect
//!   |-- Delegate --> /app/cnode/start.sh alone, exit with its code
//!   '-- Provision
//!         step::StepRunner, one Env threaded through every step
//!           export    RUNPOD_*, PATH, _  -> /etc/rp_environment + ~/.bashrc
//!                     RUNPOD_S3_* also as S3_*
//!           packages  apt-get install
//!           venv      python3 -m venv, pip install
//!           fetch     net (HTTP) | s3 (SigV4, ranged parallel GET), sha256
//!           extract   tar / tar.gz / zip
//!           start     start script, exit code propagated
//!
//! core::process   child processes with an explicit environment
//! error, logging  shared by everything above
//! ```

pub mod cli;
pub mod cmd;
pub mod config;
pub mod core;
pub mod error;
pub mod export;
pub mod logging;
pub mod net;
pub mod plan;
pub mod s3;
pub mod step;
