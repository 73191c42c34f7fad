// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! `tracing` setup for a boot-time process.
//!
//! ```text
//!                 registry
//!        +-----------+------------+
//!        v                        v
//!   stderr layer             file layer (global.log_file)
//!   output_log_level         file_log_level, no ANSI,
//!   target shown >= DEBUG    appended, non_blocking writer
//!                                 |
//!                                 v
//!                          LogGuard flushes on drop
//!
//! level   0 off  1 error  2 warn  3 info  4 debug  5 trace  6 trace incl. HTTP stack
//! ```
//!
//! Stdout is reserved for command output (`options`, `configs`, `fetch`).
//! Exported values are never logged; [`redact`] hides anything that looks
//! like a credential when a value must be shown.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use anyhow::Context;
use bon::Builder;
use serde::{Deserialize, Serialize};
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::error::{ConfigError, Result};

/// Verbosity from 0 (silent) to 6 (everything, HTTP internals included).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct LogLevel(u8);

impl Default for LogLevel {
    fn default() -> Self {
        Self::INFO
    }
}

impl LogLevel {
    pub const SILENT: Self = Self(0);
    pub const ERROR: Self = Self(1);
    pub const WARN: Self = Self(2);
    pub const INFO: Self = Self(3);
    pub const DEBUG: Self = Self(4);
    pub const TRACE: Self = Self(5);
    pub const DUMP: Self = Self(6);

    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for anything above 6.
    pub fn new(level: u8) -> std::result::Result<Self, ConfigError> {
        Self::from_u8(level).ok_or_else(|| ConfigError::InvalidValue {
            section: "global".to_string(),
            key: "output_log_level".to_string(),
            message: format!("expected 0..=6, got {level}"),
        })
    }

    #[must_use]
    pub const fn from_u8(level: u8) -> Option<Self> {
        if level <= Self::DUMP.0 { Some(Self(level)) } else { None }
    }

    #[must_use]
    pub const fn as_u8(&self) -> u8 {
        self.0
    }

    /// Module paths are printed on the console from DEBUG on.
    #[must_use]
    pub const fn shows_target(self) -> bool {
        self.0 >= Self::DEBUG.0
    }

    /// `EnvFilter` directives. The HTTP client stack stays at `warn`
    /// unless the level is DUMP.
    #[must_use]
    pub const fn to_filter_string(self) -> &'static str {
        match self.0 {
            0 => "off",
            1 => "error",
            2 => "warn",
            3 => "info,hyper=warn,hyper_util=warn,reqwest=warn",
            4 => "debug,hyper=warn,hyper_util=warn,reqwest=warn,h2=warn",
            5 => "trace,hyper=warn,hyper_util=warn,reqwest=warn,h2=warn,rustls=warn",
            _ => "trace",
        }
    }

    fn filter(self) -> EnvFilter {
        EnvFilter::new(self.to_filter_string())
    }
}

impl TryFrom<u8> for LogLevel {
    type Error = ConfigError;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LogLevel> for u8 {
    fn from(level: LogLevel) -> Self {
        level.0
    }
}

/// Where and how verbosely to log.
#[derive(Debug, Clone, Builder)]
pub struct LogConfig {
    #[builder(setters(name = with_console_level), default = LogLevel::INFO)]
    console_level: LogLevel,
    #[builder(setters(name = with_file_level), default = LogLevel::TRACE)]
    file_level: LogLevel,
    #[builder(setters(name = with_log_file), into)]
    log_file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl LogConfig {
    #[must_use]
    pub const fn console_level(&self) -> LogLevel {
        self.console_level
    }

    #[must_use]
    pub const fn file_level(&self) -> LogLevel {
        self.file_level
    }

    #[must_use]
    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }
}

/// Holds the file writer's worker; drop it last to flush pending lines.
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
}

fn console_layer<S>(level: LogLevel) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(level.shows_target())
        .with_ansi(true)
        .with_filter(level.filter())
}

fn file_layer<S>(path: &Path, level: LogLevel) -> Result<(impl Layer<S>, WorkerGuard)>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create log directory {}", dir.display()))?;
    }
    // Appending keeps the history of earlier boots in one file.
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_filter(level.filter());
    Ok((layer, guard))
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Fails if the log file or its directory cannot be created.
///
/// # Example
///
/// ```no_run
/// use rp_provision::logging::{LogConfig, LogLevel, init_logging};
///
/// let config = LogConfig::builder()
///     .with_console_level(LogLevel::WARN)
///     .with_log_file("/var/log/rp-provision.log")
///     .build();
/// let _guard = init_logging(&config)?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn init_logging(config: &LogConfig) -> Result<LogGuard> {
    let (file, file_guard) = match config.log_file() {
        Some(path) => {
            let (layer, guard) = file_layer(path, config.file_level())?;
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer(config.console_level()))
        .with(file)
        .init();

    Ok(LogGuard {
        _file_guard: file_guard,
    })
}

const SECRET_MARKERS: &[&str] = &["SECRET", "TOKEN", "PASSWORD", "ACCESS_KEY", "API_KEY"];

/// Whether a variable or option name looks like it holds a credential.
#[must_use]
pub fn is_secret_key(key: &str) -> bool {
    let upper = key.to_ascii_uppercase();
    SECRET_MARKERS.iter().any(|marker| upper.contains(marker))
}

/// `value`, or `[hidden]` when `key` names a secret.
#[must_use]
pub fn redact<'a>(key: &str, value: &'a str) -> &'a str {
    if is_secret_key(key) { "[hidden]" } else { value }
}

#[cfg(test)]
mod tests;
