// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration types for rp-provision.
//!
//! # Config Structure
//!
//! ```text
//! Config: GlobalConfig, ExportConfig, DelegateConfig, PackagesConfig,
//!         PythonConfig, ArtifactConfig, S3Config, StartConfig
//! ```
//!
//! # Export Modes
//!
//! ```text
//! ExportMode: Merge (default, idempotent) | Append (duplicates every boot)
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::logging::LogLevel;

/// Default delegation target, also the default start script.
pub const DEFAULT_START_SCRIPT: &str = "/app/cnode/start.sh";

/// Global configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Log actions without changing anything.
    pub dry: bool,
    /// Log level for console output (0-6).
    pub output_log_level: LogLevel,
    /// Log level for file output (0-6).
    pub file_log_level: LogLevel,
    /// Path to log file; no file logging when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            dry: false,
            output_log_level: LogLevel::INFO,
            file_log_level: LogLevel::TRACE,
            log_file: None,
        }
    }
}

/// How the persistent environment file is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportMode {
    /// Read existing lines into a key map, overwrite by key, rewrite the file.
    #[default]
    Merge,
    /// Append every line unconditionally.
    Append,
}

impl std::fmt::Display for ExportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Merge => write!(f, "merge"),
            Self::Append => write!(f, "append"),
        }
    }
}

impl std::str::FromStr for ExportMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "merge" => Ok(Self::Merge),
            "append" => Ok(Self::Append),
            _ => Err(ConfigError::InvalidValue {
                section: "export".to_string(),
                key: "mode".to_string(),
                message: format!("expected 'merge' or 'append', got '{s}'"),
            }),
        }
    }
}

/// A key prefix rewrite, e.g. `RUNPOD_S3_` -> `S3_`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenameRule {
    /// Prefix stripped from matching keys.
    pub from: String,
    /// Prefix prepended to the remainder.
    pub to: String,
}

impl RenameRule {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Environment exporter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    pub enabled: bool,
    /// Persistent environment file receiving `export` lines.
    pub env_file: PathBuf,
    /// Shell start-up file receiving the `source` line (`~` is expanded).
    pub shell_rc: String,
    pub mode: ExportMode,
    /// Keys starting with any of these are exported.
    pub prefixes: Vec<String>,
    /// Keys equal to any of these are exported.
    pub keys: Vec<String>,
    /// Whether the shell-internal `_` variable is exported.
    pub include_underscore: bool,
    /// Prefix rewrites applied after the export pass.
    pub renames: Vec<RenameRule>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            env_file: PathBuf::from("/etc/rp_environment"),
            shell_rc: "~/.bashrc".to_string(),
            mode: ExportMode::default(),
            prefixes: vec!["RUNPOD_".to_string()],
            keys: vec!["PATH".to_string()],
            include_underscore: true,
            renames: vec![RenameRule::new("RUNPOD_S3_", "S3_")],
        }
    }
}

/// Delegation target checked before provisioning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DelegateConfig {
    pub enabled: bool,
    /// Script that replaces provisioning when it exists.
    pub script: PathBuf,
    /// Interpreter used to run the script.
    pub shell: String,
}

impl Default for DelegateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            script: PathBuf::from(DEFAULT_START_SCRIPT),
            shell: "bash".to_string(),
        }
    }
}

/// System package installation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackagesConfig {
    pub enabled: bool,
    /// Package manager executable.
    pub manager: String,
    /// Refresh package lists before installing.
    pub update: bool,
    pub packages: Vec<String>,
}

impl Default for PackagesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            manager: "apt-get".to_string(),
            update: true,
            packages: Vec::new(),
        }
    }
}

/// Python virtual environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PythonConfig {
    pub enabled: bool,
    /// Interpreter used to create the venv.
    pub interpreter: String,
    pub venv_dir: PathBuf,
    /// Packages installed with pip into the venv.
    pub packages: Vec<String>,
    /// Optional requirements file installed with `pip install -r`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<PathBuf>,
}

impl Default for PythonConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interpreter: "python3".to_string(),
            venv_dir: PathBuf::from("/opt/venv"),
            packages: Vec::new(),
            requirements: None,
        }
    }
}

/// Where the artifact is fetched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactSource {
    #[default]
    Url,
    S3,
}

impl std::fmt::Display for ArtifactSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Url => write!(f, "url"),
            Self::S3 => write!(f, "s3"),
        }
    }
}

/// Bundled artifact download and extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArtifactConfig {
    pub enabled: bool,
    pub source: ArtifactSource,
    /// HTTP URL (source = "url").
    pub url: String,
    /// Tried in order when `url` fails.
    pub fallback_urls: Vec<String>,
    /// Object key (source = "s3").
    pub s3_key: String,
    pub download_dir: PathBuf,
    /// Expected SHA-256 of the downloaded file, hex; empty skips the check.
    pub sha256: String,
    /// Extract the downloaded archive.
    pub extract: bool,
    pub extract_dir: PathBuf,
    /// Download and extract even if the outputs already exist.
    pub force: bool,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            source: ArtifactSource::default(),
            url: String::new(),
            fallback_urls: Vec::new(),
            s3_key: String::new(),
            download_dir: PathBuf::from("/tmp/rp-provision"),
            sha256: String::new(),
            extract: true,
            extract_dir: PathBuf::from("/app"),
            force: false,
        }
    }
}

impl ArtifactConfig {
    /// Returns whether anything is configured to download.
    #[must_use]
    pub const fn has_source(&self) -> bool {
        match self.source {
            ArtifactSource::Url => !self.url.is_empty(),
            ArtifactSource::S3 => !self.s3_key.is_empty(),
        }
    }
}

/// Parallel S3 download tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct S3Config {
    /// Concurrent ranged requests.
    pub workers: usize,
    /// Part size in MiB.
    pub chunk_size_mb: u64,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            workers: 12,
            chunk_size_mb: 64,
        }
    }
}

impl S3Config {
    /// Part size in bytes.
    #[must_use]
    pub const fn chunk_size_bytes(&self) -> u64 {
        self.chunk_size_mb * 1024 * 1024
    }
}

/// Downstream start script run after provisioning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StartConfig {
    pub enabled: bool,
    pub script: PathBuf,
    pub shell: String,
    pub args: Vec<String>,
}

impl Default for StartConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            script: PathBuf::from(DEFAULT_START_SCRIPT),
            shell: "bash".to_string(),
            args: Vec::new(),
        }
    }
}
