// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration management for rp-provision.
//!
//! # Configuration Hierarchy
//!
//! ```text
//! Priority (low → high)
//! 1. defaults
//! 2. /etc/rp-provision.toml
//! 3. ./rp-provision.toml
//! 4. --config FILE (repeatable)
//! 5. RP_PROVISION_* env vars
//! 6. --set / CLI overrides
//! ```
//!
//! # Environment Variable Mapping
//!
//! ```text
//! RP_PROVISION_GLOBAL__DRY=true          → global.dry = true
//! RP_PROVISION_EXPORT__MODE=append       → export.mode = "append"
//! RP_PROVISION_PACKAGES__PACKAGES=git,jq → packages.packages = ["git", "jq"]
//! ```

pub mod loader;
pub mod types;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{ConfigError, Result};
use crate::logging::redact;

use loader::ConfigLoader;
use types::{
    ArtifactConfig, DelegateConfig, ExportConfig, GlobalConfig, PackagesConfig, PythonConfig,
    S3Config, StartConfig,
};

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub global: GlobalConfig,
    pub export: ExportConfig,
    pub delegate: DelegateConfig,
    pub packages: PackagesConfig,
    pub python: PythonConfig,
    pub artifact: ArtifactConfig,
    pub s3: S3Config,
    pub start: StartConfig,
}

impl Config {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use rp_provision::config::Config;
    ///
    /// let config = Config::builder()
    ///     .add_toml_file_optional("/etc/rp-provision.toml")
    ///     .with_env_prefix("RP_PROVISION")
    ///     .build()?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    #[must_use]
    pub fn builder() -> ConfigLoader {
        ConfigLoader::new()
    }

    /// Load configuration from a single TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML, or
    /// does not match the `Config` structure.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::builder().add_toml_file(path).build()
    }

    /// Load configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not valid TOML or does not match the
    /// `Config` structure.
    pub fn parse(content: &str) -> Result<Self> {
        Self::builder().add_toml_str(content).build()
    }

    /// Checks values the type system cannot.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError::InvalidValue`] for the first offending key.
    pub fn validate(&self) -> Result<()> {
        if self.s3.workers == 0 {
            return Err(invalid("s3", "workers", "must be at least 1").into());
        }
        if self.s3.chunk_size_mb == 0 {
            return Err(invalid("s3", "chunk_size_mb", "must be at least 1").into());
        }
        let digest = &self.artifact.sha256;
        if !digest.is_empty()
            && (digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()))
        {
            return Err(invalid("artifact", "sha256", "expected 64 hex characters").into());
        }
        if self.export.renames.iter().any(|rule| rule.from.is_empty()) {
            return Err(invalid("export", "renames", "rename prefix must not be empty").into());
        }
        if self.export.prefixes.iter().any(String::is_empty) {
            return Err(invalid("export", "prefixes", "prefix must not be empty").into());
        }
        Ok(())
    }

    /// Format configuration options for display.
    ///
    /// Output is sorted by key and aligned on `=`. Values of secret-looking
    /// keys are shown as `[hidden]`.
    #[must_use]
    pub fn format_options(&self) -> Vec<String> {
        let mut options = BTreeMap::new();
        self.format_global_options(&mut options);
        self.format_export_options(&mut options);
        self.format_step_options(&mut options);

        let max_key_len = options.keys().map(String::len).max().unwrap_or(0);

        options
            .iter()
            .map(|(key, value)| format!("{key:<max_key_len$} = {}", redact(key, value)))
            .collect()
    }

    fn format_global_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert("global.dry".into(), self.global.dry.to_string());
        options.insert(
            "global.output_log_level".into(),
            self.global.output_log_level.as_u8().to_string(),
        );
        options.insert(
            "global.file_log_level".into(),
            self.global.file_log_level.as_u8().to_string(),
        );
        options.insert(
            "global.log_file".into(),
            self.global
                .log_file
                .as_ref()
                .map_or_else(String::new, |p| p.display().to_string()),
        );
    }

    fn format_export_options(&self, options: &mut BTreeMap<String, String>) {
        let export = &self.export;
        options.insert("export.enabled".into(), export.enabled.to_string());
        options.insert(
            "export.env_file".into(),
            export.env_file.display().to_string(),
        );
        options.insert("export.shell_rc".into(), export.shell_rc.clone());
        options.insert("export.mode".into(), export.mode.to_string());
        options.insert("export.prefixes".into(), export.prefixes.join(","));
        options.insert("export.keys".into(), export.keys.join(","));
        options.insert(
            "export.include_underscore".into(),
            export.include_underscore.to_string(),
        );
        options.insert(
            "export.renames".into(),
            export
                .renames
                .iter()
                .map(|rule| format!("{}->{}", rule.from, rule.to))
                .collect::<Vec<_>>()
                .join(","),
        );
    }

    fn format_step_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert("delegate.enabled".into(), self.delegate.enabled.to_string());
        options.insert(
            "delegate.script".into(),
            self.delegate.script.display().to_string(),
        );
        options.insert("delegate.shell".into(), self.delegate.shell.clone());

        options.insert("packages.enabled".into(), self.packages.enabled.to_string());
        options.insert("packages.manager".into(), self.packages.manager.clone());
        options.insert("packages.update".into(), self.packages.update.to_string());
        options.insert("packages.packages".into(), self.packages.packages.join(","));

        options.insert("python.enabled".into(), self.python.enabled.to_string());
        options.insert("python.interpreter".into(), self.python.interpreter.clone());
        options.insert(
            "python.venv_dir".into(),
            self.python.venv_dir.display().to_string(),
        );
        options.insert("python.packages".into(), self.python.packages.join(","));
        if let Some(requirements) = &self.python.requirements {
            options.insert(
                "python.requirements".into(),
                requirements.display().to_string(),
            );
        }

        let artifact = &self.artifact;
        options.insert("artifact.enabled".into(), artifact.enabled.to_string());
        options.insert("artifact.source".into(), artifact.source.to_string());
        options.insert("artifact.url".into(), artifact.url.clone());
        if !artifact.fallback_urls.is_empty() {
            options.insert(
                "artifact.fallback_urls".into(),
                artifact.fallback_urls.join(","),
            );
        }
        options.insert("artifact.s3_key".into(), artifact.s3_key.clone());
        options.insert(
            "artifact.download_dir".into(),
            artifact.download_dir.display().to_string(),
        );
        options.insert("artifact.sha256".into(), artifact.sha256.clone());
        options.insert("artifact.extract".into(), artifact.extract.to_string());
        options.insert(
            "artifact.extract_dir".into(),
            artifact.extract_dir.display().to_string(),
        );
        options.insert("artifact.force".into(), artifact.force.to_string());

        options.insert("s3.workers".into(), self.s3.workers.to_string());
        options.insert("s3.chunk_size_mb".into(), self.s3.chunk_size_mb.to_string());

        options.insert("start.enabled".into(), self.start.enabled.to_string());
        options.insert(
            "start.script".into(),
            self.start.script.display().to_string(),
        );
        options.insert("start.shell".into(), self.start.shell.clone());
        options.insert("start.args".into(), self.start.args.join(" "));
    }
}

fn invalid(section: &str, key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        message: message.to_string(),
    }
}
