// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Layered configuration loading.
//!
//! ```text
//! ConfigLoader::new()
//!   .add_toml_file_optional(/etc)
//!   .add_toml_file_optional(cwd)
//!   .add_toml_file(--config)
//!   .with_env_prefix("RP_PROVISION")
//!   .apply_overrides(--set)
//!        |
//!        v
//!    build() --> Config (validated)
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{ConfigBuilder, File, FileFormat};

use super::Config;
use crate::error::{ConfigError, Result};

/// Keys whose string values are split on commas into lists.
const LIST_KEYS: &[&str] = &[
    "export.prefixes",
    "export.keys",
    "packages.packages",
    "python.packages",
    "artifact.fallback_urls",
    "start.args",
];

/// A configuration layer that was actually read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// `--config FILE`; missing files are an error.
    Required(PathBuf),
    /// Default locations, recorded only when present.
    Optional(PathBuf),
    /// TOML passed as a string.
    Inline,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required(path) => write!(f, "[file] {}", path.display()),
            Self::Optional(path) => write!(f, "[optional] {}", path.display()),
            Self::Inline => f.write_str("[string] <inline>"),
        }
    }
}

/// Layers TOML files, environment variables and overrides into a [`Config`].
pub struct ConfigLoader {
    builder: ConfigBuilder<DefaultState>,
    env_prefix: Option<String>,
    sources: Vec<ConfigSource>,
}

impl ConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            builder: config::Config::builder(),
            env_prefix: None,
            sources: Vec::new(),
        }
    }

    fn layer<S>(mut self, layer: S, source: Option<ConfigSource>) -> Self
    where
        S: config::Source + Send + Sync + 'static,
    {
        self.builder = self.builder.add_source(layer);
        self.sources.extend(source);
        self
    }

    /// Adds a TOML file that must exist when [`build`](Self::build) runs.
    #[must_use]
    pub fn add_toml_file<P: AsRef<Path>>(self, path: P) -> Self {
        let path = path.as_ref();
        let file = File::from(path).format(FileFormat::Toml).required(true);
        self.layer(file, Some(ConfigSource::Required(path.to_path_buf())))
    }

    /// Adds a TOML file that is skipped if absent.
    #[must_use]
    pub fn add_toml_file_optional<P: AsRef<Path>>(self, path: P) -> Self {
        let path = path.as_ref();
        let file = File::from(path).format(FileFormat::Toml).required(false);
        let source = path
            .is_file()
            .then(|| ConfigSource::Optional(path.to_path_buf()));
        self.layer(file, source)
    }

    #[must_use]
    pub fn add_toml_str(self, content: &str) -> Self {
        let file = File::from_str(content, FileFormat::Toml);
        self.layer(file, Some(ConfigSource::Inline))
    }

    /// Reads `<PREFIX>_SECTION__KEY` variables; `__` separates nesting levels.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self
    }

    /// Sets a single dotted key above every other layer.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` is not a valid config path.
    pub fn set<T: Into<config::Value>>(mut self, key: &str, value: T) -> Result<Self> {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Applies `section.key=value` overrides (`section/key=value` is accepted too).
    ///
    /// List-valued keys take a comma-separated value.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError::InvalidValue`] for an override without `=` or
    /// without a section.
    pub fn apply_overrides<S: AsRef<str>>(self, overrides: &[S]) -> Result<Self> {
        let mut loader = self;
        for raw in overrides {
            let (key, value) = parse_override(raw.as_ref())?;
            loader = if LIST_KEYS.contains(&key.as_str()) {
                let items: Vec<String> = value
                    .split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(String::from)
                    .collect();
                loader.set(&key, items)?
            } else {
                loader.set(&key, value)?
            };
        }
        Ok(loader)
    }

    /// Merges every layer, deserializes and validates.
    ///
    /// # Errors
    ///
    /// Fails on a missing required file, malformed TOML, an unknown or
    /// mistyped key, or a value rejected by [`Config::validate`].
    pub fn build(self) -> Result<Config> {
        let builder = match &self.env_prefix {
            Some(prefix) => {
                let env = LIST_KEYS.iter().fold(
                    config::Environment::with_prefix(prefix)
                        .prefix_separator("_")
                        .separator("__")
                        .list_separator(",")
                        .try_parsing(true),
                    |env, key| env.with_list_parse_key(key),
                );
                self.builder.add_source(env)
            }
            None => self.builder,
        };
        let cfg = builder.build()?;
        let config: Config = cfg.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Layers recorded so far, lowest priority first.
    #[must_use]
    pub fn loaded_files(&self) -> &[ConfigSource] {
        &self.sources
    }

    /// Numbered lines for the `configs` command.
    #[must_use]
    pub fn format_loaded_files(&self) -> Vec<String> {
        self.sources
            .iter()
            .zip(1..)
            .map(|(source, n)| format!("{n}. {source}"))
            .collect()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Splits `section.key=value` into a dotted key and its value.
fn parse_override(raw: &str) -> std::result::Result<(String, String), ConfigError> {
    let invalid = |message: &str| ConfigError::InvalidValue {
        section: "cli".to_string(),
        key: "set".to_string(),
        message: format!("{message}: '{raw}'"),
    };

    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| invalid("expected section.key=value"))?;
    let key = key.trim().replace('/', ".");
    if !key.contains('.') || key.starts_with('.') || key.ends_with('.') {
        return Err(invalid("key must name a section and a key"));
    }
    Ok((key, value.trim().to_string()))
}
