// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Key selection and prefix renaming.
//!
//! ```text
//! Selector: ^(?:RUNPOD_.*|PATH|_)$
//!
//! select(env, selector)        -> { key: value } for matching keys
//! rename(vars, "RUNPOD_S3_", "S3_") -> { S3_<suffix>: value }
//! ```

use regex::Regex;
use std::collections::BTreeMap;

use crate::config::types::ExportConfig;
use crate::core::env::container::Env;

/// Compiled key predicate: prefix matches OR exact key matches.
#[derive(Debug, Clone)]
pub struct Selector {
    pattern: Option<Regex>,
}

impl Selector {
    /// Builds a selector from key prefixes and exact key names.
    ///
    /// Both are matched literally. With no prefixes and no keys the selector
    /// matches nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the combined pattern exceeds the regex size limit.
    pub fn new<P, K>(prefixes: &[P], keys: &[K]) -> std::result::Result<Self, regex::Error>
    where
        P: AsRef<str>,
        K: AsRef<str>,
    {
        let alternatives: Vec<String> = prefixes
            .iter()
            .map(|p| format!("{}.*", regex::escape(p.as_ref())))
            .chain(keys.iter().map(|k| regex::escape(k.as_ref())))
            .collect();

        if alternatives.is_empty() {
            return Ok(Self { pattern: None });
        }

        let pattern = Regex::new(&format!("^(?s:{})$", alternatives.join("|")))?;
        Ok(Self {
            pattern: Some(pattern),
        })
    }

    /// Builds the selector described by the `[export]` section.
    ///
    /// # Errors
    ///
    /// Same as [`Selector::new`].
    pub fn from_config(config: &ExportConfig) -> std::result::Result<Self, regex::Error> {
        let mut keys: Vec<&str> = config.keys.iter().map(String::as_str).collect();
        if config.include_underscore {
            keys.push("_");
        } else {
            keys.retain(|key| *key != "_");
        }
        Self::new(&config.prefixes, &keys)
    }

    #[must_use]
    pub fn matches(&self, key: &str) -> bool {
        self.pattern.as_ref().is_some_and(|re| re.is_match(key))
    }

    /// Returns the compiled pattern, if any.
    #[must_use]
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_ref().map(Regex::as_str)
    }
}

impl Default for Selector {
    /// `RUNPOD_*`, `PATH` and `_`.
    fn default() -> Self {
        Self {
            pattern: Regex::new("^(?s:RUNPOD_.*|PATH|_)$").ok(),
        }
    }
}

/// Returns every variable in `env` whose key the selector matches.
#[must_use]
pub fn select(env: &Env, selector: &Selector) -> BTreeMap<String, String> {
    env.iter()
        .filter(|(key, _)| selector.matches(key))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// Rewrites keys starting with `strip_prefix` to start with `add_prefix`.
///
/// Keys without the prefix are dropped; values are carried over unchanged.
#[must_use]
pub fn rename<'a, I>(vars: I, strip_prefix: &str, add_prefix: &str) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    vars.into_iter()
        .filter_map(|(key, value)| {
            key.strip_prefix(strip_prefix)
                .map(|suffix| (format!("{add_prefix}{suffix}"), value.to_string()))
        })
        .collect()
}
