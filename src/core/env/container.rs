// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! The provisioning context's environment.
//!
//! ```text
//! Env (copy-on-write)
//! vars: Arc<BTreeMap<String, String>>
//! clone shares the Arc until the first write (Arc::make_mut)
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Separator between `PATH` entries.
pub const PATH_SEPARATOR: char = ':';

/// A set of environment variables with copy-on-write semantics.
///
/// Keys are case-sensitive, as on every Unix. Iteration order is
/// lexicographic by key, which keeps the persisted environment file stable
/// between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Env {
    vars: Arc<BTreeMap<String, String>>,
}

impl Env {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_map(vars: BTreeMap<String, String>) -> Self {
        Self {
            vars: Arc::new(vars),
        }
    }

    /// Sets a variable, replacing any existing value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        Arc::make_mut(&mut self.vars).insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    /// Unsets a variable; a missing key leaves the map shared.
    pub fn remove(&mut self, key: &str) -> &mut Self {
        if self.vars.contains_key(key) {
            Arc::make_mut(&mut self.vars).remove(key);
        }
        self
    }

    /// Puts `dir` first on `PATH`, the way a virtualenv `activate` does.
    pub fn prepend_path(&mut self, dir: impl AsRef<Path>) -> &mut Self {
        let entry = dir.as_ref().to_string_lossy().into_owned();
        let path = match self.get("PATH") {
            Some(current) if !current.is_empty() => format!("{entry}{PATH_SEPARATOR}{current}"),
            _ => entry,
        };
        self.set("PATH", path)
    }

    /// Iterates variables in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }
}

impl<K, V> FromIterator<(K, V)> for Env
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_map(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
