// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Environment exporter.
//!
//! Persists selected variables so that later shells in the container see
//! them, and derives `S3_*` variables from `RUNPOD_S3_*`.
//!
//! ```text
//! Exporter::run(&mut Env, env_sink, rc_sink)
//!
//!   pass 1: select(env)            --> export KEY="VALUE"  --> env_sink
//!           source <env file>      --> rc_sink
//!   pass 2: rename(env, from, to)  --> env.set(new, value)
//!                                  --> export NEW="VALUE"  --> env_sink
//!           source <env file>      --> rc_sink
//!
//! ExportMode::Append   every line appended, duplicates accumulate per boot
//! ExportMode::Merge    existing lines keyed by variable, overwritten in place,
//!                      file rewritten only when it changes; source line once
//! ```
//!
//! Values are written literally between double quotes. Values containing
//! `"`, `$`, `` ` `` or `\` are interpreted by the shell that sources the file.
//! A value with a newline spans several physical lines; merge mode reads the
//! file back as records (see [`join_records`]) so such a value stays one entry.

pub mod select;
pub mod sink;


use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::types::{ExportConfig, ExportMode, RenameRule};
use crate::core::env::container::Env;
use crate::error::{ConfigError, ProvisionResult};

use select::{Selector, rename, select};
use sink::LineSink;

/// Formats a persistent export line.
#[must_use]
pub fn export_line(key: &str, value: &str) -> String {
    format!("export {key}=\"{value}\"")
}

/// Formats the line that sources the persistent file.
#[must_use]
pub fn source_line(env_file: &Path) -> String {
    format!("source {}", env_file.display())
}

/// Returns the variable name of an `export KEY=...` line.
#[must_use]
pub fn exported_key(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix("export ")?;
    let (key, _) = rest.trim_start().split_once('=')?;
    (!key.is_empty()).then_some(key)
}

/// Expands a leading `~` using `HOME` from `env`.
#[must_use]
pub fn expand_home(path: &str, env: &Env) -> PathBuf {
    let home = env.get("HOME").filter(|h| !h.is_empty()).unwrap_or("/root");
    match path.strip_prefix('~') {
        Some("") => PathBuf::from(home),
        Some(rest) if rest.starts_with('/') => PathBuf::from(format!("{home}{rest}")),
        _ => PathBuf::from(path),
    }
}

/// What a run exported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    /// Keys written by the selection pass.
    pub exported: Vec<String>,
    /// Keys created by the rename pass.
    pub derived: Vec<String>,
    /// Whether any sink was modified.
    pub changed: bool,
}

/// Selects, renames and persists environment variables.
#[derive(Debug, Clone)]
pub struct Exporter {
    selector: Selector,
    renames: Vec<RenameRule>,
    mode: ExportMode,
    env_file: PathBuf,
}

impl Exporter {
    pub fn new(
        selector: Selector,
        renames: Vec<RenameRule>,
        mode: ExportMode,
        env_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            selector,
            renames,
            mode,
            env_file: env_file.into(),
        }
    }

    /// Builds an exporter from the `[export]` section.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError::InvalidValue`] if the selection pattern
    /// cannot be compiled.
    pub fn from_config(config: &ExportConfig) -> std::result::Result<Self, ConfigError> {
        let selector = Selector::from_config(config).map_err(|e| ConfigError::InvalidValue {
            section: "export".to_string(),
            key: "prefixes".to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::new(
            selector,
            config.renames.clone(),
            config.mode,
            &config.env_file,
        ))
    }

    #[must_use]
    pub const fn mode(&self) -> ExportMode {
        self.mode
    }

    /// Runs both passes against `env`, writing to the two sinks.
    ///
    /// Derived variables are set in `env`; every process spawned with it
    /// afterwards sees them.
    ///
    /// # Errors
    ///
    /// Returns an error if a sink cannot be read or written.
    pub fn run(
        &self,
        env: &mut Env,
        env_sink: &mut dyn LineSink,
        rc_sink: &mut dyn LineSink,
    ) -> ProvisionResult<ExportReport> {
        let mut report = ExportReport::default();
        let source = source_line(&self.env_file);

        let selected = select(env, &self.selector);
        for key in selected.keys() {
            debug!(key = %key, "export");
        }
        report.changed |= self.persist(env_sink, &selected)?;
        report.changed |= self.persist_source(rc_sink, &source)?;
        report.exported = selected.into_keys().collect();

        let mut derived = BTreeMap::new();
        for rule in &self.renames {
            derived.extend(rename(env.iter(), &rule.from, &rule.to));
        }
        for (key, value) in &derived {
            debug!(key = %key, "derive");
            env.set(key.as_str(), value.as_str());
        }
        report.changed |= self.persist(env_sink, &derived)?;
        report.changed |= self.persist_source(rc_sink, &source)?;
        report.derived = derived.into_keys().collect();

        info!(
            exported = report.exported.len(),
            derived = report.derived.len(),
            file = %env_sink.describe(),
            mode = %self.mode,
            "persisted environment"
        );
        Ok(report)
    }

    fn persist(
        &self,
        sink: &mut dyn LineSink,
        vars: &BTreeMap<String, String>,
    ) -> ProvisionResult<bool> {
        if vars.is_empty() {
            return Ok(false);
        }
        let lines: Vec<String> = vars
            .iter()
            .map(|(key, value)| export_line(key, value))
            .collect();

        match self.mode {
            ExportMode::Append => {
                sink.append_lines(&lines)?;
                Ok(true)
            }
            ExportMode::Merge => {
                let existing = join_records(&sink.read_lines()?);
                let merged = merge_lines(&existing, &lines);
                if merged == existing {
                    return Ok(false);
                }
                sink.replace_lines(&merged)?;
                Ok(true)
            }
        }
    }

    fn persist_source(&self, sink: &mut dyn LineSink, source: &str) -> ProvisionResult<bool> {
        if self.mode == ExportMode::Merge
            && join_records(&sink.read_lines()?)
                .iter()
                .any(|line| line.trim() == source)
        {
            return Ok(false);
        }
        sink.append_lines(&[source.to_string()])?;
        Ok(true)
    }
}

/// Whether a double quote is still open at the end of `text`.
///
/// A backslash escapes the next character, as inside a shell `"..."`.
fn ends_inside_quotes(text: &str, mut inside: bool) -> bool {
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '"' => inside = !inside,
            _ => {}
        }
    }
    inside
}

/// Regroups physical lines into logical records.
///
/// An `export` line whose double quote is left open absorbs the following
/// lines, joined with `\n`, until the quote closes or input ends.
#[must_use]
pub fn join_records(lines: &[String]) -> Vec<String> {
    let mut records: Vec<String> = Vec::with_capacity(lines.len());
    let mut open = false;

    for line in lines {
        match records.last_mut() {
            Some(record) if open => {
                record.push('\n');
                record.push_str(line);
                open = ends_inside_quotes(line, true);
            }
            _ => {
                open = exported_key(line).is_some() && ends_inside_quotes(line, false);
                records.push(line.clone());
            }
        }
    }

    records
}

/// Overwrites existing `export` lines by key and appends new ones.
///
/// Non-export lines keep their position. Repeated exports of one key
/// collapse into the position of the first one, holding the last value.
#[must_use]
pub fn merge_lines(existing: &[String], updates: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(existing.len() + updates.len());
    let mut index: BTreeMap<&str, usize> = BTreeMap::new();

    for line in existing.iter().chain(updates) {
        match exported_key(line) {
            Some(key) => match index.get(key) {
                Some(&at) => merged[at].clone_from(line),
                None => {
                    index.insert(key, merged.len());
                    merged.push(line.clone());
                }
            },
            None => merged.push(line.clone()),
        }
    }

    merged
}
