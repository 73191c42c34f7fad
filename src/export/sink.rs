// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Line-oriented persistence targets for the exporter.
//!
//! ```text
//! LineSink
//!   FileSink    real file; append, or atomic rewrite via tempfile
//!   MemorySink  Vec<String>; tests and dry runs
//! ```

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use crate::error::{FsError, ProvisionResult};

/// Mode for files the exporter creates.
const NEW_FILE_MODE: u32 = 0o644;

/// A destination that stores text lines.
pub trait LineSink {
    /// Human-readable name for logs.
    fn describe(&self) -> String;

    /// Returns the current lines; an absent target has none.
    ///
    /// # Errors
    ///
    /// Returns an error if the target exists but cannot be read.
    fn read_lines(&self) -> ProvisionResult<Vec<String>>;

    /// Appends lines after the existing content.
    ///
    /// # Errors
    ///
    /// Returns an error if the target cannot be written.
    fn append_lines(&mut self, lines: &[String]) -> ProvisionResult<()>;

    /// Replaces the whole content with `lines`.
    ///
    /// # Errors
    ///
    /// Returns an error if the target cannot be written.
    fn replace_lines(&mut self, lines: &[String]) -> ProvisionResult<()>;
}

/// A file on disk. Parent directories are created on first write.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent(&self) -> ProvisionResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| FsError::io(parent, e))?;
        }
        Ok(())
    }

    /// True when the file exists, is non-empty and lacks a trailing newline.
    fn needs_leading_newline(&self) -> bool {
        fs::read(&self.path)
            .is_ok_and(|bytes| bytes.last().is_some_and(|last| *last != b'\n'))
    }
}

impl LineSink for FileSink {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn read_lines(&self) -> ProvisionResult<Vec<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(content.lines().map(String::from).collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(FsError::io(&self.path, e).into()),
        }
    }

    fn append_lines(&mut self, lines: &[String]) -> ProvisionResult<()> {
        if lines.is_empty() {
            return Ok(());
        }
        self.ensure_parent()?;

        let mut buf = String::new();
        if self.needs_leading_newline() {
            buf.push('\n');
        }
        for line in lines {
            buf.push_str(line);
            buf.push('\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| FsError::io(&self.path, e))?;
        file.write_all(buf.as_bytes())
            .map_err(|e| FsError::io(&self.path, e))?;
        Ok(())
    }

    fn replace_lines(&mut self, lines: &[String]) -> ProvisionResult<()> {
        self.ensure_parent()?;
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mode = fs::metadata(&self.path)
            .map_or(NEW_FILE_MODE, |meta| meta.permissions().mode());

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| FsError::io(dir, e))?;
        for line in lines {
            writeln!(tmp, "{line}").map_err(|e| FsError::io(tmp.path(), e))?;
        }
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(mode))
            .map_err(|e| FsError::io(tmp.path(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| FsError::io(&self.path, e.error))?;
        Ok(())
    }
}

/// In-memory lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySink {
    name: String,
    lines: Vec<String>,
}

impl MemorySink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lines: Vec::new(),
        }
    }

    /// Starts from existing content, as if read from a file.
    #[must_use]
    pub fn with_lines<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lines = lines.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl LineSink for MemorySink {
    fn describe(&self) -> String {
        format!("<memory:{}>", self.name)
    }

    fn read_lines(&self) -> ProvisionResult<Vec<String>> {
        Ok(self.lines.clone())
    }

    fn append_lines(&mut self, lines: &[String]) -> ProvisionResult<()> {
        self.lines.extend_from_slice(lines);
        Ok(())
    }

    fn replace_lines(&mut self, lines: &[String]) -> ProvisionResult<()> {
        self.lines = lines.to_vec();
        Ok(())
    }
}
