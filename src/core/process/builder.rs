// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Process builder with configuration options.
//!
//! ```text
//! ProcessBuilder
//!  • new / resolve_in(program, &Env)
//!  • arg/args/env/flag/name
//!  • capture_stdout/capture_output, quiet, inherit_stdio
//!
//! ProcessFlags: ALLOW_FAILURE, TERMINATE_ON_INTERRUPT
//! StreamFlags: FORWARD_TO_LOG (default), BIT_BUCKET, KEEP_IN_STRING, INHERIT
//! ```

use bitflags::bitflags;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::core::env::container::Env;
use crate::error::ProcessError;

bitflags! {
    /// Flags controlling process execution behavior.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ProcessFlags: u32 {
        /// A non-zero exit is returned in the output instead of failing
        const ALLOW_FAILURE = 0x01;
        /// Kill immediately on cancellation, skipping SIGTERM
        const TERMINATE_ON_INTERRUPT = 0x02;
    }
}

bitflags! {
    /// Where a child's stdout or stderr goes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StreamFlags: u32 {
        /// Each line becomes a `debug!` event
        const FORWARD_TO_LOG = 0x01;
        /// /dev/null
        const BIT_BUCKET = 0x02;
        /// Collected into [`ProcessOutput`]
        const KEEP_IN_STRING = 0x04;
        /// Shared with rp-provision's own stdio
        const INHERIT = 0x08;
    }
}

impl Default for StreamFlags {
    fn default() -> Self {
        Self::FORWARD_TO_LOG
    }
}

/// Output from a completed process.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    exit_code: i32,
    stdout: String,
    stderr: String,
    interrupted: bool,
}

impl ProcessOutput {
    pub(super) const fn new(
        exit_code: i32,
        stdout: String,
        stderr: String,
        interrupted: bool,
    ) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            interrupted,
        }
    }

    /// Exit code, or -1 when killed by a signal or never spawned.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        self.exit_code
    }

    #[must_use]
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    #[must_use]
    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    #[must_use]
    pub const fn is_interrupted(&self) -> bool {
        self.interrupted
    }

    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Builder for configuring and running a process.
#[derive(Debug)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    /// Full child environment; inherited from the parent when unset
    env: Option<Env>,
    flags: ProcessFlags,
    stdout: StreamFlags,
    stderr: StreamFlags,
    /// Display name for logging
    name: Option<String>,
}

impl ProcessBuilder {
    /// Creates a builder for `program`.
    ///
    /// A bare name is looked up on the child's `PATH` at spawn time.
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            env: None,
            flags: ProcessFlags::empty(),
            stdout: StreamFlags::default(),
            stderr: StreamFlags::default(),
            name: None,
        }
    }

    /// Looks `program` up on the `PATH` of `env` rather than our own.
    ///
    /// Absolute and relative paths are accepted if they name an executable.
    #[must_use]
    pub fn find_in(program: &str, env: &Env) -> Option<PathBuf> {
        let cwd = std::env::current_dir().ok()?;
        which::which_in(program, env.get("PATH"), cwd).ok()
    }

    /// Creates a builder for `program` resolved against `env`, running with `env`.
    ///
    /// # Errors
    ///
    /// Returns a `ProcessError::ExecutableNotFound` if no executable matches.
    pub fn resolve_in(program: &str, env: &Env) -> std::result::Result<Self, ProcessError> {
        let path = Self::find_in(program, env).ok_or_else(|| ProcessError::ExecutableNotFound {
            name: program.to_string(),
        })?;
        Ok(Self::new(path).env(env.clone()))
    }

    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_string_lossy().into_owned()));
        self
    }

    /// Replaces the child's environment with `env`.
    #[must_use]
    pub fn env(mut self, env: Env) -> Self {
        self.env = Some(env);
        self
    }

    #[must_use]
    pub fn flag(mut self, flag: ProcessFlags) -> Self {
        self.flags |= flag;
        self
    }

    #[must_use]
    pub const fn capture_stdout(mut self) -> Self {
        self.stdout = StreamFlags::KEEP_IN_STRING;
        self
    }

    #[must_use]
    pub const fn capture_output(mut self) -> Self {
        self.stdout = StreamFlags::KEEP_IN_STRING;
        self.stderr = StreamFlags::KEEP_IN_STRING;
        self
    }

    #[must_use]
    pub const fn quiet(mut self) -> Self {
        self.stdout = StreamFlags::BIT_BUCKET;
        self.stderr = StreamFlags::BIT_BUCKET;
        self
    }

    /// Hands our stdin, stdout and stderr to the child.
    #[must_use]
    pub const fn inherit_stdio(mut self) -> Self {
        self.stdout = StreamFlags::INHERIT;
        self.stderr = StreamFlags::INHERIT;
        self
    }

    /// Sets a display name for logging and errors.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub const fn program(&self) -> &PathBuf {
        &self.program
    }

    #[must_use]
    pub fn args_slice(&self) -> &[String] {
        &self.args
    }

    pub(super) const fn environment(&self) -> Option<&Env> {
        self.env.as_ref()
    }

    pub(super) const fn process_flags(&self) -> ProcessFlags {
        self.flags
    }

    pub(super) const fn stdout_config(&self) -> StreamFlags {
        self.stdout
    }

    pub(super) const fn stderr_config(&self) -> StreamFlags {
        self.stderr
    }

    pub(super) fn name_override(&self) -> Option<&str> {
        self.name.as_deref()
    }
}
