// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Process execution and lifecycle management.
//!
//! ```text
//! run() / run_with_cancellation(token)
//!              |
//!              v
//!     build_command()
//!     args, env_clear + Env, stdio
//!              |
//!              v
//!      spawn() --> run_child
//!              |
//!              v
//!    exit_code != 0 && !ALLOW_FAILURE
//!      --> ProcessError::NonZeroExit
//!              |
//!              v
//!       ProcessOutput
//! ```

use crate::error::{ProcessError, Result};
use std::fmt::Write as _;
use std::process::Stdio;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};

use super::builder::{ProcessBuilder, ProcessFlags, ProcessOutput, StreamFlags};

impl ProcessBuilder {
    /// Name used in logs and [`ProcessError`]s: the override, else the
    /// program's file name.
    fn display_name(&self) -> String {
        if let Some(name) = self.name_override() {
            return name.to_string();
        }
        self.program()
            .file_name()
            .map_or_else(|| "process".to_string(), |s| s.to_string_lossy().into_owned())
    }

    /// The command line as a shell would show it, quoting arguments with spaces.
    #[must_use]
    pub fn command_line(&self) -> String {
        let mut cmd = self.program().display().to_string();
        for arg in self.args_slice() {
            if arg.contains(' ') {
                let _ = write!(cmd, " \"{arg}\"");
            } else {
                let _ = write!(cmd, " {arg}");
            }
        }
        cmd
    }

    /// Spawns the process and waits for it.
    ///
    /// # Errors
    ///
    /// Returns an error if spawning fails, or a
    /// [`ProcessError::NonZeroExit`] carrying the child's code when it exits
    /// non-zero without `ALLOW_FAILURE`.
    pub async fn run(self) -> Result<ProcessOutput> {
        self.run_with_cancellation(CancellationToken::new()).await
    }

    /// Spawns the process and waits for it or for `token`.
    ///
    /// On cancellation the child receives SIGTERM, then SIGKILL after a
    /// grace period (immediately with `TERMINATE_ON_INTERRUPT`), and the
    /// output comes back with `interrupted = true`. A token that is already
    /// cancelled prevents the spawn.
    ///
    /// # Errors
    ///
    /// Same as [`ProcessBuilder::run`]; an interrupted process is never
    /// reported as a failed exit.
    pub async fn run_with_cancellation(self, token: CancellationToken) -> Result<ProcessOutput> {
        let name = self.display_name();

        if token.is_cancelled() {
            return Ok(ProcessOutput::new(-1, String::new(), String::new(), true));
        }

        let mut child = self.spawn(&name)?;
        let output = self.run_child(&name, &mut child, token).await?;

        if output.is_interrupted() {
            trace!(process = %name, exit_code = output.exit_code(), "interrupted");
            return Ok(output);
        }
        self.check_exit(&name, output)
    }

    fn spawn(&self, name: &str) -> Result<tokio::process::Child> {
        let cmd_line = self.command_line();
        debug!(cmd = %cmd_line, "exec");

        let child = self
            .build_command()
            .spawn()
            .map_err(|source| ProcessError::SpawnFailed {
                command: cmd_line,
                source,
            })?;

        trace!(process = %name, pid = ?child.id(), "spawned");
        Ok(child)
    }

    fn check_exit(&self, name: &str, output: ProcessOutput) -> Result<ProcessOutput> {
        if output.success() || self.process_flags().contains(ProcessFlags::ALLOW_FAILURE) {
            trace!(process = %name, exit_code = output.exit_code(), "completed");
            return Ok(output);
        }

        if !output.stderr().is_empty() {
            error!(process = %name, stderr = %output.stderr(), "process error output");
        }
        Err(ProcessError::NonZeroExit {
            command: name.to_string(),
            code: output.exit_code(),
        }
        .into())
    }

    fn build_command(&self) -> Command {
        let mut command = Command::new(self.program());
        command.args(self.args_slice());

        if let Some(env) = self.environment() {
            command.env_clear();
            command.envs(env.iter());
        }

        // Scripts run in the foreground of the container get our stdin too.
        if self.stdout_config().contains(StreamFlags::INHERIT) {
            command.stdin(Stdio::inherit());
        } else {
            command.stdin(Stdio::null());
        }

        command.stdout(stdio_for(self.stdout_config()));
        command.stderr(stdio_for(self.stderr_config()));
        command.kill_on_drop(true);

        command
    }
}

fn stdio_for(flags: StreamFlags) -> Stdio {
    if flags.contains(StreamFlags::INHERIT) {
        Stdio::inherit()
    } else if flags.contains(StreamFlags::BIT_BUCKET) {
        Stdio::null()
    } else {
        Stdio::piped()
    }
}
