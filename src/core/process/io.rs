// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! I/O streaming and output capture for processes.
//!
//! ```text
//! run_child(token)
//!   stdout/stderr reader tasks
//!   mpsc channels buffer lines
//!   wait, or on cancel: SIGTERM, grace, SIGKILL
//!   --> ProcessOutput { stdout, stderr, exit_code, interrupted }
//! ```

use crate::error::Result;
use anyhow::Context;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::builder::{ProcessBuilder, ProcessFlags, ProcessOutput, StreamFlags};

/// Grace period between SIGTERM and SIGKILL on cancellation.
const TERMINATE_GRACE: Duration = Duration::from_secs(5);

/// Spawns a reader task for a child stream if its flags need the output.
fn spawn_reader<R>(
    stream: Option<R>,
    flags: StreamFlags,
    process_name: &str,
    stream_name: &'static str,
    tx: mpsc::UnboundedSender<String>,
) -> Option<JoinHandle<()>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    if !flags.intersects(StreamFlags::FORWARD_TO_LOG | StreamFlags::KEEP_IN_STRING) {
        return None;
    }
    stream.map(|stream| {
        let name = process_name.to_string();
        tokio::spawn(async move {
            read_stream(stream, flags, &name, stream_name, tx).await;
        })
    })
}

/// Collects output from a channel into a string.
fn collect_output(rx: &mut mpsc::UnboundedReceiver<String>, flags: StreamFlags) -> String {
    if !flags.contains(StreamFlags::KEEP_IN_STRING) {
        return String::new();
    }
    let mut output = String::new();
    while let Ok(line) = rx.try_recv() {
        if !output.is_empty() {
            output.push('\n');
        }
        output.push_str(&line);
    }
    output
}

/// Waits for reader tasks to complete.
async fn await_readers(
    stdout_handle: Option<JoinHandle<()>>,
    stderr_handle: Option<JoinHandle<()>>,
) {
    if let Some(handle) = stdout_handle {
        let _ = handle.await;
    }
    if let Some(handle) = stderr_handle {
        let _ = handle.await;
    }
}

/// Terminates a child process: SIGTERM, then SIGKILL after a grace period.
async fn terminate_process(child: &mut Child, force: bool) {
    if !force && let Some(pid) = child.id() {
        let sent = tokio::process::Command::new("kill")
            .args(["-TERM", &pid.to_string()])
            .status()
            .await
            .is_ok_and(|status| status.success());
        if sent {
            if tokio::time::timeout(TERMINATE_GRACE, child.wait()).await.is_ok() {
                return;
            }
            debug!(pid = pid, "process ignored SIGTERM, killing");
        }
    }
    child.kill().await.ok();
}

impl ProcessBuilder {
    /// Streams the child's output while waiting for it to exit or for
    /// `token` to fire.
    pub(super) async fn run_child(
        &self,
        name: &str,
        child: &mut Child,
        token: CancellationToken,
    ) -> Result<ProcessOutput> {
        let (stdout_tx, mut stdout_rx) = mpsc::unbounded_channel::<String>();
        let (stderr_tx, mut stderr_rx) = mpsc::unbounded_channel::<String>();

        let stdout_handle = spawn_reader(
            child.stdout.take(),
            self.stdout_config(),
            name,
            "stdout",
            stdout_tx,
        );
        let stderr_handle = spawn_reader(
            child.stderr.take(),
            self.stderr_config(),
            name,
            "stderr",
            stderr_tx,
        );

        let force = self
            .process_flags()
            .contains(ProcessFlags::TERMINATE_ON_INTERRUPT);
        let (exit_status, interrupted) = tokio::select! {
            status = child.wait() => (status?, false),
            () = token.cancelled() => {
                warn!(process = %name, "Cancellation requested, terminating process");
                terminate_process(child, force).await;
                let status = child.wait().await
                    .with_context(|| format!("failed waiting for process {name} to exit"))?;
                (status, true)
            }
        };

        await_readers(stdout_handle, stderr_handle).await;

        Ok(ProcessOutput::new(
            exit_status.code().unwrap_or(-1),
            collect_output(&mut stdout_rx, self.stdout_config()),
            collect_output(&mut stderr_rx, self.stderr_config()),
            interrupted,
        ))
    }
}

/// Reads a stream line by line, forwarding and/or keeping each line.
async fn read_stream<R>(
    reader: R,
    flags: StreamFlags,
    process_name: &str,
    stream_name: &str,
    tx: mpsc::UnboundedSender<String>,
) where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if flags.contains(StreamFlags::FORWARD_TO_LOG) {
                    debug!(process = %process_name, stream = %stream_name, "{line}");
                } else {
                    trace!(process = %process_name, stream = %stream_name, line = %line, "output");
                }
                if flags.contains(StreamFlags::KEEP_IN_STRING) {
                    let _ = tx.send(line);
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!(
                    process = %process_name,
                    stream = %stream_name,
                    error = %e,
                    "error reading stream"
                );
                break;
            }
        }
    }
}
