// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Log capture for assertions on emitted events.

use std::io::Write;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

/// Shared buffer that is both the writer and its factory.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> Result<String> {
        let bytes = self
            .0
            .lock()
            .map_err(|_| anyhow::anyhow!("log buffer poisoned"))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| std::io::Error::other("log buffer poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Runs `f` with INFO-level events captured; returns its value and the log.
pub(crate) async fn run_with_logs<F, Fut, T>(f: F) -> Result<(T, String)>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_writer(buffer.clone())
        .with_max_level(Level::INFO)
        .with_ansi(false)
        .with_target(false)
        .with_level(false)
        .finish();

    let _guard = tracing::subscriber::set_default(subscriber);
    let value = f().await?;
    Ok((value, buffer.contents()?))
}
