// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Error types.
//!
//! Commands and steps return [`anyhow::Result`]; typed errors below are
//! attached so callers can recover specifics, such as the exit code of a
//! failed start script via [`child_exit_code`].
//!
//! ```text
//! ProvisionError   one Box per domain, 16 bytes
//!   Network   HttpError, Reqwest, ChecksumMismatch, Interrupted
//!   Config    InvalidValue
//!   Step      Interrupted
//!   Process   ExecutableNotFound, SpawnFailed, NonZeroExit
//!   Fs        IoError (with path)
//!   S3        MissingEnv, ObjectNotFound, Status, ShortChunk
//!   Io
//! ```

use thiserror::Error;

pub type Result<T> = anyhow::Result<T>;

pub type ProvisionResult<T> = std::result::Result<T, ProvisionError>;

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("network error: {0}")]
    Network(#[from] Box<NetworkError>),

    #[error("config error: {0}")]
    Config(#[from] Box<ConfigError>),

    #[error("step error: {0}")]
    Step(#[from] Box<StepError>),

    #[error("process error: {0}")]
    Process(#[from] Box<ProcessError>),

    #[error("filesystem error: {0}")]
    Fs(#[from] Box<FsError>),

    #[error("s3 error: {0}")]
    S3(#[from] Box<S3Error>),

    #[error("io error: {0}")]
    Io(Box<std::io::Error>),
}

/// `From<E>` for each sub-error, boxing it into its variant.
macro_rules! impl_from_boxed {
    ($($error:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$error> for ProvisionError {
                fn from(err: $error) -> Self {
                    ProvisionError::$variant(Box::new(err))
                }
            }
        )+
    };
}

impl_from_boxed! {
    NetworkError => Network,
    ConfigError => Config,
    StepError => Step,
    ProcessError => Process,
    FsError => Fs,
    S3Error => S3,
    std::io::Error => Io,
}

/// Exit code of a failed child process anywhere in the error chain.
#[must_use]
pub fn child_exit_code(err: &anyhow::Error) -> Option<i32> {
    err.chain().find_map(|cause| {
        if let Some(ProcessError::NonZeroExit { code, .. }) = cause.downcast_ref::<ProcessError>() {
            return Some(*code);
        }
        match cause.downcast_ref::<ProvisionError>() {
            Some(ProvisionError::Process(boxed)) => match boxed.as_ref() {
                ProcessError::NonZeroExit { code, .. } => Some(*code),
                _ => None,
            },
            _ => None,
        }
    })
}

// --- Network Errors ---

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("download of {url} failed: {message}")]
    DownloadFailed { url: String, message: String },

    /// Cancelled by Ctrl-C or SIGTERM; the partial file is gone.
    #[error("download interrupted")]
    Interrupted,

    #[error("http error {status}: {url}")]
    HttpError { status: u16, url: String },

    #[error("request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Digest of the artifact on disk differs from `artifact.sha256`.
    #[error("checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("read failed during checksum: {0}")]
    Io(#[from] std::io::Error),
}

// --- Config Errors ---

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Rejected by validation, a `--set` parse or a log level bound.
    #[error("invalid value for '{key}' in section '[{section}]': {message}")]
    InvalidValue {
        section: String,
        key: String,
        message: String,
    },
}

// --- Step Errors ---

#[derive(Debug, Error)]
pub enum StepError {
    #[error("step '{0}' was interrupted")]
    Interrupted(String),
}

// --- Process Errors ---

#[derive(Debug, Error)]
pub enum ProcessError {
    /// Lookup uses the `PATH` of the environment the child would get.
    #[error("executable not found: '{name}' (not in PATH)")]
    ExecutableNotFound { name: String },

    #[error("failed to spawn process '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// A child killed by a signal reports code -1.
    #[error("process '{command}' exited with code {code}")]
    NonZeroExit { command: String, code: i32 },
}

// --- Filesystem Errors ---

#[derive(Debug, Error)]
pub enum FsError {
    #[error("I/O error on '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl FsError {
    /// Wraps an I/O error with the path it occurred on.
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

// --- S3 Errors ---

#[derive(Debug, Error)]
pub enum S3Error {
    /// All missing `RUNPOD_S3_*` names, reported together.
    #[error("missing required environment variables: {}", .0.join(", "))]
    MissingEnv(Vec<String>),

    #[error("object not found: s3://{bucket}/{key}")]
    ObjectNotFound { bucket: String, key: String },

    #[error("unexpected status {status} for s3://{bucket}/{key}")]
    Status {
        status: u16,
        bucket: String,
        key: String,
    },

    /// HEAD response carried no usable Content-Length.
    #[error("missing content length for s3://{bucket}/{key}")]
    MissingLength { bucket: String, key: String },

    /// A ranged part came back with the wrong size.
    #[error("chunk {index} returned {actual} bytes, expected {expected}")]
    ShortChunk {
        index: u64,
        expected: u64,
        actual: u64,
    },

    #[error("request signing failed: {0}")]
    Signing(String),
}
