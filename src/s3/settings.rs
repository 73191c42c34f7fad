// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! S3 connection settings read from `RUNPOD_S3_*` variables.

use crate::core::env::container::Env;
use crate::error::{ProvisionResult, S3Error};

pub const BUCKET: &str = "RUNPOD_S3_BUCKET";
pub const ACCESS_KEY_ID: &str = "RUNPOD_S3_ACCESS_KEY_ID";
pub const SECRET_ACCESS_KEY: &str = "RUNPOD_S3_SECRET_ACCESS_KEY";
pub const REGION: &str = "RUNPOD_S3_REGION";
pub const ENDPOINT: &str = "RUNPOD_S3_ENDPOINT";

/// Variables that must be present and non-empty.
pub const REQUIRED: [&str; 4] = [BUCKET, ACCESS_KEY_ID, SECRET_ACCESS_KEY, REGION];

#[derive(Clone, PartialEq, Eq)]
pub struct S3Settings {
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    pub endpoint: String,
}

impl std::fmt::Debug for S3Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Settings")
            .field("bucket", &self.bucket)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[hidden]")
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl S3Settings {
    /// Reads settings from `env`.
    ///
    /// Without `RUNPOD_S3_ENDPOINT` the regional AWS endpoint is used.
    ///
    /// # Errors
    ///
    /// Returns [`S3Error::MissingEnv`] naming every required variable that
    /// is unset or empty.
    pub fn from_env(env: &Env) -> ProvisionResult<Self> {
        let lookup = |key: &str| env.get(key).filter(|v| !v.is_empty());

        let missing: Vec<String> = REQUIRED
            .iter()
            .filter(|key| lookup(key).is_none())
            .map(|key| (*key).to_string())
            .collect();
        if !missing.is_empty() {
            return Err(S3Error::MissingEnv(missing).into());
        }

        let value = |key: &str| lookup(key).unwrap_or_default().to_string();
        let region = value(REGION);
        let endpoint = lookup(ENDPOINT).map_or_else(
            || format!("https://s3.{region}.amazonaws.com"),
            |e| e.trim_end_matches('/').to_string(),
        );

        Ok(Self {
            bucket: value(BUCKET),
            access_key_id: value(ACCESS_KEY_ID),
            secret_access_key: value(SECRET_ACCESS_KEY),
            region,
            endpoint,
        })
    }

    /// Path-style URL of `key`.
    #[must_use]
    pub fn object_url(&self, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.endpoint,
            super::sigv4::uri_encode(&self.bucket, true),
            super::sigv4::uri_encode(key, false)
        )
    }
}
