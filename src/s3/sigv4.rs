// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! AWS Signature Version 4 for S3 requests.
//!
//! ```text
//! canonical request --sha256--> string to sign
//! secret -> kDate -> kRegion -> kService -> kSigning   (HMAC-SHA256 chain)
//! signature = hex(HMAC(kSigning, string to sign))
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::error::{ProvisionResult, S3Error};

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Payload hash used for requests whose body is not signed.
pub const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

const SERVICE: &str = "s3";

/// `x-amz-date` format.
#[must_use]
pub fn amz_date(now: DateTime<Utc>) -> String {
    now.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Percent-encodes everything except unreserved characters.
///
/// `/` is kept as-is unless `encode_slash` is set.
#[must_use]
pub fn uri_encode(input: &str, encode_slash: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char);
            }
            b'/' if !encode_slash => out.push('/'),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// Request signer for one set of credentials and region.
#[derive(Clone)]
pub struct Signer {
    access_key_id: String,
    secret_access_key: String,
    region: String,
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[hidden]")
            .field("region", &self.region)
            .finish()
    }
}

impl Signer {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
        }
    }

    /// Returns the `Authorization` header value.
    ///
    /// `headers` holds every header to sign with lowercase names; it must
    /// contain `host`, `x-amz-date` (matching `now`) and
    /// `x-amz-content-sha256` (equal to `payload_hash`).
    ///
    /// # Errors
    ///
    /// Returns [`S3Error::Signing`] if the HMAC cannot be keyed.
    pub fn authorization(
        &self,
        method: &str,
        canonical_uri: &str,
        headers: &BTreeMap<String, String>,
        payload_hash: &str,
        now: DateTime<Utc>,
    ) -> ProvisionResult<String> {
        let date = now.format("%Y%m%d").to_string();
        let scope = format!("{date}/{}/{SERVICE}/aws4_request", self.region);
        let signed_headers = signed_headers(headers);

        let request = canonical_request(method, canonical_uri, headers, payload_hash);
        let to_sign = string_to_sign(&amz_date(now), &scope, &request);

        let key = self.signing_key(&date)?;
        let signature = hex::encode(hmac(&key, to_sign.as_bytes())?);

        Ok(format!(
            "{ALGORITHM} Credential={}/{scope},SignedHeaders={signed_headers},Signature={signature}",
            self.access_key_id
        ))
    }

    fn signing_key(&self, date: &str) -> ProvisionResult<Vec<u8>> {
        let secret = format!("AWS4{}", self.secret_access_key);
        let k_date = hmac(secret.as_bytes(), date.as_bytes())?;
        let k_region = hmac(&k_date, self.region.as_bytes())?;
        let k_service = hmac(&k_region, SERVICE.as_bytes())?;
        hmac(&k_service, b"aws4_request")
    }
}

/// Semicolon-separated header names, sorted.
#[must_use]
pub fn signed_headers(headers: &BTreeMap<String, String>) -> String {
    headers.keys().map(String::as_str).collect::<Vec<_>>().join(";")
}

/// Canonical request with an empty query string.
#[must_use]
pub fn canonical_request(
    method: &str,
    canonical_uri: &str,
    headers: &BTreeMap<String, String>,
    payload_hash: &str,
) -> String {
    let canonical_headers: String = headers
        .iter()
        .map(|(name, value)| format!("{name}:{}\n", value.trim()))
        .collect();
    format!(
        "{method}\n{canonical_uri}\n\n{canonical_headers}\n{}\n{payload_hash}",
        signed_headers(headers)
    )
}

#[must_use]
pub fn string_to_sign(amz_date: &str, scope: &str, canonical_request: &str) -> String {
    let hashed = hex::encode(Sha256::digest(canonical_request.as_bytes()));
    format!("{ALGORITHM}\n{amz_date}\n{scope}\n{hashed}")
}

fn hmac(key: &[u8], data: &[u8]) -> ProvisionResult<Vec<u8>> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| S3Error::Signing(e.to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}
