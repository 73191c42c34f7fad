// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Signed S3 requests: `HEAD` for the object size and (ranged) `GET`.

use std::collections::BTreeMap;

use chrono::Utc;
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, RANGE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use tracing::trace;

use super::download::ByteRange;
use super::settings::S3Settings;
use super::sigv4::{self, Signer, UNSIGNED_PAYLOAD};
use crate::error::{NetworkError, ProvisionResult, S3Error};
use crate::net::global_client;

#[derive(Debug, Clone)]
pub struct S3Client {
    http: Client,
    settings: S3Settings,
    signer: Signer,
}

impl S3Client {
    #[must_use]
    pub fn new(settings: S3Settings) -> Self {
        let signer = Signer::new(
            &settings.access_key_id,
            &settings.secret_access_key,
            &settings.region,
        );
        Self {
            http: global_client().clone(),
            settings,
            signer,
        }
    }

    #[must_use]
    pub const fn settings(&self) -> &S3Settings {
        &self.settings
    }

    /// Returns the object size in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`S3Error::ObjectNotFound`] on 404, [`S3Error::Status`] on any
    /// other failure status, [`S3Error::MissingLength`] if the response has
    /// no usable `Content-Length`.
    pub async fn head_object(&self, key: &str) -> ProvisionResult<u64> {
        let response = self
            .request(Method::HEAD, key, None)?
            .send()
            .await
            .map_err(NetworkError::Reqwest)?;
        let response = self.check_status(key, response)?;

        // `Response::content_length` reports the (empty) body size for HEAD.
        response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .ok_or_else(|| {
                S3Error::MissingLength {
                    bucket: self.settings.bucket.clone(),
                    key: key.to_string(),
                }
                .into()
            })
    }

    /// Sends a `GET` for the whole object or one byte range.
    ///
    /// # Errors
    ///
    /// Same status mapping as [`S3Client::head_object`].
    pub async fn get_object(
        &self,
        key: &str,
        range: Option<ByteRange>,
    ) -> ProvisionResult<Response> {
        let response = self
            .request(Method::GET, key, range)?
            .send()
            .await
            .map_err(NetworkError::Reqwest)?;
        self.check_status(key, response)
    }

    fn check_status(&self, key: &str, response: Response) -> ProvisionResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let bucket = self.settings.bucket.clone();
        let key = key.to_string();
        Err(if status == StatusCode::NOT_FOUND {
            S3Error::ObjectNotFound { bucket, key }
        } else {
            S3Error::Status {
                status: status.as_u16(),
                bucket,
                key,
            }
        }
        .into())
    }

    fn request(
        &self,
        method: Method,
        key: &str,
        range: Option<ByteRange>,
    ) -> ProvisionResult<RequestBuilder> {
        let raw = self.settings.object_url(key);
        let url = Url::parse(&raw).map_err(|e| NetworkError::InvalidUrl(format!("{raw}: {e}")))?;
        let host = url
            .host_str()
            .ok_or_else(|| NetworkError::InvalidUrl(format!("{raw}: no host")))?;
        let host = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        let now = Utc::now();
        let amz_date = sigv4::amz_date(now);
        let mut headers = BTreeMap::from([
            ("host".to_string(), host),
            ("x-amz-content-sha256".to_string(), UNSIGNED_PAYLOAD.to_string()),
            ("x-amz-date".to_string(), amz_date.clone()),
        ]);
        if let Some(range) = range {
            headers.insert("range".to_string(), range.header());
        }

        let authorization =
            self.signer
                .authorization(method.as_str(), url.path(), &headers, UNSIGNED_PAYLOAD, now)?;
        trace!(method = %method, url = %url, "signed s3 request");

        let mut request = self
            .http
            .request(method, url)
            .header("x-amz-content-sha256", UNSIGNED_PAYLOAD)
            .header("x-amz-date", amz_date)
            .header(AUTHORIZATION, authorization);
        if let Some(range) = range {
            request = request.header(RANGE, range.header());
        }
        Ok(request)
    }
}
