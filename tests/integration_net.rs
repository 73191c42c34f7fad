// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for the HTTP downloader using wiremock.
//!
//! Covers:
//! - File downloads into missing parent directories
//! - HTTP errors leaving no partial file
//! - Custom headers
//! - Cancellation
//! - SHA-256 verification

use rp_provision::error::{NetworkError, ProvisionError};
use rp_provision::net::{Downloader, sha256_file, verify_sha256};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}

// =============================================================================
// download tests
// =============================================================================

#[tokio::test]
async fn test_download_creates_parent_dirs() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bundle.tar.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = temp_dir();
    let output = dir.path().join("nested/deeper/bundle.tar.gz");
    Downloader::new()
        .url(format!("{}/bundle.tar.gz", mock_server.uri()))
        .file(&output)
        .silent()
        .download()
        .await
        .unwrap();

    assert_eq!(std::fs::read_to_string(&output).unwrap(), "hello");
}

#[tokio::test]
async fn test_download_http_errors_leave_no_file() {
    for status in [404u16, 500] {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&mock_server)
            .await;

        let dir = temp_dir();
        let output = dir.path().join("out.bin");
        let err = Downloader::new()
            .url(format!("{}/out.bin", mock_server.uri()))
            .file(&output)
            .silent()
            .download()
            .await
            .unwrap_err();

        match err {
            ProvisionError::Network(inner) => match *inner {
                NetworkError::HttpError { status: got, .. } => assert_eq!(got, status),
                other => panic!("unexpected network error: {other}"),
            },
            other => panic!("unexpected error: {other}"),
        }
        assert!(!output.exists());
    }
}

#[tokio::test]
async fn test_download_sends_custom_headers() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/private.bin"))
        .and(header("authorization", "Bearer token"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 32]))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = temp_dir();
    let output = dir.path().join("private.bin");
    Downloader::new()
        .url(format!("{}/private.bin", mock_server.uri()))
        .file(&output)
        .header("Authorization", "Bearer token")
        .silent()
        .download()
        .await
        .unwrap();

    assert_eq!(std::fs::read(&output).unwrap(), vec![7u8; 32]);
}

#[tokio::test]
async fn test_download_cancelled_before_start() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("unused"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let token = CancellationToken::new();
    token.cancel();

    let dir = temp_dir();
    let output = dir.path().join("never.bin");
    let err = Downloader::new()
        .url(format!("{}/never.bin", mock_server.uri()))
        .file(&output)
        .cancel_token(token)
        .silent()
        .download()
        .await
        .unwrap_err();

    insta::assert_snapshot!(err.to_string(), @"network error: download interrupted");
    assert!(!output.exists());
}

#[tokio::test]
async fn test_download_requires_url_and_file() {
    assert!(Downloader::new().file("/nonexistent/x").download().await.is_err());
    assert!(
        Downloader::new()
            .url("http://127.0.0.1:9/x")
            .download()
            .await
            .is_err()
    );
}

// =============================================================================
// checksum tests
// =============================================================================

#[tokio::test]
async fn test_sha256_file() {
    let dir = temp_dir();
    let file = dir.path().join("hello.txt");
    std::fs::write(&file, "hello").unwrap();

    assert_eq!(sha256_file(&file).await.unwrap(), HELLO_SHA256);
    verify_sha256(&file, &HELLO_SHA256.to_uppercase()).await.unwrap();
}

#[tokio::test]
async fn test_verify_sha256_mismatch() {
    let dir = temp_dir();
    let file = dir.path().join("hello.txt");
    std::fs::write(&file, "hello!").unwrap();

    let err = verify_sha256(&file, HELLO_SHA256).await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("checksum mismatch"), "{message}");
    assert!(message.contains(HELLO_SHA256), "{message}");
}

#[tokio::test]
async fn test_sha256_missing_file() {
    assert!(sha256_file(std::path::Path::new("/nonexistent/file")).await.is_err());
}
