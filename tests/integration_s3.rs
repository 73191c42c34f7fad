// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for the parallel S3 downloader using wiremock.
//!
//! The mock server stands in for a path-style S3 endpoint
//! (`RUNPOD_S3_ENDPOINT`), so requests arrive as `/<bucket>/<key>`.

use rp_provision::core::env::container::Env;
use rp_provision::s3::client::S3Client;
use rp_provision::s3::{S3Downloader, S3Settings};
use tempfile::TempDir;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BODY: &[u8] = b"0123456789";

fn settings(server: &MockServer) -> S3Settings {
    let mut env: Env = [
        ("RUNPOD_S3_BUCKET", "bucket"),
        ("RUNPOD_S3_ACCESS_KEY_ID", "AKIDEXAMPLE"),
        ("RUNPOD_S3_SECRET_ACCESS_KEY", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY"),
        ("RUNPOD_S3_REGION", "us-east-1"),
    ]
    .into_iter()
    .collect();
    env.set("RUNPOD_S3_ENDPOINT", server.uri());
    S3Settings::from_env(&env).expect("complete settings")
}

async fn mount_head(server: &MockServer, key: &str, size: usize) {
    Mock::given(method("HEAD"))
        .and(path(format!("/bucket/{key}")))
        .and(header_exists("authorization"))
        .and(header("x-amz-content-sha256", "UNSIGNED-PAYLOAD"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-length", size.to_string()))
        .mount(server)
        .await;
}

async fn mount_range(server: &MockServer, key: &str, start: usize, end: usize, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(format!("/bucket/{key}")))
        .and(header("range", format!("bytes={start}-{end}").as_str()))
        .respond_with(ResponseTemplate::new(206).set_body_bytes(body.to_vec()))
        .expect(1)
        .mount(server)
        .await;
}

fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}

// =============================================================================
// HEAD
// =============================================================================

#[tokio::test]
async fn test_head_object_reads_size() {
    let server = MockServer::start().await;
    mount_head(&server, "models/weights.bin", 1234).await;

    let client = S3Client::new(settings(&server));
    assert_eq!(client.head_object("models/weights.bin").await.unwrap(), 1234);
}

#[tokio::test]
async fn test_missing_object_reports_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = temp_dir();
    let err = S3Downloader::new(settings(&server))
        .silent()
        .download("missing.bin", dir.path())
        .await
        .unwrap_err();

    insta::assert_snapshot!(err.to_string(), @"s3 error: object not found: s3://bucket/missing.bin");
    assert!(!dir.path().join("missing.bin").exists());
}

#[tokio::test]
async fn test_forbidden_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let dir = temp_dir();
    let err = S3Downloader::new(settings(&server))
        .silent()
        .download("secret.bin", dir.path())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("unexpected status 403"), "{err}");
}

// =============================================================================
// Downloads
// =============================================================================

#[tokio::test]
async fn test_small_object_single_request() {
    let server = MockServer::start().await;
    mount_head(&server, "small.txt", BODY.len()).await;
    Mock::given(method("GET"))
        .and(path("/bucket/small.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(BODY.to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = temp_dir();
    let dest = dir.path().join("out");
    let path = S3Downloader::new(settings(&server))
        .silent()
        .download("small.txt", &dest)
        .await
        .unwrap();

    assert_eq!(path, dest.join("small.txt"));
    assert_eq!(std::fs::read(&path).unwrap(), BODY);
}

#[tokio::test]
async fn test_large_object_ranged_requests() {
    let server = MockServer::start().await;
    let key = "models/weights.bin";
    mount_head(&server, key, BODY.len()).await;
    mount_range(&server, key, 0, 3, &BODY[0..4]).await;
    mount_range(&server, key, 4, 7, &BODY[4..8]).await;
    mount_range(&server, key, 8, 9, &BODY[8..10]).await;

    let dir = temp_dir();
    let path = S3Downloader::new(settings(&server))
        .workers(2)
        .chunk_size(4)
        .silent()
        .download(key, dir.path())
        .await
        .unwrap();

    assert_eq!(path, dir.path().join("weights.bin"));
    assert_eq!(std::fs::read(&path).unwrap(), BODY);
}

#[tokio::test]
async fn test_exact_multiple_of_chunk_size() {
    let server = MockServer::start().await;
    mount_head(&server, "even.bin", 8).await;
    mount_range(&server, "even.bin", 0, 3, &BODY[0..4]).await;
    mount_range(&server, "even.bin", 4, 7, &BODY[4..8]).await;

    let dir = temp_dir();
    let path = S3Downloader::new(settings(&server))
        .workers(12)
        .chunk_size(4)
        .silent()
        .download("even.bin", dir.path())
        .await
        .unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), &BODY[..8]);
}

#[tokio::test]
async fn test_short_chunk_removes_partial_file() {
    let server = MockServer::start().await;
    let key = "broken.bin";
    mount_head(&server, key, BODY.len()).await;
    mount_range(&server, key, 0, 3, &BODY[0..4]).await;
    // one byte short
    mount_range(&server, key, 4, 7, &BODY[4..7]).await;
    // never requested: one worker stops at the first bad part
    Mock::given(method("GET"))
        .and(header("range", "bytes=8-9"))
        .respond_with(ResponseTemplate::new(206).set_body_bytes(BODY[8..10].to_vec()))
        .mount(&server)
        .await;

    let dir = temp_dir();
    let err = S3Downloader::new(settings(&server))
        .workers(1)
        .chunk_size(4)
        .silent()
        .download(key, dir.path())
        .await
        .unwrap_err();

    insta::assert_snapshot!(err.to_string(), @"s3 error: chunk 1 returned 3 bytes, expected 4");
    assert!(!dir.path().join(key).exists());
}
