// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::{LogConfig, LogLevel, is_secret_key, redact};

#[test]
fn test_log_level_bounds() {
    assert!(LogLevel::new(0).is_ok());
    assert!(LogLevel::new(6).is_ok());
    assert!(LogLevel::new(7).is_err());
    assert_eq!(LogLevel::from_u8(9), None);
    assert_eq!(LogLevel::from_u8(4), Some(LogLevel::DEBUG));
}

#[test]
fn test_log_level_filter_strings() {
    insta::assert_snapshot!(LogLevel::SILENT.to_filter_string(), @"off");
    insta::assert_snapshot!(LogLevel::ERROR.to_filter_string(), @"error");
    insta::assert_snapshot!(LogLevel::DUMP.to_filter_string(), @"trace");
    assert!(LogLevel::INFO.to_filter_string().starts_with("info,"));
}

#[test]
fn test_log_level_serde_roundtrip() {
    let level: LogLevel = serde_json::from_str("5").unwrap();
    assert_eq!(level, LogLevel::TRACE);
    assert_eq!(serde_json::to_string(&level).unwrap(), "5");
    assert!(serde_json::from_str::<LogLevel>("12").is_err());
}

#[test]
fn test_log_config_defaults() {
    let config = LogConfig::default();
    assert_eq!(config.console_level(), LogLevel::INFO);
    assert_eq!(config.file_level(), LogLevel::TRACE);
    assert!(config.log_file().is_none());
    assert!(!config.console_level().shows_target());
    assert!(LogLevel::DEBUG.shows_target());
}

#[test]
fn test_secret_detection() {
    assert!(is_secret_key("RUNPOD_S3_SECRET_ACCESS_KEY"));
    assert!(is_secret_key("RUNPOD_S3_ACCESS_KEY_ID"));
    assert!(is_secret_key("hf_token"));
    assert!(!is_secret_key("RUNPOD_S3_BUCKET"));
    assert!(!is_secret_key("PATH"));
}

#[test]
fn test_redact() {
    assert_eq!(redact("S3_SECRET_ACCESS_KEY", "abc"), "[hidden]");
    assert_eq!(redact("S3_BUCKET", "mybucket"), "mybucket");
}

#[test]
fn test_log_config_with_file() {
    let config = LogConfig::builder()
        .with_console_level(LogLevel::WARN)
        .with_log_file("/var/log/rp-provision.log")
        .build();
    assert_eq!(
        config.log_file(),
        Some(std::path::Path::new("/var/log/rp-provision.log"))
    );
    assert!(LogLevel::WARN < LogLevel::DEBUG);
}
