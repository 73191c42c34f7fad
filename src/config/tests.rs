// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::loader::ConfigSource;
use super::{Config, ConfigLoader};
use crate::config::types::{ArtifactSource, ExportMode, RenameRule};
use crate::logging::LogLevel;
use std::path::PathBuf;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert!(!config.global.dry);
    assert_eq!(config.global.output_log_level, LogLevel::INFO);
    assert_eq!(config.export.env_file, PathBuf::from("/etc/rp_environment"));
    assert_eq!(config.export.shell_rc, "~/.bashrc");
    assert_eq!(config.export.mode, ExportMode::Merge);
    assert_eq!(config.export.prefixes, ["RUNPOD_"]);
    assert_eq!(config.export.renames, [RenameRule::new("RUNPOD_S3_", "S3_")]);
    assert_eq!(config.delegate.script, PathBuf::from("/app/cnode/start.sh"));
    assert_eq!(config.start.script, config.delegate.script);
    assert_eq!(config.s3.workers, 12);
    assert_eq!(config.s3.chunk_size_bytes(), 64 * 1024 * 1024);
}

#[test]
fn test_export_mode_parse() {
    assert_eq!("MERGE".parse::<ExportMode>().unwrap(), ExportMode::Merge);
    assert_eq!("append".parse::<ExportMode>().unwrap(), ExportMode::Append);
    let err = "overwrite".parse::<ExportMode>().unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @"invalid value for 'mode' in section '[export]': expected 'merge' or 'append', got 'overwrite'"
    );
}

#[test]
fn test_parse_full_toml() {
    let config = Config::parse(
        r#"
[global]
dry = true
output_log_level = 4

[export]
mode = "append"
include_underscore = false
renames = [{ from = "RUNPOD_S3_", to = "S3_" }, { from = "RUNPOD_HF_", to = "HF_" }]

[packages]
packages = ["git", "curl"]

[python]
venv_dir = "/workspace/venv"
packages = ["torch"]

[artifact]
source = "s3"
s3_key = "models/bundle.tar.gz"
extract_dir = "/workspace"

[s3]
workers = 4
chunk_size_mb = 8
"#,
    )
    .unwrap();

    assert!(config.global.dry);
    assert_eq!(config.global.output_log_level, LogLevel::DEBUG);
    assert_eq!(config.export.mode, ExportMode::Append);
    assert!(!config.export.include_underscore);
    assert_eq!(config.export.renames.len(), 2);
    assert_eq!(config.packages.packages, ["git", "curl"]);
    assert_eq!(config.python.venv_dir, PathBuf::from("/workspace/venv"));
    assert_eq!(config.artifact.source, ArtifactSource::S3);
    assert!(config.artifact.has_source());
    assert_eq!(config.s3.chunk_size_bytes(), 8 * 1024 * 1024);
}

#[test]
fn test_unknown_field_rejected() {
    let result = Config::parse("[export]\nenv_fiel = \"/tmp/x\"");
    assert!(result.is_err(), "typo'd keys should not be silently ignored");
}

#[test]
fn test_invalid_log_level_rejected() {
    assert!(Config::parse("[global]\noutput_log_level = 9").is_err());
}

#[test]
fn test_validate_rejects_zero_workers() {
    let err = Config::parse("[s3]\nworkers = 0").unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @"invalid value for 'workers' in section '[s3]': must be at least 1"
    );
}

#[test]
fn test_validate_rejects_bad_checksum() {
    assert!(Config::parse("[artifact]\nsha256 = \"abc\"").is_err());
    let digest = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
    let config = Config::parse(&format!("[artifact]\nsha256 = \"{digest}\"")).unwrap();
    assert_eq!(config.artifact.sha256, digest);
}

#[test]
fn test_has_source() {
    let mut config = Config::default();
    assert!(!config.artifact.has_source());
    config.artifact.url = "https://example.com/a.tar.gz".to_string();
    assert!(config.artifact.has_source());
    config.artifact.source = ArtifactSource::S3;
    assert!(!config.artifact.has_source());
}

#[test]
fn test_config_loader_env_override() {
    // SAFETY: the prefix is unique to this test
    unsafe {
        std::env::set_var("RPTEST_ENV_EXPORT__MODE", "append");
        std::env::set_var("RPTEST_ENV_PACKAGES__PACKAGES", "git,jq");
    }

    let config = ConfigLoader::new()
        .add_toml_str("[export]\nmode = \"merge\"")
        .with_env_prefix("RPTEST_ENV")
        .build()
        .expect("build should succeed");

    assert_eq!(config.export.mode, ExportMode::Append);
    assert_eq!(config.packages.packages, ["git", "jq"]);

    // SAFETY: same as above
    unsafe {
        std::env::remove_var("RPTEST_ENV_EXPORT__MODE");
        std::env::remove_var("RPTEST_ENV_PACKAGES__PACKAGES");
    }
}

#[test]
fn test_config_loader_set_override() {
    let config = ConfigLoader::new()
        .add_toml_str("[global]\n dry = false")
        .set("global.dry", true)
        .expect("set should succeed")
        .build()
        .expect("build should succeed");

    assert!(config.global.dry);
}

#[test]
fn test_apply_overrides() {
    let config = ConfigLoader::new()
        .apply_overrides(&[
            "export.mode=append",
            "global/output_log_level=5",
            "python.packages=numpy, pandas",
            "artifact.url=https://example.com/a.tar.gz?x=1",
        ])
        .unwrap()
        .build()
        .unwrap();

    assert_eq!(config.export.mode, ExportMode::Append);
    assert_eq!(config.global.output_log_level, LogLevel::TRACE);
    assert_eq!(config.python.packages, ["numpy", "pandas"]);
    assert_eq!(config.artifact.url, "https://example.com/a.tar.gz?x=1");
}

#[test]
fn test_apply_overrides_rejects_malformed() {
    assert!(ConfigLoader::new().apply_overrides(&["dry"]).is_err());
    assert!(ConfigLoader::new().apply_overrides(&["dry=true"]).is_err());
}

#[test]
fn test_loaded_files() {
    let dir = tempfile::tempdir().unwrap();
    let present = dir.path().join("rp-provision.toml");
    std::fs::write(&present, "[global]\ndry = true\n").unwrap();

    let loader = ConfigLoader::new()
        .add_toml_file_optional(dir.path().join("missing.toml"))
        .add_toml_file(&present);
    assert_eq!(loader.loaded_files().len(), 1);
    let lines = loader.format_loaded_files();
    assert!(lines[0].starts_with("1. [file] "));
    assert!(loader.build().unwrap().global.dry);
}

#[test]
fn test_loaded_files_labels() {
    let dir = tempfile::tempdir().unwrap();
    let system = dir.path().join("system.toml");
    std::fs::write(&system, "").unwrap();

    let loader = ConfigLoader::new()
        .add_toml_file_optional(&system)
        .add_toml_str("[global]\ndry = true\n");
    assert_eq!(
        loader.loaded_files(),
        [ConfigSource::Optional(system.clone()), ConfigSource::Inline]
    );
    assert_eq!(
        loader.format_loaded_files(),
        [
            format!("1. [optional] {}", system.display()),
            "2. [string] <inline>".to_string(),
        ]
    );
}

#[test]
fn test_missing_required_file_fails() {
    let result = ConfigLoader::new()
        .add_toml_file("/nonexistent/rp-provision.toml")
        .build();
    assert!(result.is_err());
}

#[test]
fn test_format_options_sorted_and_aligned() {
    let mut config = Config::default();
    config.packages.packages = vec!["git".to_string(), "curl".to_string()];
    let options = config.format_options();

    let keys: Vec<&str> = options
        .iter()
        .map(|line| line.split_whitespace().next().unwrap())
        .collect();
    let mut sorted = keys.clone();
    sorted.sort_unstable();
    assert_eq!(keys, sorted);

    let eq_columns: Vec<usize> = options.iter().filter_map(|l| l.find(" = ")).collect();
    assert!(eq_columns.windows(2).all(|w| w[0] == w[1]));
    assert!(options.iter().any(|l| l.ends_with("= git,curl")));
    assert!(options.iter().any(|l| l.starts_with("export.mode") && l.ends_with("= merge")));
}
