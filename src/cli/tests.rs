// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::PathBuf;

use crate::cli::{Cli, Command};
use clap::Parser;

#[test]
fn test_parse_version() {
    let cli = Cli::try_parse_from(["rp-provision", "version"]).unwrap();
    assert!(matches!(cli.command, Some(Command::Version)));
}

#[test]
fn test_parse_boot_without_flags() {
    let cli = Cli::try_parse_from(["rp-provision", "boot"]).unwrap();
    assert!(matches!(cli.command, Some(Command::Boot)));
    assert!(cli.global.configs.is_empty());
    assert!(!cli.global.dry);
    assert!(cli.global.to_config_overrides().is_empty());
}

#[test]
fn test_parse_global_options() {
    let cli = Cli::try_parse_from([
        "rp-provision",
        "-c",
        "/etc/a.toml",
        "--config",
        "b.toml",
        "-l",
        "5",
        "--log-file",
        "/var/log/rp.log",
        "--dry",
        "-s",
        "export.mode=append",
        "export",
    ])
    .unwrap();

    assert!(matches!(cli.command, Some(Command::Export)));
    assert_eq!(
        cli.global.configs,
        [PathBuf::from("/etc/a.toml"), PathBuf::from("b.toml")]
    );
    insta::assert_snapshot!(cli.global.to_config_overrides().join("\n"), @r"
    export.mode=append
    global.output_log_level=5
    global.file_log_level=5
    global.log_file=/var/log/rp.log
    global.dry=true
    ");
}

#[test]
fn test_file_log_level_overrides_log_level() {
    let cli =
        Cli::try_parse_from(["rp-provision", "-l", "2", "--file-log-level", "4", "options"])
            .unwrap();
    assert_eq!(
        cli.global.to_config_overrides(),
        ["global.output_log_level=2", "global.file_log_level=4"]
    );
}

#[test]
fn test_parse_log_level_out_of_range() {
    assert!(Cli::try_parse_from(["rp-provision", "-l", "7", "boot"]).is_err());
}

#[test]
fn test_parse_fetch() {
    let cli = Cli::try_parse_from([
        "rp-provision",
        "fetch",
        "models/weights.bin",
        "/workspace",
        "--workers",
        "4",
        "--chunk-size",
        "8",
    ])
    .unwrap();

    let Some(Command::Fetch(args)) = cli.command else {
        panic!("expected fetch command");
    };
    assert_eq!(args.key, "models/weights.bin");
    assert_eq!(args.dest, PathBuf::from("/workspace"));
    assert_eq!(args.workers, Some(4));
    assert_eq!(args.chunk_size, Some(8));
    assert!(!args.quiet);
}

#[test]
fn test_parse_fetch_rejects_zero_workers() {
    assert!(Cli::try_parse_from(["rp-provision", "fetch", "k", "/tmp", "-w", "0"]).is_err());
    assert!(Cli::try_parse_from(["rp-provision", "fetch", "k"]).is_err());
}
