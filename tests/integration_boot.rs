// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! End-to-end tests for the boot command.
//!
//! Every path the boot sequence touches is redirected into a temp dir, and
//! the process environment is replaced by an explicit [`Env`].

use std::path::Path;
use std::sync::Arc;

use rp_provision::cmd::boot::boot;
use rp_provision::config::Config;
use rp_provision::config::types::ExportMode;
use rp_provision::core::env::container::Env;
use rp_provision::error::child_exit_code;
use tokio_util::sync::CancellationToken;

fn sandbox_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.export.env_file = dir.join("rp_environment");
    config.export.shell_rc = "~/.bashrc".to_string();
    config.delegate.script = dir.join("cnode/start.sh");
    config.start.script = dir.join("start.sh");
    config
}

fn boot_env(home: &Path) -> Env {
    let mut env: Env = [
        ("RUNPOD_FOO", "bar"),
        ("PATH", "/usr/bin:/bin"),
        ("UNRELATED", "baz"),
        ("RUNPOD_S3_BUCKET", "mybucket"),
    ]
    .into_iter()
    .collect();
    env.set("HOME", home.display().to_string());
    env
}

fn write_delegate(dir: &Path, body: &str) {
    std::fs::create_dir_all(dir.join("cnode")).unwrap();
    std::fs::write(dir.join("cnode/start.sh"), body).unwrap();
}

// =============================================================================
// Delegation
// =============================================================================

#[tokio::test]
async fn delegate_runs_alone() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("delegated");
    write_delegate(
        dir.path(),
        &format!("printf '%s' \"$RUNPOD_FOO\" > {}\n", marker.display()),
    );
    std::fs::write(dir.path().join("start.sh"), "exit 9\n").unwrap();

    let config = Arc::new(sandbox_config(dir.path()));
    boot(config, boot_env(dir.path()), CancellationToken::new())
        .await
        .unwrap();

    // the delegate saw the untouched environment
    assert_eq!(std::fs::read_to_string(&marker).unwrap(), "bar");
    // nothing of the provisioning sequence ran
    assert!(!dir.path().join("rp_environment").exists());
    assert!(!dir.path().join(".bashrc").exists());
}

#[tokio::test]
async fn delegate_exit_code_is_propagated() {
    let dir = tempfile::tempdir().unwrap();
    write_delegate(dir.path(), "exit 17\n");

    let config = Arc::new(sandbox_config(dir.path()));
    let err = boot(config, boot_env(dir.path()), CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(child_exit_code(&err), Some(17));
}

#[tokio::test]
async fn delegate_dry_run_does_not_execute() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("delegated");
    write_delegate(dir.path(), &format!("touch {}\n", marker.display()));

    let mut config = sandbox_config(dir.path());
    config.global.dry = true;
    boot(Arc::new(config), boot_env(dir.path()), CancellationToken::new())
        .await
        .unwrap();
    assert!(!marker.exists());
}

// =============================================================================
// Provisioning
// =============================================================================

#[tokio::test]
async fn provision_persists_environment_and_starts() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("started");
    std::fs::write(
        dir.path().join("start.sh"),
        format!("printf '%s' \"$S3_BUCKET\" > {}\n", marker.display()),
    )
    .unwrap();

    let config = Arc::new(sandbox_config(dir.path()));
    boot(config, boot_env(dir.path()), CancellationToken::new())
        .await
        .unwrap();

    let persisted = std::fs::read_to_string(dir.path().join("rp_environment")).unwrap();
    insta::assert_snapshot!(persisted, @r#"
    export PATH="/usr/bin:/bin"
    export RUNPOD_FOO="bar"
    export RUNPOD_S3_BUCKET="mybucket"
    export S3_BUCKET="mybucket"
    "#);

    let rc = std::fs::read_to_string(dir.path().join(".bashrc")).unwrap();
    assert_eq!(
        rc.trim_end(),
        format!("source {}", dir.path().join("rp_environment").display())
    );
    assert_eq!(std::fs::read_to_string(&marker).unwrap(), "mybucket");
}

#[tokio::test]
async fn provision_twice_in_merge_mode_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let config = Arc::new(sandbox_config(dir.path()));
    assert_eq!(config.export.mode, ExportMode::Merge);

    for _ in 0..2 {
        boot(
            Arc::clone(&config),
            boot_env(dir.path()),
            CancellationToken::new(),
        )
        .await
        .unwrap();
    }

    let persisted = std::fs::read_to_string(dir.path().join("rp_environment")).unwrap();
    assert_eq!(persisted.lines().count(), 4);
    let rc = std::fs::read_to_string(dir.path().join(".bashrc")).unwrap();
    assert_eq!(rc.lines().count(), 1);
}

#[tokio::test]
async fn provision_start_failure_is_propagated() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("start.sh"), "exit 5\n").unwrap();

    let config = Arc::new(sandbox_config(dir.path()));
    let err = boot(config, boot_env(dir.path()), CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(child_exit_code(&err), Some(5));
    assert!(dir.path().join("rp_environment").exists());
}
