// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::builder::{ProcessBuilder, ProcessFlags};
use crate::core::env::container::Env;
use crate::error::child_exit_code;

fn sh(script: &str) -> ProcessBuilder {
    ProcessBuilder::new("/bin/sh").arg("-c").arg(script)
}

#[tokio::test]
async fn test_process_echo() {
    let output = ProcessBuilder::new("echo")
        .arg("hello")
        .capture_output()
        .run()
        .await
        .expect("echo should succeed");

    assert!(output.success());
    insta::assert_snapshot!(output.stdout().trim(), @"hello");
}

#[tokio::test]
async fn test_process_exit_code_allowed() {
    let output = sh("exit 42")
        .flag(ProcessFlags::ALLOW_FAILURE)
        .run()
        .await
        .expect("process should complete");

    assert_eq!(output.exit_code(), 42);
    assert!(!output.success());
}

#[tokio::test]
async fn test_process_exit_code_is_recoverable_from_error() {
    let err = sh("echo boom >&2; exit 7")
        .name("start.sh")
        .capture_output()
        .run()
        .await
        .expect_err("non-zero exit should fail");

    assert_eq!(child_exit_code(&err), Some(7));
    insta::assert_snapshot!(err.to_string(), @"process 'start.sh' exited with code 7");
}

#[tokio::test]
async fn test_process_env_replaces_parent_environment() {
    let mut env = Env::new();
    env.set("S3_BUCKET", "mybucket");

    let output = sh("echo \"$S3_BUCKET:${HOME:-unset}\"")
        .env(env)
        .capture_stdout()
        .run()
        .await
        .expect("process should succeed");

    insta::assert_snapshot!(output.stdout().trim(), @"mybucket:unset");
}

#[tokio::test]
async fn test_process_quiet_discards_output() {
    let output = sh("echo hidden").quiet().run().await.unwrap();
    assert!(output.stdout().is_empty());
}

#[tokio::test]
async fn test_process_cancellation() {
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
    });

    let output = ProcessBuilder::new("sleep")
        .arg("30")
        .flag(ProcessFlags::TERMINATE_ON_INTERRUPT)
        .run_with_cancellation(token)
        .await
        .expect("interrupted process is not an error");

    assert!(output.is_interrupted());
}

#[tokio::test]
async fn test_process_sigterm_before_kill() {
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
    });

    // sh exits on SIGTERM well within the grace period
    let output = sh("sleep 30")
        .run_with_cancellation(token)
        .await
        .unwrap();
    assert!(output.is_interrupted());
}

#[tokio::test]
async fn test_process_already_cancelled_does_not_spawn() {
    let token = CancellationToken::new();
    token.cancel();

    let output = ProcessBuilder::new("nonexistent_program_12345")
        .run_with_cancellation(token)
        .await
        .unwrap();
    assert!(output.is_interrupted());
    assert_eq!(output.exit_code(), -1);
}

#[tokio::test]
async fn test_process_spawn_failure() {
    let err = ProcessBuilder::new("/nonexistent/bin/tool")
        .run()
        .await
        .expect_err("spawn should fail");
    assert!(err.to_string().starts_with("failed to spawn process"));
    assert_eq!(child_exit_code(&err), None);
}

#[test]
fn test_command_line_quotes_spaced_args() {
    let builder = ProcessBuilder::new("apt-get")
        .args(["install", "-y"])
        .arg("two words");
    insta::assert_snapshot!(builder.command_line(), @r#"apt-get install -y "two words""#);
}

#[test]
fn test_resolve_uses_context_path() {
    let env: Env = [("PATH", "/usr/bin:/bin")].into_iter().collect();
    let builder = ProcessBuilder::resolve_in("sh", &env).expect("sh should be on PATH");
    assert!(builder.program().is_absolute());
    assert_eq!(ProcessBuilder::find_in("sh", &env), Some(builder.program().clone()));

    let empty: Env = [("PATH", "/nonexistent")].into_iter().collect();
    assert!(ProcessBuilder::find_in("sh", &empty).is_none());
    // explicit paths bypass PATH
    assert!(ProcessBuilder::find_in("/bin/sh", &empty).is_some());
}

#[test]
fn test_resolve_not_found() {
    let env: Env = [("PATH", "/usr/bin:/bin")].into_iter().collect();
    let err = ProcessBuilder::resolve_in("nonexistent_program_12345", &env).unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @"executable not found: 'nonexistent_program_12345' (not in PATH)"
    );
}
