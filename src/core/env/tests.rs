// rp-provision: container boot-time provisioning
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for the environment module.

use super::{current_env, env_from_os};
use crate::core::env::container::Env;
use crate::step::test_utils::run_with_logs;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::os::unix::ffi::OsStringExt;

#[test]
fn test_env_basic_operations() {
    let mut env = Env::new();
    assert!(env.is_empty());
    env.set("RUNPOD_POD_ID", "abc").set("RUNPOD_POD_ID", "def");

    assert_eq!(env.get("RUNPOD_POD_ID"), Some("def"));
    // Unix semantics: keys are case-sensitive
    assert_eq!(env.get("runpod_pod_id"), None);
    assert!(env.contains("RUNPOD_POD_ID"));
    assert_eq!(env.len(), 1);
}

#[test]
fn test_env_prepend_path() {
    let mut env: Env = [("PATH", "/usr/bin:/bin")].into_iter().collect();
    env.prepend_path("/opt/venv/bin");
    insta::assert_snapshot!(env.get("PATH").unwrap(), @"/opt/venv/bin:/usr/bin:/bin");
}

#[test]
fn test_env_prepend_path_when_unset_or_empty() {
    let mut env = Env::new();
    env.prepend_path("/opt/venv/bin");
    assert_eq!(env.get("PATH"), Some("/opt/venv/bin"));

    env.set("PATH", "");
    env.prepend_path("/opt/venv/bin");
    assert_eq!(env.get("PATH"), Some("/opt/venv/bin"));
}

#[test]
fn test_env_copy_on_write() {
    let mut boot: Env = [("RUNPOD_S3_BUCKET", "mybucket")].into_iter().collect();
    let snapshot = boot.clone();
    boot.set("S3_BUCKET", "mybucket");

    assert_eq!(snapshot.get("S3_BUCKET"), None);
    assert_eq!(boot.get("RUNPOD_S3_BUCKET"), Some("mybucket"));
    assert_ne!(snapshot, boot);
}

#[test]
fn test_env_remove() {
    let mut env: Env = [("PYTHONHOME", "/usr"), ("PATH", "/bin")].into_iter().collect();
    env.remove("PYTHONHOME").remove("MISSING");
    assert_eq!(env.len(), 1);
    assert_eq!(env.get("PATH"), Some("/bin"));
}

#[test]
fn test_current_env() {
    let env = current_env();
    assert!(
        env.get("PATH").is_some(),
        "PATH should exist in current environment"
    );
}

#[test]
fn test_env_iterates_in_key_order() {
    let map = BTreeMap::from([
        ("_".to_string(), "/usr/bin/env".to_string()),
        ("RUNPOD_FOO".to_string(), "bar".to_string()),
        ("PATH".to_string(), "/bin".to_string()),
    ]);

    let env = Env::from_map(map);
    let keys: Vec<_> = env.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, ["PATH", "RUNPOD_FOO", "_"]);
}

#[tokio::test]
async fn test_env_from_os_warns_on_non_utf8() {
    let vars = vec![
        (OsString::from("RUNPOD_POD_ID"), OsString::from("abc")),
        (OsString::from_vec(b"RUNPOD_\xffKEY".to_vec()), OsString::from("x")),
        (OsString::from("RUNPOD_BLOB"), OsString::from_vec(vec![0xff, 0xfe])),
    ];

    let (env, logs) = run_with_logs(|| async move { Ok(env_from_os(vars)) })
        .await
        .unwrap();

    assert_eq!(env.len(), 1);
    assert_eq!(env.get("RUNPOD_POD_ID"), Some("abc"));
    assert!(!env.contains("RUNPOD_BLOB"));
    assert!(logs.contains("key=RUNPOD_BLOB"), "{logs}");
    assert!(logs.contains("key=RUNPOD_\u{fffd}KEY"), "{logs}");
    assert_eq!(logs.matches("not valid UTF-8").count(), 2);
}
