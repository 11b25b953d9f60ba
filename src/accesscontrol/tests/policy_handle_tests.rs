//! Policy file loading and hot reload tests

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use permgate_accesscontrol::{
    evaluator::Evaluator, load_policy_file, AccessControlError, DecodeOptions, GrantedPermissions,
    LoaderConfig, PolicyHandle, ScopeParams,
};
use tempfile::NamedTempFile;

const ORG_POLICY: &str = r#"{"action": "orgs:read", "scopes": ["orgs:1", "orgs:2"]}"#;
const TEAM_POLICY: &str = r#"{"any": [{"action": "teams:read"}, {"action": "teams:admin"}]}"#;

fn policy_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn rewrite(file: &NamedTempFile, contents: &str) {
    std::fs::write(file.path(), contents).unwrap();
}

fn grants(action: &str, scopes: &[&str]) -> GrantedPermissions {
    GrantedPermissions::from([(
        action.to_string(),
        scopes.iter().map(|s| s.to_string()).collect(),
    )])
}

// ============================================================================
// LOADING
// ============================================================================

#[tokio::test]
async fn test_load_policy_file() {
    let file = policy_file(ORG_POLICY);

    let evaluator = load_policy_file(file.path(), &DecodeOptions::default())
        .await
        .unwrap();

    assert_eq!(evaluator, Evaluator::permission("orgs:read", ["orgs:1", "orgs:2"]));
}

#[tokio::test]
async fn test_load_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("policy.json");

    let err = load_policy_file(&missing, &DecodeOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, AccessControlError::Io(_)));
    assert!(!err.is_format_error());
}

#[tokio::test]
async fn test_from_config_publishes_loaded_policy() {
    let file = policy_file(ORG_POLICY);
    let config = LoaderConfig::default().with_policy_path(file.path());

    let handle = PolicyHandle::from_config(&config).await.unwrap();

    assert_eq!(handle.source(), Some(file.path()));
    assert!(handle
        .check(&grants("orgs:read", &["orgs:*"]), &ScopeParams::default())
        .unwrap());
    assert!(!handle
        .check(&grants("orgs:read", &["orgs:3"]), &ScopeParams::default())
        .unwrap());
}

#[tokio::test]
async fn test_config_limits_apply_to_loading() {
    let file = policy_file(r#"{"any": [{"all": [{"action": "users:read"}]}]}"#);

    let shallow = LoaderConfig {
        max_depth: 2,
        ..LoaderConfig::default()
    }
    .with_policy_path(file.path());
    let err = PolicyHandle::from_config(&shallow).await.unwrap_err();
    assert!(matches!(err, AccessControlError::DepthExceeded { max_depth: 2 }));

    rewrite(&file, r#"{"action": "users:read", "scopes": ["users:*:1"]}"#);
    let strict = LoaderConfig {
        strict_scopes: true,
        ..LoaderConfig::default()
    }
    .with_policy_path(file.path());
    let err = PolicyHandle::from_config(&strict).await.unwrap_err();
    assert!(matches!(err, AccessControlError::Format(_)));

    // The same scope is accepted when strict validation is off
    let lenient = LoaderConfig::default().with_policy_path(file.path());
    assert!(PolicyHandle::from_config(&lenient).await.is_ok());
}

// ============================================================================
// RELOAD
// ============================================================================

#[tokio::test]
async fn test_reload_publishes_new_policy() {
    let file = policy_file(ORG_POLICY);
    let config = LoaderConfig::default().with_policy_path(file.path());
    let handle = PolicyHandle::from_config(&config).await.unwrap();
    let before = handle.current();

    rewrite(&file, TEAM_POLICY);
    let previous = handle.reload(&config).await.unwrap();

    assert_eq!(previous, before);
    assert_eq!(
        *handle.current(),
        Evaluator::any([Evaluator::action("teams:read"), Evaluator::action("teams:admin")])
    );
    assert!(handle
        .check(&grants("teams:admin", &[]), &ScopeParams::default())
        .unwrap());
}

#[tokio::test]
async fn test_reload_falls_back_to_source_path() {
    let file = policy_file(ORG_POLICY);
    let handle = PolicyHandle::from_config(&LoaderConfig::default().with_policy_path(file.path()))
        .await
        .unwrap();

    rewrite(&file, TEAM_POLICY);
    handle.reload(&LoaderConfig::default()).await.unwrap();

    assert_eq!(handle.current().actions(), vec!["teams:read", "teams:admin"]);
}

#[tokio::test]
async fn test_failed_reload_keeps_previous_policy() {
    let file = policy_file(ORG_POLICY);
    let config = LoaderConfig::default().with_policy_path(file.path());
    let handle = PolicyHandle::from_config(&config).await.unwrap();
    let before = handle.current();

    rewrite(&file, r#"{"action": "orgs:read", "scopes": "orgs:1"}"#);
    let err = handle.reload(&config).await.unwrap_err();
    assert!(err.is_format_error());
    assert_eq!(handle.current(), before);

    rewrite(&file, "");
    assert!(handle.reload(&config).await.is_err());
    assert_eq!(handle.current(), before);
}

#[tokio::test]
async fn test_reload_without_any_path() {
    let handle = PolicyHandle::new(Evaluator::action("a"));
    let err = handle.reload(&LoaderConfig::default()).await.unwrap_err();

    assert!(matches!(err, AccessControlError::Config(_)));
    assert_eq!(*handle.current(), Evaluator::action("a"));
}

// ============================================================================
// CONCURRENCY
// ============================================================================

#[test]
fn test_concurrent_evaluation_during_publish() {
    let read = Evaluator::action("dashboards:read");
    let write = Evaluator::action("dashboards:write");
    let handle = Arc::new(PolicyHandle::new(read.clone()));
    let done = Arc::new(AtomicBool::new(false));

    let granted = grants("dashboards:read", &[]);

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let handle = Arc::clone(&handle);
            let done = Arc::clone(&done);
            let granted = granted.clone();
            let (read, write) = (read.clone(), write.clone());

            thread::spawn(move || {
                let mut evaluations = 0usize;
                while !done.load(Ordering::Acquire) || evaluations == 0 {
                    let snapshot = handle.current();
                    // Every snapshot is one complete published tree
                    assert!(*snapshot == read || *snapshot == write);
                    assert_eq!(snapshot.evaluate(&granted), *snapshot == read);
                    evaluations += 1;
                }
                evaluations
            })
        })
        .collect();

    for i in 0..200 {
        let next = if i % 2 == 0 { write.clone() } else { read.clone() };
        handle.publish(next);
    }
    done.store(true, Ordering::Release);

    for reader in readers {
        assert!(reader.join().unwrap() > 0);
    }
    assert_eq!(*handle.current(), read);
}
