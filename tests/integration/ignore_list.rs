use std::path::Path;
use std::sync::Arc;

use svncache::backend::{BackendCall, MemoryBackend, VersionControlBackend};
use svncache::sync::WorkingCopyConnection;

use crate::integration::support::{quiet_config, ROOT};

fn property_writes(backend: &MemoryBackend) -> usize {
    backend
        .calls()
        .iter()
        .filter(|call| matches!(call, BackendCall::SetRemoteProperty { .. }))
        .count()
}

#[test]
fn connecting_twice_writes_the_ignore_list_once() {
    let backend = Arc::new(MemoryBackend::new(ROOT));

    let first = WorkingCopyConnection::open(backend.clone(), Path::new(ROOT), &quiet_config())
        .unwrap()
        .unwrap();
    drop(first);
    let second = WorkingCopyConnection::open(backend.clone(), Path::new(ROOT), &quiet_config())
        .unwrap()
        .unwrap();
    drop(second);

    assert_eq!(property_writes(&backend), 1);
    assert_eq!(
        backend
            .get_remote_property("svn://memory/trunk", "svn:ignore")
            .unwrap()
            .as_deref(),
        Some(".cache\nbuilds")
    );
}

#[test]
fn existing_patterns_are_kept_in_order() {
    let backend = Arc::new(MemoryBackend::new(ROOT));
    backend
        .set_remote_property("svn://memory/trunk", "svn:ignore", "builds\n*.tmp\n", "seed")
        .unwrap();

    WorkingCopyConnection::open(backend.clone(), Path::new(ROOT), &quiet_config())
        .unwrap()
        .unwrap();

    assert_eq!(
        backend
            .get_remote_property("svn://memory/trunk", "svn:ignore")
            .unwrap()
            .as_deref(),
        Some("builds\n*.tmp\n.cache")
    );
}

#[test]
fn configured_patterns_replace_defaults() {
    let backend = Arc::new(MemoryBackend::new(ROOT));
    let mut config = quiet_config();
    config.ignore.patterns = vec!["out".to_string()];

    WorkingCopyConnection::open(backend.clone(), Path::new(ROOT), &config)
        .unwrap()
        .unwrap();

    assert_eq!(
        backend
            .get_remote_property("svn://memory/trunk", "svn:ignore")
            .unwrap()
            .as_deref(),
        Some("out")
    );
}

#[test]
fn failed_ignore_write_still_connects() {
    let backend = Arc::new(MemoryBackend::new(ROOT));
    backend.fail_operation("propset");

    let connection = WorkingCopyConnection::open(backend.clone(), Path::new(ROOT), &quiet_config())
        .unwrap()
        .unwrap();

    assert!(connection.load_report().is_complete());
    assert!(!backend
        .calls()
        .iter()
        .any(|call| matches!(call, BackendCall::Update(_))));
}
