use std::collections::HashSet;
use std::path::Path;

use svncache::status::{StatusEventKind, VersionState};

use crate::integration::support::{path, working_copy, ROOT};

#[test]
fn initial_load_inserts_each_file_once_with_one_notification_each() {
    let (backend, coordinator) = working_copy(&[
        ("a.txt", VersionState::Normal),
        ("b.txt", VersionState::Added),
        ("c.txt", VersionState::NotVersioned),
    ]);
    // Only the three files are reported, not the root directory
    backend.forget(Path::new(ROOT));
    let events = coordinator.subscribe();

    let report = coordinator.load_initial();

    assert!(report.is_complete());
    assert_eq!(report.inserted, 3);
    assert_eq!(coordinator.cache().len(), 3);
    assert_eq!(
        coordinator.lookup(&path("a.txt")).version_state(),
        VersionState::Normal
    );
    assert_eq!(
        coordinator.lookup(&path("b.txt")).version_state(),
        VersionState::Added
    );
    assert_eq!(
        coordinator.lookup(&path("c.txt")).version_state(),
        VersionState::NotVersioned
    );

    let received = events.drain();
    assert_eq!(received.len(), 3);
    assert!(received.iter().all(|e| e.kind == StatusEventKind::Updated));
    let paths: HashSet<_> = received.into_iter().map(|e| e.path).collect();
    assert_eq!(
        paths,
        HashSet::from([path("a.txt"), path("b.txt"), path("c.txt")])
    );
}

#[test]
fn initial_load_includes_the_root_directory() {
    let (_backend, coordinator) = working_copy(&[("a.txt", VersionState::Normal)]);
    coordinator.load_initial();

    let root = coordinator.lookup(Path::new(ROOT));
    assert!(root.is_versioned());
    assert_eq!(coordinator.cache().len(), 2);
}

#[test]
fn reloading_unchanged_working_copy_publishes_nothing() {
    let (_backend, coordinator) = working_copy(&[
        ("a.txt", VersionState::Normal),
        ("b.txt", VersionState::Modified),
    ]);
    coordinator.load_initial();
    let events = coordinator.subscribe();

    let report = coordinator.load_initial();

    assert_eq!(report.inserted, 0);
    assert!(events.drain().is_empty());
}

#[test]
fn failed_initial_load_is_reported_not_raised() {
    let (backend, coordinator) = working_copy(&[("a.txt", VersionState::Normal)]);
    backend.fail_operation("status");

    let report = coordinator.load_initial();

    assert!(!report.is_complete());
    assert!(report.error.is_some());
    assert!(coordinator.cache().is_empty());
    assert_eq!(
        coordinator.lookup(&path("a.txt")).version_state(),
        VersionState::NotExisting
    );
}
