use svncache::backend::BackendCall;
use svncache::status::{NodeKind, StatusData, StatusEventKind, VersionState};

use crate::integration::support::{path, working_copy};

#[test]
fn lock_on_locked_file_makes_no_backend_call() {
    let (backend, coordinator) = working_copy(&[]);
    backend.set_node(
        path("a.txt"),
        StatusData::new(VersionState::Normal, NodeKind::File)
            .with_revision(1)
            .with_lock(true),
    );
    coordinator.load_initial();
    backend.clear_calls();

    assert!(!coordinator.lock(&path("a.txt"), "mine"));
    assert!(backend.calls().is_empty());
}

#[test]
fn add_on_versioned_file_makes_no_backend_call() {
    let (backend, coordinator) = working_copy(&[("a.txt", VersionState::Normal)]);
    coordinator.load_initial();
    backend.clear_calls();

    assert!(!coordinator.add(&path("a.txt")));
    assert!(backend.calls().is_empty());
}

#[test]
fn add_on_uncached_path_is_not_applicable() {
    let (backend, coordinator) = working_copy(&[]);
    coordinator.load_initial();
    backend.clear_calls();

    assert!(!coordinator.add(&path("ghost.txt")));
    assert!(backend.calls().is_empty());
}

#[test]
fn commit_on_normal_file_makes_no_backend_call() {
    let (backend, coordinator) = working_copy(&[("a.txt", VersionState::Normal)]);
    coordinator.load_initial();
    backend.clear_calls();

    assert!(!coordinator.commit(&path("a.txt"), "nothing to see"));
    assert!(backend.calls().is_empty());
}

#[test]
fn commit_on_modified_file_refreshes_and_notifies() {
    let (backend, coordinator) = working_copy(&[("a.txt", VersionState::Modified)]);
    coordinator.load_initial();
    let events = coordinator.subscribe();
    backend.clear_calls();

    assert!(coordinator.commit(&path("a.txt"), "ship it"));

    assert_eq!(
        backend.mutating_calls(),
        vec![BackendCall::Commit(vec![path("a.txt")])]
    );
    let record = coordinator.lookup(&path("a.txt"));
    assert_eq!(record.version_state(), VersionState::Normal);
    assert_eq!(record.revision(), Some(backend.head()));

    let received = events.drain();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].path, path("a.txt"));
    assert_eq!(received[0].kind, StatusEventKind::Updated);
}

#[test]
fn revert_added_file_returns_it_to_unversioned() {
    let (backend, coordinator) = working_copy(&[("a.txt", VersionState::NotVersioned)]);
    coordinator.load_initial();

    assert!(coordinator.add(&path("a.txt")));
    assert!(coordinator.revert(&path("a.txt")));

    assert_eq!(
        coordinator.lookup(&path("a.txt")).version_state(),
        VersionState::NotVersioned
    );
    assert_eq!(backend.mutating_calls().len(), 2);
}
