use std::path::Path;

use svncache::backend::BackendCall;
use svncache::status::VersionState;

use crate::integration::support::{path, working_copy, ROOT};

#[test]
fn commit_all_refreshes_every_path() {
    let (backend, coordinator) = working_copy(&[
        ("a.txt", VersionState::Modified),
        ("b.txt", VersionState::Added),
    ]);
    coordinator.load_initial();
    let events = coordinator.subscribe();

    assert!(coordinator.commit_all(&[path("a.txt"), path("b.txt")], "batch"));

    for name in ["a.txt", "b.txt"] {
        assert_eq!(
            coordinator.lookup(&path(name)).version_state(),
            VersionState::Normal
        );
    }
    assert_eq!(events.drain().len(), 2);
    assert_eq!(
        backend.mutating_calls(),
        vec![BackendCall::Commit(vec![path("a.txt"), path("b.txt")])]
    );
}

#[test]
fn failed_commit_all_refreshes_nothing() {
    let (backend, coordinator) = working_copy(&[
        ("a.txt", VersionState::Modified),
        ("b.txt", VersionState::Normal),
    ]);
    coordinator.load_initial();
    let events = coordinator.subscribe();
    backend.clear_calls();

    assert!(!coordinator.commit_all(&[path("a.txt"), path("b.txt")], "batch"));

    assert!(events.drain().is_empty());
    assert_eq!(backend.calls().len(), 1);
    assert_eq!(
        coordinator.lookup(&path("a.txt")).version_state(),
        VersionState::Modified
    );
}

#[test]
fn update_of_directory_refreshes_its_children() {
    let (backend, coordinator) = working_copy(&[("a.txt", VersionState::Normal)]);
    coordinator.load_initial();
    backend.set_file(path("b.txt"), VersionState::Normal);

    assert!(coordinator.update_to_revision(Path::new(ROOT), 1));

    assert!(coordinator.cache().contains(&path("b.txt")));
    assert_eq!(coordinator.lookup(&path("a.txt")).revision(), Some(1));
}

#[test]
fn update_to_missing_revision_reports_false() {
    let (_backend, coordinator) = working_copy(&[("a.txt", VersionState::Normal)]);
    coordinator.load_initial();

    assert!(!coordinator.update_to_revision(&path("a.txt"), 99));
}

#[test]
fn refresh_all_retires_vanished_unversioned_files() {
    let (backend, coordinator) = working_copy(&[
        ("a.txt", VersionState::Normal),
        ("tmp.log", VersionState::NotVersioned),
    ]);
    coordinator.load_initial();
    backend.forget(&path("tmp.log"));
    backend.set_file(path("a.txt"), VersionState::Modified);

    let report = coordinator.refresh_all();

    assert!(report.converged);
    assert_eq!(report.passes, 2);
    assert!(!coordinator.cache().contains(&path("tmp.log")));
    assert_eq!(
        coordinator.lookup(&path("a.txt")).version_state(),
        VersionState::Modified
    );
    assert!(coordinator.cache().contains(Path::new(ROOT)));
}
