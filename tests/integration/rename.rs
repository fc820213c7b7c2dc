use svncache::status::{StatusEvent, VersionState};
use svncache::sync::RenameOutcome;
use svncache::watch::WatchEvent;

use crate::integration::support::{path, working_copy};

#[test]
fn external_rename_of_unversioned_file_moves_the_entry() {
    let (backend, coordinator) = working_copy(&[("old.txt", VersionState::NotVersioned)]);
    coordinator.load_initial();
    let events = coordinator.subscribe();

    backend.forget(&path("old.txt"));
    backend.set_file(path("new.txt"), VersionState::NotVersioned);
    coordinator.apply_watch_event(&WatchEvent::Renamed {
        from: path("old.txt"),
        to: path("new.txt"),
    });

    assert!(!coordinator.cache().contains(&path("old.txt")));
    assert_eq!(
        coordinator.lookup(&path("new.txt")).version_state(),
        VersionState::NotVersioned
    );
    assert_eq!(
        events.drain(),
        vec![
            StatusEvent::removed(path("old.txt")),
            StatusEvent::updated(path("new.txt")),
        ]
    );
}

#[test]
fn rename_into_new_directory_discovers_its_children() {
    let (backend, coordinator) = working_copy(&[("scratch", VersionState::NotVersioned)]);
    coordinator.load_initial();

    backend.forget(&path("scratch"));
    backend.set_file(path("notes"), VersionState::NotVersioned);
    backend.set_file(path("notes/todo.txt"), VersionState::NotVersioned);

    let outcome = coordinator.rename_reconcile(&path("scratch"), &path("notes"));

    assert_eq!(outcome, RenameOutcome::DroppedOldDiscoveredNew);
    assert!(coordinator.cache().contains(&path("notes")));
    assert!(coordinator.cache().contains(&path("notes/todo.txt")));
}

#[test]
fn versioned_rename_tracks_both_sides() {
    let (backend, coordinator) = working_copy(&[("a.txt", VersionState::Normal)]);
    coordinator.load_initial();

    assert!(coordinator.rename(&path("a.txt"), &path("b.txt")));

    assert_eq!(
        coordinator.lookup(&path("a.txt")).version_state(),
        VersionState::Deleted
    );
    assert_eq!(
        coordinator.lookup(&path("b.txt")).version_state(),
        VersionState::Added
    );
    assert_eq!(backend.mutating_calls().len(), 1);
}

#[test]
fn failed_versioned_rename_leaves_cache_alone() {
    let (backend, coordinator) = working_copy(&[
        ("a.txt", VersionState::Normal),
        ("b.txt", VersionState::Normal),
    ]);
    coordinator.load_initial();
    let events = coordinator.subscribe();

    assert!(!coordinator.rename(&path("a.txt"), &path("b.txt")));

    assert!(events.drain().is_empty());
    assert_eq!(
        coordinator.lookup(&path("a.txt")).version_state(),
        VersionState::Normal
    );
    assert_eq!(backend.mutating_calls().len(), 1);
}

#[test]
fn admin_area_renames_are_ignored() {
    let (backend, coordinator) = working_copy(&[]);
    coordinator.apply_watch_event(&WatchEvent::Renamed {
        from: path(".svn/tmp/x"),
        to: path(".svn/pristine/x"),
    });
    assert!(backend.calls().is_empty());
}
