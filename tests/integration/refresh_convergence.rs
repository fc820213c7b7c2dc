use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use proptest::prelude::*;
use svncache::status::{
    NodeKind, Reconciled, RefreshOutcome, StatusCache, StatusData, StatusRecord, VersionState,
};

/// Cache mutation performed from inside a reconcile callback
#[derive(Debug, Clone)]
enum Churn {
    Discover(u8),
    Retire(u8),
    Nothing,
}

fn churn() -> impl Strategy<Value = Churn> {
    prop_oneof![
        any::<u8>().prop_map(Churn::Discover),
        any::<u8>().prop_map(Churn::Retire),
        Just(Churn::Nothing),
    ]
}

fn file(index: u8) -> PathBuf {
    PathBuf::from(format!("/wc/file-{:03}.txt", index))
}

fn data(state: VersionState) -> StatusData {
    StatusData::new(state, NodeKind::File)
}

proptest! {
    #[test]
    fn refresh_converges_and_visits_every_survivor(
        initial in prop::collection::btree_set(any::<u8>(), 1..24),
        doomed in prop::collection::hash_set(any::<u8>(), 0..8),
        script in prop::collection::vec(churn(), 0..32),
    ) {
        let cache = StatusCache::new();
        for index in &initial {
            cache.insert(StatusRecord::new(file(*index), data(VersionState::NotVersioned)));
        }
        let doomed: HashSet<PathBuf> = doomed.into_iter().map(file).collect();
        let mut script = script.into_iter();

        let report = cache.refresh_all(|record| {
            match script.next() {
                Some(Churn::Discover(index)) if !cache.contains(&file(index)) => {
                    cache.insert(StatusRecord::new(file(index), data(VersionState::NotVersioned)));
                }
                Some(Churn::Retire(index)) => {
                    cache.remove(&file(index));
                }
                _ => {}
            }
            if doomed.contains(record.path()) {
                Ok(Reconciled::Retired)
            } else {
                Ok(Reconciled::Current(data(VersionState::Modified)))
            }
        });

        prop_assert!(report.converged);
        let snapshot = cache.snapshot();
        for (path, record) in &snapshot {
            prop_assert_eq!(path.as_path(), record.path());
            prop_assert!(!doomed.contains(path));
            prop_assert_eq!(record.version_state(), VersionState::Modified);
        }
        // The final pass saw no membership change, so it visited exactly the survivors
        let visited: HashSet<PathBuf> = report
            .outcomes
            .iter()
            .filter(|(_, outcome)| *outcome != RefreshOutcome::Vanished)
            .map(|(path, _)| path.clone())
            .collect();
        let survivors: HashSet<PathBuf> = snapshot.keys().cloned().collect();
        prop_assert_eq!(visited, survivors);
    }
}

#[test]
fn refresh_with_concurrent_writers_terminates() {
    let cache = Arc::new(StatusCache::new().with_max_passes(Some(64)));
    for index in 0..32u8 {
        cache.insert(StatusRecord::new(file(index), data(VersionState::Normal)));
    }

    let writer = {
        let cache = Arc::clone(&cache);
        thread::spawn(move || {
            for round in 0..500u32 {
                let index = 100 + (round % 50) as u8;
                if round % 2 == 0 {
                    cache.insert(StatusRecord::new(file(index), data(VersionState::Added)));
                } else {
                    cache.remove(&file(index));
                }
            }
        })
    };

    let report = cache.refresh_all(|record| Ok(Reconciled::Current(record.data().clone())));
    writer.join().unwrap();

    assert!(report.passes >= 1);
    for index in 0..32u8 {
        assert_eq!(
            cache.lookup(&file(index)).version_state(),
            VersionState::Normal
        );
    }
}
