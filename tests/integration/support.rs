use std::path::{Path, PathBuf};
use std::sync::Arc;

use svncache::backend::MemoryBackend;
use svncache::config::SvnCacheConfig;
use svncache::status::VersionState;
use svncache::sync::SyncCoordinator;

pub const ROOT: &str = "/wc";

pub fn path(relative: &str) -> PathBuf {
    Path::new(ROOT).join(relative)
}

/// Config that never starts a filesystem watcher
pub fn quiet_config() -> SvnCacheConfig {
    let mut config = SvnCacheConfig::default();
    config.watch.enabled = false;
    config
}

pub fn working_copy(files: &[(&str, VersionState)]) -> (Arc<MemoryBackend>, SyncCoordinator) {
    let backend = Arc::new(MemoryBackend::new(ROOT));
    for (relative, state) in files {
        backend.set_file(path(relative), *state);
    }
    let coordinator = SyncCoordinator::new(backend.clone(), ROOT, &quiet_config());
    (backend, coordinator)
}
