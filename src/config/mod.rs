//! Configuration: typed settings plus layered loading (global file, workspace file, environment).

mod facade;
pub mod merge;
pub mod paths;
pub mod sources;

pub use facade::ConfigLoader;

use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SvnCacheConfig {
    #[serde(default)]
    pub backend: BackendSettings,

    #[serde(default)]
    pub watch: WatchSettings,

    #[serde(default)]
    pub refresh: RefreshSettings,

    #[serde(default)]
    pub ignore: IgnoreSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// How the version-control client is reached
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    /// `svn` executable, resolved through PATH when relative
    #[serde(default = "default_svn_binary")]
    pub svn_binary: PathBuf,

    /// Name of the per-directory administrative area the watch feed must not react to
    #[serde(default = "default_admin_dir")]
    pub admin_dir: String,
}

fn default_svn_binary() -> PathBuf {
    PathBuf::from("svn")
}

fn default_admin_dir() -> String {
    ".svn".to_string()
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            svn_binary: default_svn_binary(),
            admin_dir: default_admin_dir(),
        }
    }
}

/// Watch feed settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchSettings {
    /// Start a filesystem watcher when a working copy connects
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Batch window in milliseconds
    #[serde(default = "default_batch_window_ms")]
    pub batch_window_ms: u64,

    /// Maximum distinct events per batch
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
}

fn default_true() -> bool {
    true
}

fn default_batch_window_ms() -> u64 {
    50
}

fn default_max_batch_size() -> usize {
    100
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            batch_window_ms: default_batch_window_ms(),
            max_batch_size: default_max_batch_size(),
        }
    }
}

/// Bulk refresh settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefreshSettings {
    /// Upper bound on restarted passes; unset means refresh until membership settles
    #[serde(default)]
    pub max_passes: Option<usize>,
}

/// Ignore list written to the working-copy root at connect time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IgnoreSettings {
    #[serde(default = "default_ignore_patterns")]
    pub patterns: Vec<String>,

    #[serde(default = "default_ignore_property")]
    pub property: String,

    #[serde(default = "default_ignore_message")]
    pub log_message: String,
}

fn default_ignore_patterns() -> Vec<String> {
    vec![".cache".to_string(), "builds".to_string()]
}

fn default_ignore_property() -> String {
    "svn:ignore".to_string()
}

fn default_ignore_message() -> String {
    "SVN Ignore".to_string()
}

impl Default for IgnoreSettings {
    fn default() -> Self {
        Self {
            patterns: default_ignore_patterns(),
            property: default_ignore_property(),
            log_message: default_ignore_message(),
        }
    }
}
