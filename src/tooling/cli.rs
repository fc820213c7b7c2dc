//! CLI Tooling
//!
//! Command-line interface over one working-copy connection. Every command opens the
//! connection (initial load plus ignore list), runs, and prints a result string.

use crate::backend::{SvnCommandBackend, VersionControlBackend};
use crate::config::{ConfigLoader, SvnCacheConfig};
use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::sync::{resolve_root, WorkingCopyConnection};
use crate::tooling::format::{format_history_table, format_status_table, to_json, StatusRow};
use crate::types::Revision;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// svncache CLI - Subversion working-copy status cache
#[derive(Parser)]
#[command(name = "svncache")]
#[command(about = "Observable Subversion working-copy status kept in sync with the filesystem")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Working-copy root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Logging section with command-line overrides applied
    pub fn logging_config(&self, base: &LoggingConfig) -> LoggingConfig {
        let mut config = base.clone();
        if let Some(level) = &self.log_level {
            config.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            config.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            config.file = Some(file.clone());
        }
        config
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// List every cached status entry
    List {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show the cached status of one path
    Status {
        path: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Keep the cache in sync with filesystem changes and print notifications
    Watch {
        /// Batch window in milliseconds
        #[arg(long)]
        batch_window_ms: Option<u64>,
    },
    /// Schedule an unversioned file for addition
    Add { path: PathBuf },
    /// Lock a file in the repository
    Lock {
        path: PathBuf,
        /// Lock comment
        #[arg(long, default_value = "")]
        comment: String,
    },
    /// Release a lock
    Unlock { path: PathBuf },
    /// Revert local modifications
    Revert { path: PathBuf },
    /// Commit one modified file
    Commit {
        path: PathBuf,
        #[arg(short, long)]
        message: String,
    },
    /// Commit several files as one changeset
    CommitAll {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[arg(short, long)]
        message: String,
    },
    /// Update to head, or to a given revision
    Update {
        path: PathBuf,
        #[arg(long)]
        revision: Option<Revision>,
    },
    /// Merge a revision range of the item's own history (start > end undoes changes)
    ReverseMerge {
        path: PathBuf,
        #[arg(long)]
        start: Revision,
        #[arg(long)]
        end: Revision,
    },
    /// Versioned rename
    Rename { from: PathBuf, to: PathBuf },
    /// Show the revision history of a path
    History {
        path: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Write the content of a file at a revision to another path
    Cat {
        path: PathBuf,
        #[arg(long)]
        revision: Revision,
        #[arg(long)]
        output: PathBuf,
    },
}

/// CLI context for command execution
pub struct CliContext {
    connection: WorkingCopyConnection,
    workspace_root: PathBuf,
}

impl CliContext {
    /// Load configuration the way every command sees it
    pub fn load_config(
        workspace_root: &Path,
        config_path: Option<&Path>,
    ) -> Result<SvnCacheConfig, ApiError> {
        let config = match config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(workspace_root)?,
        };
        Ok(config)
    }

    /// Create a new CLI context connected to the working copy at `workspace_root`
    pub fn new(workspace_root: PathBuf, config: SvnCacheConfig) -> Result<Self, ApiError> {
        let backend = Arc::new(SvnCommandBackend::new(config.backend.svn_binary.clone()));
        Self::with_backend(workspace_root, config, backend)
    }

    pub fn with_backend(
        workspace_root: PathBuf,
        mut config: SvnCacheConfig,
        backend: Arc<dyn VersionControlBackend>,
    ) -> Result<Self, ApiError> {
        let workspace_root = resolve_root(&workspace_root);
        // One-shot commands never watch; `watch` opens its own connection
        config.watch.enabled = false;
        let connection = WorkingCopyConnection::open(backend, &workspace_root, &config)?
            .ok_or_else(|| ApiError::NotWorkingCopy(workspace_root.clone()))?;
        Ok(Self {
            connection,
            workspace_root,
        })
    }

    pub fn connection(&self) -> &WorkingCopyConnection {
        &self.connection
    }

    /// Execute a CLI command
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let coordinator = self.connection.coordinator();
        match command {
            Commands::List { format } => {
                let mut rows: Vec<StatusRow> = coordinator
                    .mappings()
                    .values()
                    .map(|record| StatusRow::from_record(record, &self.workspace_root))
                    .collect();
                rows.sort_by(|a, b| a.path.cmp(&b.path));
                render(format, rows.as_slice(), format_status_table)
            }
            Commands::Status { path, format } => {
                let path = self.resolve_path(path);
                let row = StatusRow::from_record(&coordinator.lookup(&path), &self.workspace_root);
                render(format, &row, |row| format_status_table(std::slice::from_ref(row)))
            }
            Commands::Watch { .. } => Err(ApiError::WatchError(
                "watch runs through CliContext::watch".to_string(),
            )),
            Commands::Add { path } => {
                let path = self.resolve_path(path);
                applied("add", &path, coordinator.add(&path))
            }
            Commands::Lock { path, comment } => {
                let path = self.resolve_path(path);
                applied("lock", &path, coordinator.lock(&path, comment))
            }
            Commands::Unlock { path } => {
                let path = self.resolve_path(path);
                applied("unlock", &path, coordinator.release_lock(&path))
            }
            Commands::Revert { path } => {
                let path = self.resolve_path(path);
                applied("revert", &path, coordinator.revert(&path))
            }
            Commands::Commit { path, message } => {
                let path = self.resolve_path(path);
                applied("commit", &path, coordinator.commit(&path, message))
            }
            Commands::CommitAll { paths, message } => {
                let paths: Vec<PathBuf> = paths.iter().map(|p| self.resolve_path(p)).collect();
                if coordinator.commit_all(&paths, message) {
                    Ok(format!("Committed {} paths", paths.len()))
                } else {
                    Err(ApiError::NotApplied {
                        operation: "commit-all".to_string(),
                        path: self.workspace_root.clone(),
                    })
                }
            }
            Commands::Update { path, revision } => {
                let path = self.resolve_path(path);
                let ok = match revision {
                    Some(revision) => coordinator.update_to_revision(&path, *revision),
                    None => coordinator.update(&path),
                };
                applied("update", &path, ok)
            }
            Commands::ReverseMerge { path, start, end } => {
                let path = self.resolve_path(path);
                applied("merge", &path, coordinator.reverse_merge(&path, *start, *end))
            }
            Commands::Rename { from, to } => {
                let from = self.resolve_path(from);
                let to = self.resolve_path(to);
                if coordinator.rename(&from, &to) {
                    Ok(format!("Renamed {} -> {}", from.display(), to.display()))
                } else {
                    Err(ApiError::NotApplied {
                        operation: "rename".to_string(),
                        path: from,
                    })
                }
            }
            Commands::History { path, format } => {
                let path = self.resolve_path(path);
                let entries = coordinator.history(&path)?;
                render(format, entries.as_slice(), format_history_table)
            }
            Commands::Cat {
                path,
                revision,
                output,
            } => {
                let path = self.resolve_path(path);
                coordinator.write_revision(&path, output, *revision)?;
                Ok(format!(
                    "Wrote {}@{} to {}",
                    path.display(),
                    revision,
                    output.display()
                ))
            }
        }
    }

    /// Run the watch loop, printing each notification until the process is stopped
    pub fn watch(
        workspace_root: PathBuf,
        mut config: SvnCacheConfig,
        batch_window_ms: Option<u64>,
    ) -> Result<(), ApiError> {
        if let Some(window) = batch_window_ms {
            config.watch.batch_window_ms = window;
        }
        config.watch.enabled = true;
        let backend = Arc::new(SvnCommandBackend::new(config.backend.svn_binary.clone()));
        let workspace_root = resolve_root(&workspace_root);
        let connection = WorkingCopyConnection::open(backend, &workspace_root, &config)?
            .ok_or_else(|| ApiError::NotWorkingCopy(workspace_root.clone()))?;

        let subscription = connection.coordinator().subscribe();
        let cache = Arc::clone(connection.coordinator().cache());
        // Detached: the subscription only closes when the cache itself is dropped
        std::thread::spawn(move || {
            for event in subscription.iter() {
                let record = cache.lookup(&event.path);
                println!(
                    "{:?}\t{}\t{}",
                    event.kind,
                    record.version_state(),
                    event.path.display()
                );
            }
        });

        info!(root = %workspace_root.display(), "Watching for changes");
        connection.run()
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        };
        resolve_root(&joined)
    }
}

fn applied(operation: &str, path: &Path, ok: bool) -> Result<String, ApiError> {
    if ok {
        Ok(format!("{}: {}", operation, path.display()))
    } else {
        Err(ApiError::NotApplied {
            operation: operation.to_string(),
            path: path.to_path_buf(),
        })
    }
}

fn render<T, F>(format: &str, value: &T, text: F) -> Result<String, ApiError>
where
    T: serde::Serialize + ?Sized,
    F: FnOnce(&T) -> String,
{
    match format {
        "json" => to_json(value),
        "text" => Ok(text(value)),
        other => Err(ApiError::ConfigError(format!(
            "Invalid format: {} (must be 'text' or 'json')",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::status::VersionState;

    fn context() -> (tempfile::TempDir, Arc<MemoryBackend>, CliContext) {
        let temp = tempfile::tempdir().unwrap();
        let root = resolve_root(temp.path());
        let backend = Arc::new(MemoryBackend::new(&root));
        backend.set_file(root.join("a.txt"), VersionState::Modified);
        backend.set_file(root.join("b.txt"), VersionState::NotVersioned);
        let context =
            CliContext::with_backend(root, SvnCacheConfig::default(), backend.clone()).unwrap();
        (temp, backend, context)
    }

    #[test]
    fn test_cli_parses_global_flags() {
        let cli = Cli::try_parse_from([
            "svncache",
            "--workspace",
            "/wc",
            "--log-level",
            "debug",
            "commit",
            "a.txt",
            "-m",
            "fix",
        ])
        .unwrap();
        assert_eq!(cli.workspace, PathBuf::from("/wc"));
        assert_eq!(cli.logging_config(&LoggingConfig::default()).level, "debug");
        assert!(matches!(cli.command, Commands::Commit { .. }));
    }

    #[test]
    fn test_list_json() {
        let (_temp, _backend, context) = context();
        let out = context
            .execute(&Commands::List {
                format: "json".to_string(),
            })
            .unwrap();
        let rows: Vec<serde_json::Value> = serde_json::from_str(&out).unwrap();
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn test_relative_paths_resolve_against_workspace() {
        let (_temp, _backend, context) = context();
        let out = context
            .execute(&Commands::Add {
                path: PathBuf::from("b.txt"),
            })
            .unwrap();
        assert!(out.starts_with("add:"));
    }

    #[test]
    fn test_rejected_operation_is_error() {
        let (_temp, backend, context) = context();
        backend.clear_calls();
        let result = context.execute(&Commands::Unlock {
            path: PathBuf::from("a.txt"),
        });
        assert!(matches!(result, Err(ApiError::NotApplied { .. })));
        assert!(backend.mutating_calls().is_empty());
    }

    #[test]
    fn test_invalid_format_rejected() {
        let (_temp, _backend, context) = context();
        let result = context.execute(&Commands::List {
            format: "yaml".to_string(),
        });
        assert!(matches!(result, Err(ApiError::ConfigError(_))));
    }
}
