//! Error types for the status cache, backend adapters and runtime wiring.

use std::path::PathBuf;
use thiserror::Error;

/// Failure reported by a version-control backend call.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend could not be reached or started at all
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// A backend command ran but reported failure
    #[error("Command `{command}` failed (exit code {code:?}): {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The path is not inside a working copy
    #[error("Not a working copy: {}", .0.display())]
    NotWorkingCopy(PathBuf),

    /// The path has no known remote locator
    #[error("No repository URI known for {}", .0.display())]
    MissingUri(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BackendError {
    /// Create a command failure from a command line and its captured stderr
    pub fn command_failed(command: impl Into<String>, code: Option<i32>, stderr: &[u8]) -> Self {
        Self::CommandFailed {
            command: command.into(),
            code,
            stderr: String::from_utf8_lossy(stderr).trim().to_string(),
        }
    }
}

/// Top-level error for connection, configuration and watch plumbing.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Watch error: {0}")]
    WatchError(String),

    /// An item operation was skipped or rejected; details are in the log
    #[error("{operation} not applied to {}", .path.display())]
    NotApplied { operation: String, path: PathBuf },

    #[error("{} is not inside a working copy", .0.display())]
    NotWorkingCopy(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<notify::Error> for ApiError {
    fn from(err: notify::Error) -> Self {
        ApiError::WatchError(err.to_string())
    }
}
