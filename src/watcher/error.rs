//! Error types for the workspace watcher.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from watcher setup. Per-event failures are logged, not returned.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Failed to initialize watcher: {reason}")]
    InitFailed { reason: String },

    #[error("Cannot watch path {path}: {reason}")]
    PathWatchFailed { path: PathBuf, reason: String },

    #[error("Watcher worker stopped abnormally: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl From<notify::Error> for WatchError {
    fn from(e: notify::Error) -> Self {
        WatchError::InitFailed {
            reason: e.to_string(),
        }
    }
}
