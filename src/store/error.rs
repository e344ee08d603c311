use std::path::PathBuf;

use thiserror::Error;

use crate::types::ProjectId;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Project not found: {0}")]
    NotFound(ProjectId),

    #[error("A project is already registered at {}", .0.display())]
    DuplicatePath(PathBuf),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Store file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Project id space exhausted")]
    IdsExhausted,
}

pub type StoreResult<T> = Result<T, StoreError>;
