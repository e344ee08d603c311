use thiserror::Error;

use crate::store::StoreError;

/// Failure of a scan-then-reconcile run. Store errors are passed through
/// untouched; retrying is the caller's call.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Reconcile task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
