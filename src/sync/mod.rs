//! Keeping the project store aligned with the workspace on disk.
//!
//! Full scans go through [`ProjectSync`]; the watcher uses
//! [`register_discovered`] and [`unregister_path`]. Both sides take the same
//! [`WriteGate`] before touching the store. A full sync holds the gate from
//! the start of its scan to the end of its reconcile, and results handed to
//! [`ProjectSync::reconcile`] are checked against the disk under the gate, so
//! a scan cannot recreate a project the watcher has already deleted.

mod error;
mod reconcile;

pub use error::SyncError;
pub use reconcile::{PrunePolicy, ReconcileReport, reconcile};

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, MutexGuard};

use crate::notifications::ChangeBroadcaster;
use crate::scanner::{WorkspaceScanner, resolve_root};
use crate::store::{ProjectStore, StoreResult};
use crate::types::{NewProject, Project, ProjectId, ScanResult};

/// Serializes every store mutation made by this crate.
#[derive(Debug, Clone, Default)]
pub struct WriteGate(Arc<Mutex<()>>);

impl WriteGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self) -> MutexGuard<'_, ()> {
        self.0.lock().await
    }
}

/// Create a row for `result` unless its path is already registered.
///
/// Returns the new id, or `None` when the path was already tracked.
pub fn register_discovered(
    store: &dyn ProjectStore,
    result: &ScanResult,
) -> StoreResult<Option<ProjectId>> {
    if store.get_by_path(&result.path)?.is_some() {
        return Ok(None);
    }
    store
        .create(NewProject::discovered(result, Utc::now()))
        .map(Some)
}

/// Delete the row registered at `path`, if any.
pub fn unregister_path(store: &dyn ProjectStore, path: &Path) -> StoreResult<Option<Project>> {
    match store.get_by_path(path)? {
        Some(project) => {
            store.delete(project.id)?;
            Ok(Some(project))
        }
        None => Ok(None),
    }
}

/// Scan-then-reconcile orchestration over a store.
#[derive(Clone)]
pub struct ProjectSync {
    store: Arc<dyn ProjectStore>,
    scanner: WorkspaceScanner,
    gate: WriteGate,
    policy: PrunePolicy,
    broadcaster: Option<Arc<ChangeBroadcaster>>,
}

impl ProjectSync {
    pub fn new(store: Arc<dyn ProjectStore>) -> Self {
        Self {
            store,
            scanner: WorkspaceScanner::default(),
            gate: WriteGate::new(),
            policy: PrunePolicy::Keep,
            broadcaster: None,
        }
    }

    pub fn with_scanner(mut self, scanner: WorkspaceScanner) -> Self {
        self.scanner = scanner;
        self
    }

    pub fn with_policy(mut self, policy: PrunePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Publish one notification after any reconcile that mutated the store.
    pub fn with_broadcaster(mut self, broadcaster: Arc<ChangeBroadcaster>) -> Self {
        self.broadcaster = Some(broadcaster);
        self
    }

    pub fn store(&self) -> &Arc<dyn ProjectStore> {
        &self.store
    }

    pub fn scanner(&self) -> &WorkspaceScanner {
        &self.scanner
    }

    pub fn gate(&self) -> &WriteGate {
        &self.gate
    }

    pub fn broadcaster(&self) -> Option<&Arc<ChangeBroadcaster>> {
        self.broadcaster.as_ref()
    }

    pub fn policy(&self) -> PrunePolicy {
        self.policy
    }

    /// Discover projects under `root` without touching the store.
    pub async fn scan_workspace(&self, root: &Path) -> Vec<ScanResult> {
        self.scanner.scan(root).await
    }

    /// Merge `results` (scanned from `root`) into the store.
    ///
    /// Results whose directory has disappeared since the scan are skipped.
    pub async fn reconcile(
        &self,
        root: &Path,
        results: Vec<ScanResult>,
    ) -> Result<ReconcileReport, SyncError> {
        let report = {
            let _guard = self.gate.lock().await;
            self.reconcile_locked(root, results).await?
        };
        self.notify_if_changed(&report);
        Ok(report)
    }

    /// Scan `root`, reconcile, and return the store's project list.
    ///
    /// The gate is held for the whole pass, so watcher mutations land either
    /// before the scan starts or after the store is updated.
    pub async fn initialize_project_scanning(&self, root: &Path) -> Result<Vec<Project>, SyncError> {
        crate::log_event!("sync", "scanning workspace", "{}", root.display());

        let (found, report) = {
            let _guard = self.gate.lock().await;
            let results = self.scan_workspace(root).await;
            let found = results.len();
            (found, self.reconcile_locked(root, results).await?)
        };
        self.notify_if_changed(&report);

        crate::log_event!(
            "sync",
            "synced",
            "{found} found, {} added, {} updated, {} pruned",
            report.created,
            report.updated,
            report.pruned
        );

        Ok(self.store.get_all()?)
    }

    /// Caller holds the gate.
    async fn reconcile_locked(
        &self,
        root: &Path,
        results: Vec<ScanResult>,
    ) -> Result<ReconcileReport, SyncError> {
        let root = resolve_root(root).unwrap_or_else(|| root.to_path_buf());
        let store = Arc::clone(&self.store);
        let policy = self.policy;

        let report = tokio::task::spawn_blocking(move || {
            let mut results = results;
            results.retain(|result| {
                let present = result.path.is_dir();
                if !present {
                    crate::debug_event!("sync", "stale result", "{}", result.path.display());
                }
                present
            });
            reconcile(store.as_ref(), &results, &root, policy)
        })
        .await??;

        Ok(report)
    }

    fn notify_if_changed(&self, report: &ReconcileReport) {
        if report.mutations() > 0 {
            if let Some(broadcaster) = &self.broadcaster {
                broadcaster.notify();
            }
        }
    }
}
