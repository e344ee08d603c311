//! Merging scan results into the store.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::store::{ProjectStore, StoreResult};
use crate::types::{NewProject, Project, ProjectId, ProjectUpdate, ScanResult};

/// What a full reconcile may delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrunePolicy {
    /// Only create and update. Entries whose directory vanished stay.
    #[default]
    Keep,
    /// Also delete entries directly under the scanned root whose directory is gone.
    MissingUnderRoot,
}

impl PrunePolicy {
    pub fn from_flag(prune_missing: bool) -> Self {
        if prune_missing {
            PrunePolicy::MissingUnderRoot
        } else {
            PrunePolicy::Keep
        }
    }
}

/// Mutations performed by one reconcile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: usize,
    pub updated: usize,
    pub pruned: usize,
    pub unchanged: usize,
}

impl ReconcileReport {
    pub fn mutations(&self) -> usize {
        self.created + self.updated + self.pruned
    }
}

/// Apply `results` to `store`.
///
/// - unseen path: create with `stopped` status and no port
/// - known path with a different type: update type and `last_modified`
/// - otherwise: nothing
///
/// `root` is only consulted for [`PrunePolicy::MissingUnderRoot`]. The caller
/// must hold the write gate.
pub fn reconcile(
    store: &dyn ProjectStore,
    results: &[ScanResult],
    root: &Path,
    policy: PrunePolicy,
) -> StoreResult<ReconcileReport> {
    let mut existing: HashMap<PathBuf, Project> = store
        .get_all()?
        .into_iter()
        .map(|project| (project.path.clone(), project))
        .collect();
    let mut report = ReconcileReport::default();

    for result in results {
        match existing.get(&result.path) {
            None => {
                let row = NewProject::discovered(result, Utc::now());
                let id = store.create(row.clone())?;
                crate::log_event!(
                    "sync",
                    "added",
                    "{} ({})",
                    result.name,
                    result.project_type
                );
                existing.insert(result.path.clone(), materialize(id, row));
                report.created += 1;
            }
            Some(project) if project.project_type != result.project_type => {
                let id = project.id;
                let now = Utc::now();
                store.update(id, ProjectUpdate::retype(result.project_type, now))?;
                crate::log_event!(
                    "sync",
                    "retyped",
                    "{} {} -> {}",
                    result.name,
                    project.project_type,
                    result.project_type
                );
                if let Some(project) = existing.get_mut(&result.path) {
                    project.project_type = result.project_type;
                    project.last_modified = now;
                }
                report.updated += 1;
            }
            Some(_) => report.unchanged += 1,
        }
    }

    if policy == PrunePolicy::MissingUnderRoot {
        let scanned: HashSet<&Path> = results.iter().map(|r| r.path.as_path()).collect();
        for project in existing.values() {
            let under_root = project.path.parent() == Some(root);
            if under_root && !scanned.contains(project.path.as_path()) && !project.path.is_dir() {
                store.delete(project.id)?;
                crate::log_event!("sync", "pruned", "{}", project.path.display());
                report.pruned += 1;
            }
        }
    }

    Ok(report)
}

fn materialize(id: ProjectId, row: NewProject) -> Project {
    Project {
        id,
        name: row.name,
        project_type: row.project_type,
        path: row.path,
        status: row.status,
        port: row.port,
        last_modified: row.last_modified,
        created_at: row.last_modified,
    }
}
