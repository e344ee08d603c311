//! Workspace-wide discovery (depth 1).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::types::ScanResult;

use super::directory::DirectoryScanner;
use super::patterns::is_ignored_name;

/// Canonical form of a workspace root, or `None` (with a warning) if it is missing.
///
/// Scans, reconciles and the watcher all key projects by paths built from this
/// root, so they must agree on its spelling.
pub fn resolve_root(root: &Path) -> Option<PathBuf> {
    match std::fs::canonicalize(root) {
        Ok(resolved) => Some(resolved),
        Err(e) => {
            tracing::warn!("[scan] workspace path does not exist: {} ({e})", root.display());
            None
        }
    }
}

/// Immediate child directories of `root` that are not ignored, sorted by name.
///
/// Failures on individual entries are logged and skipped.
pub fn candidate_dirs(root: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!("[scan] cannot enumerate {}: {e}", root.display());
            return Vec::new();
        }
    };

    let mut candidates = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("[scan] skipping unreadable entry in {}: {e}", root.display());
                continue;
            }
        };

        let is_dir = match entry.file_type() {
            Ok(file_type) => file_type.is_dir(),
            Err(e) => {
                tracing::warn!("[scan] cannot stat {}: {e}", entry.path().display());
                continue;
            }
        };
        if !is_dir || is_ignored_name(&entry.file_name()) {
            continue;
        }

        candidates.push(entry.path());
    }

    candidates.sort();
    candidates
}

/// Scans every candidate directory of a workspace with bounded parallelism.
#[derive(Debug, Clone)]
pub struct WorkspaceScanner {
    directory: Arc<DirectoryScanner>,
    max_concurrency: usize,
}

impl WorkspaceScanner {
    pub fn new(max_concurrency: usize) -> Self {
        Self::with_directory_scanner(Arc::new(DirectoryScanner::new()), max_concurrency)
    }

    pub fn with_directory_scanner(directory: Arc<DirectoryScanner>, max_concurrency: usize) -> Self {
        Self {
            directory,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// The directory scanner shared with the watcher.
    pub fn directory_scanner(&self) -> &Arc<DirectoryScanner> {
        &self.directory
    }

    /// Scan all candidates under `root`. A missing root yields an empty list.
    ///
    /// Results come back in candidate (name) order regardless of completion order.
    pub async fn scan(&self, root: &Path) -> Vec<ScanResult> {
        let Some(root) = resolve_root(root) else {
            return Vec::new();
        };

        crate::log_event!("scan", "scanning workspace", "{}", root.display());

        let candidates = candidate_dirs(&root);
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();

        for (index, dir) in candidates.into_iter().enumerate() {
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                break;
            };
            let scanner = Arc::clone(&self.directory);
            tasks.spawn_blocking(move || {
                let _permit = permit;
                (index, scanner.scan(&dir))
            });
        }

        let mut found = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Some(result))) => {
                    crate::log_event!(
                        "scan",
                        "found project",
                        "{} ({})",
                        result.name,
                        result.project_type
                    );
                    found.push((index, result));
                }
                Ok((_, None)) => {}
                Err(e) => {
                    tracing::error!("[scan] directory scan task failed: {e}");
                }
            }
        }

        found.sort_by_key(|(index, _)| *index);
        let results: Vec<ScanResult> = found.into_iter().map(|(_, result)| result).collect();

        crate::log_event!("scan", "complete", "{} projects", results.len());
        results
    }
}

impl Default for WorkspaceScanner {
    fn default() -> Self {
        Self::new(crate::config::default_max_concurrency())
    }
}
