//! Directory classification and workspace discovery.
//!
//! # Architecture
//!
//! ```text
//! WorkspaceScanner      enumerate root children, bounded spawn_blocking
//!   DirectoryScanner    validate path, one DirSnapshot, project predicate
//!     Detector          ordered TYPE_PATTERNS, then package.json refinement
//!       ManifestCache   parsed dependencies, invalidated by mtime
//! ```

mod detector;
mod directory;
mod manifest;
pub mod patterns;
mod snapshot;
mod workspace;

pub use detector::{Detection, Detector};
pub use directory::{DirectoryScanner, is_project, scan_directory};
pub use manifest::{DependencySet, ManifestCache, ManifestError};
pub use snapshot::DirSnapshot;
pub use workspace::{WorkspaceScanner, candidate_dirs, resolve_root};

use std::path::Path;

use crate::types::ScanResult;

/// Scan a workspace with default concurrency. Does not touch any store.
pub async fn scan_workspace(root: &Path) -> Vec<ScanResult> {
    WorkspaceScanner::default().scan(root).await
}
