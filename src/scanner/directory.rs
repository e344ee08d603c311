//! Single-directory scanning.

use std::path::Path;

use crate::types::ScanResult;

use super::detector::Detector;
use super::snapshot::DirSnapshot;

/// Validates a path, applies the project predicate, and classifies it.
///
/// This is the unit shared by full workspace scans and watcher events.
#[derive(Debug, Default)]
pub struct DirectoryScanner {
    detector: Detector,
}

impl DirectoryScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `path`. `None` if it is missing, not a directory, or not a project.
    pub fn scan(&self, path: &Path) -> Option<ScanResult> {
        if !path.is_dir() {
            crate::debug_event!("scan", "not a directory", "{}", path.display());
            return None;
        }

        let snapshot = match DirSnapshot::capture(path) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("[scan] cannot list {}: {e}", path.display());
                return None;
            }
        };

        if !snapshot.is_project() {
            return None;
        }

        let detection = self.detector.detect_snapshot(&snapshot);
        Some(ScanResult::new(
            path,
            detection.project_type,
            detection.detected_files,
        ))
    }
}

/// True iff any indicator file or directory exists directly under `path`.
pub fn is_project(path: &Path) -> bool {
    DirSnapshot::capture(path)
        .map(|snapshot| snapshot.is_project())
        .unwrap_or(false)
}

/// Scan one directory with a throwaway scanner.
pub fn scan_directory(path: &Path) -> Option<ScanResult> {
    DirectoryScanner::new().scan(path)
}
