//! Project type detection.
//!
//! Detection runs in two steps:
//! 1. Walk `TYPE_PATTERNS` in order and stop at the first entry with at least
//!    one file present.
//! 2. If the result is generic (`Unknown`/`Node.js`) or plain `Next.js`, read
//!    `package.json` and raise specificity from its dependencies. A broken
//!    manifest is logged and leaves the step-1 result in place.

use std::path::Path;

use crate::types::ProjectType;

use super::manifest::{DependencySet, ManifestCache};
use super::patterns::{
    ELECTRON_DEPENDENCY, MANIFEST_FILE, NEXT_DEPENDENCY, REACT_DEPENDENCY, SERVER_DEPENDENCIES,
    TYPE_PATTERNS,
};
use super::snapshot::DirSnapshot;

/// Outcome of classifying one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub project_type: ProjectType,
    /// Matching files of the winning pattern entry, in table order.
    pub detected_files: Vec<String>,
}

/// Classifies directories. Owns the manifest cache it refines with.
#[derive(Debug, Default)]
pub struct Detector {
    manifests: ManifestCache,
}

impl Detector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture a snapshot of `dir` and classify it.
    ///
    /// An unreadable directory classifies as `Unknown` with no files.
    pub fn detect(&self, dir: &Path) -> Detection {
        match DirSnapshot::capture(dir) {
            Ok(snapshot) => self.detect_snapshot(&snapshot),
            Err(e) => {
                tracing::warn!("[detect] cannot list {}: {e}", dir.display());
                Detection {
                    project_type: ProjectType::Unknown,
                    detected_files: Vec::new(),
                }
            }
        }
    }

    pub fn detect_snapshot(&self, snapshot: &DirSnapshot) -> Detection {
        let detection = match_patterns(snapshot);
        self.refine(snapshot, detection)
    }

    fn refine(&self, snapshot: &DirSnapshot, mut detection: Detection) -> Detection {
        let current = detection.project_type;
        if !(current.is_generic() || current == ProjectType::NextJs) {
            return detection;
        }
        if !snapshot.contains(MANIFEST_FILE) {
            return detection;
        }

        let manifest_path = snapshot.dir().join(MANIFEST_FILE);
        let dependencies = match self.manifests.load(&manifest_path) {
            Ok(Some(dependencies)) => dependencies,
            Ok(None) => return detection,
            Err(e) => {
                tracing::warn!("[detect] {e}");
                return detection;
            }
        };

        if let Some(refined) = refine_from_dependencies(&dependencies) {
            let raises = current.is_generic() || refined == ProjectType::NextJsElectron;
            if raises && refined != current {
                crate::debug_event!(
                    "detect",
                    "refined",
                    "{} {current} -> {refined}",
                    snapshot.dir().display()
                );
                detection.project_type = refined;
            }
        }

        detection
    }
}

fn match_patterns(snapshot: &DirSnapshot) -> Detection {
    for pattern in TYPE_PATTERNS {
        let matches: Vec<String> = pattern
            .files
            .iter()
            .filter(|file| snapshot.contains(file))
            .map(|file| file.to_string())
            .collect();

        if !matches.is_empty() {
            return Detection {
                project_type: pattern.project_type,
                detected_files: matches,
            };
        }
    }

    Detection {
        project_type: ProjectType::Unknown,
        detected_files: Vec::new(),
    }
}

fn refine_from_dependencies(dependencies: &DependencySet) -> Option<ProjectType> {
    if dependencies.has(NEXT_DEPENDENCY) {
        if dependencies.has(ELECTRON_DEPENDENCY) {
            Some(ProjectType::NextJsElectron)
        } else {
            Some(ProjectType::NextJs)
        }
    } else if dependencies.has(REACT_DEPENDENCY) {
        Some(ProjectType::React)
    } else if SERVER_DEPENDENCIES.iter().any(|dep| dependencies.has(dep)) {
        Some(ProjectType::NodeJs)
    } else {
        None
    }
}
