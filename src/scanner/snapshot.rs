//! Single-listing view of a candidate directory.

use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};

use super::patterns::{PROJECT_INDICATORS, candidate_names};

/// Which indicator and pattern names exist under one directory.
///
/// Captured from one `read_dir` pass so that the project predicate and the
/// type detection see the same listing. Nested pattern paths (`src/App.tsx`)
/// are only checked when their first segment is in that listing.
#[derive(Debug, Clone)]
pub struct DirSnapshot {
    dir: PathBuf,
    present: HashSet<&'static str>,
}

impl DirSnapshot {
    /// Capture a snapshot. Fails if the directory itself cannot be listed.
    pub fn capture(dir: &Path) -> io::Result<Self> {
        let mut listing: HashSet<OsString> = HashSet::new();
        for entry in std::fs::read_dir(dir)? {
            match entry {
                Ok(entry) => {
                    listing.insert(entry.file_name());
                }
                Err(e) => {
                    tracing::warn!("[scan] unreadable entry in {}: {e}", dir.display());
                }
            }
        }

        let present = candidate_names()
            .into_iter()
            .filter(|name| match name.split_once('/') {
                None => listing.contains(OsStr::new(name)),
                Some((first, _)) => {
                    listing.contains(OsStr::new(first)) && dir.join(name).exists()
                }
            })
            .collect();

        Ok(Self {
            dir: dir.to_path_buf(),
            present,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn contains(&self, name: &str) -> bool {
        self.present.contains(name)
    }

    /// True iff any indicator file or directory is present.
    pub fn is_project(&self) -> bool {
        PROJECT_INDICATORS.iter().any(|name| self.contains(name))
    }
}
