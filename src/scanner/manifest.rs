//! `package.json` dependency reading with an mtime-validated cache.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::Mutex;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageManifest {
    #[serde(default)]
    dependencies: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default)]
    dev_dependencies: Option<BTreeMap<String, serde_json::Value>>,
}

/// Merged `dependencies` + `devDependencies` names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencySet(HashSet<String>);

impl DependencySet {
    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        let manifest: PackageManifest = serde_json::from_str(content)?;
        let names = manifest
            .dependencies
            .into_iter()
            .chain(manifest.dev_dependencies)
            .flat_map(BTreeMap::into_iter)
            .filter(|(_, version)| declares(version))
            .map(|(name, _)| name)
            .collect();
        Ok(Self(names))
    }

    pub fn has(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A dependency entry counts only when its version value is truthy.
fn declares(version: &serde_json::Value) -> bool {
    match version {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(flag) => *flag,
        serde_json::Value::String(range) => !range.is_empty(),
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}

#[derive(Debug)]
struct CachedManifest {
    modified: SystemTime,
    dependencies: Arc<DependencySet>,
}

/// Parsed manifests keyed by path.
///
/// An entry is served only while the file's current modification time equals
/// the one recorded when it was parsed. Files without a readable mtime are
/// parsed every time and never cached.
#[derive(Debug, Default)]
pub struct ManifestCache {
    entries: Mutex<HashMap<PathBuf, CachedManifest>>,
}

impl ManifestCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load dependencies from `path`. `Ok(None)` means the file does not exist.
    pub fn load(&self, path: &Path) -> Result<Option<Arc<DependencySet>>, ManifestError> {
        let metadata = match std::fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.entries.lock().remove(path);
                return Ok(None);
            }
            Err(source) => {
                return Err(ManifestError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let modified = metadata.modified().ok();

        if let Some(modified) = modified {
            if let Some(cached) = self.entries.lock().get(path) {
                if cached.modified == modified {
                    return Ok(Some(Arc::clone(&cached.dependencies)));
                }
            }
        }

        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let dependencies = match DependencySet::parse(&content) {
            Ok(dependencies) => Arc::new(dependencies),
            Err(source) => {
                self.entries.lock().remove(path);
                return Err(ManifestError::Parse {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        if let Some(modified) = modified {
            self.entries.lock().insert(
                path.to_path_buf(),
                CachedManifest {
                    modified,
                    dependencies: Arc::clone(&dependencies),
                },
            );
        }

        Ok(Some(dependencies))
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_parse_merges_dev_dependencies() {
        let deps = DependencySet::parse(
            r#"{"dependencies": {"next": "14"}, "devDependencies": {"electron": "30"}}"#,
        )
        .unwrap();
        assert!(deps.has("next"));
        assert!(deps.has("electron"));
        assert_eq!(deps.len(), 2);
    }

    #[test]
    fn test_parse_skips_blank_versions() {
        let deps = DependencySet::parse(
            r#"{"dependencies": {"next": "", "react": null, "express": false, "koa": 0, "electron": {"version": "30"}}, "devDependencies": {"fastify": "^4"}}"#,
        )
        .unwrap();
        assert!(!deps.has("next"));
        assert!(!deps.has("react"));
        assert!(!deps.has("express"));
        assert!(!deps.has("koa"));
        assert!(deps.has("electron"));
        assert!(deps.has("fastify"));
        assert_eq!(deps.len(), 2);
    }

    #[test]
    fn test_parse_tolerates_missing_sections() {
        let deps = DependencySet::parse(r#"{"name": "x", "dependencies": null}"#).unwrap();
        assert!(deps.is_empty());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(DependencySet::parse("{ not json").is_err());
        assert!(DependencySet::parse(r#"{"dependencies": "react"}"#).is_err());
    }

    #[test]
    fn test_cache_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let cache = ManifestCache::new();
        let loaded = cache.load(&temp_dir.path().join("package.json")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_cache_reuses_until_mtime_changes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("package.json");
        fs::write(&path, r#"{"dependencies": {"react": "18"}}"#).unwrap();

        let cache = ManifestCache::new();
        let first = cache.load(&path).unwrap().unwrap();
        let second = cache.load(&path).unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);

        // Push the mtime forward so the rewrite is observable on coarse clocks
        fs::write(&path, r#"{"dependencies": {"express": "4"}}"#).unwrap();
        let file = fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(10))
            .unwrap();
        drop(file);

        let third = cache.load(&path).unwrap().unwrap();
        assert!(third.has("express"));
        assert!(!third.has("react"));
    }

    #[test]
    fn test_cache_does_not_keep_broken_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("package.json");
        fs::write(&path, "{").unwrap();

        let cache = ManifestCache::new();
        assert!(matches!(cache.load(&path), Err(ManifestError::Parse { .. })));
        assert!(cache.is_empty());
    }
}
