//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use devscan::store::{MemoryStore, ProjectStore, StoreResult};
use devscan::types::{NewProject, Project, ProjectId, ProjectUpdate};

/// A [`MemoryStore`] that counts mutating calls.
#[derive(Debug, Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    creates: AtomicUsize,
    updates: AtomicUsize,
    deletes: AtomicUsize,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn mutations(&self) -> usize {
        self.creates() + self.updates() + self.deletes()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

impl ProjectStore for RecordingStore {
    fn get_all(&self) -> StoreResult<Vec<Project>> {
        self.inner.get_all()
    }

    fn get_by_path(&self, path: &Path) -> StoreResult<Option<Project>> {
        self.inner.get_by_path(path)
    }

    fn create(&self, project: NewProject) -> StoreResult<ProjectId> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.inner.create(project)
    }

    fn update(&self, id: ProjectId, update: ProjectUpdate) -> StoreResult<()> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update(id, update)
    }

    fn delete(&self, id: ProjectId) -> StoreResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(id)
    }
}

/// Create `parent/name` containing `files` (relative path, content).
pub fn make_dir(parent: &Path, name: &str, files: &[(&str, &str)]) -> PathBuf {
    let dir = parent.join(name);
    fs::create_dir_all(&dir).unwrap();
    for (file, content) in files {
        let path = dir.join(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
    dir
}

pub fn package_json(dependencies: &[&str]) -> String {
    let deps: Vec<String> = dependencies
        .iter()
        .map(|name| format!("\"{name}\": \"1.0.0\""))
        .collect();
    format!("{{\"name\": \"fixture\", \"dependencies\": {{{}}}}}", deps.join(", "))
}

/// Poll `condition` until it holds or `timeout` passes.
pub async fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    condition()
}
