use std::path::Path;

use parking_lot::RwLock;

use crate::types::{NewProject, Project, ProjectId, ProjectUpdate};

use super::error::StoreResult;
use super::table::ProjectTable;
use super::ProjectStore;

/// In-process store. Contents are lost when it is dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    table: RwLock<ProjectTable>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ProjectStore for MemoryStore {
    fn get_all(&self) -> StoreResult<Vec<Project>> {
        Ok(self.table.read().get_all())
    }

    fn get_by_path(&self, path: &Path) -> StoreResult<Option<Project>> {
        Ok(self.table.read().get_by_path(path))
    }

    fn create(&self, project: NewProject) -> StoreResult<ProjectId> {
        self.table.write().create(project)
    }

    fn update(&self, id: ProjectId, update: ProjectUpdate) -> StoreResult<()> {
        self.table.write().update(id, update)
    }

    fn delete(&self, id: ProjectId) -> StoreResult<()> {
        self.table.write().delete(id)
    }
}
