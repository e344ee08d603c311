//! Row storage shared by the store implementations.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::{NewProject, Project, ProjectId, ProjectUpdate};

use super::error::{StoreError, StoreResult};

/// On-disk shape of a project table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TableDocument {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub next_id: u32,
    #[serde(default)]
    pub projects: Vec<Project>,
}

fn default_version() -> u32 {
    1
}

/// Id-keyed project rows with a unique path constraint.
#[derive(Debug, Clone, Default)]
pub(crate) struct ProjectTable {
    /// Last id handed out; ids are never reused.
    last_id: u32,
    rows: BTreeMap<ProjectId, Project>,
}

impl ProjectTable {
    /// Ordered by `last_modified` descending, then id.
    pub fn get_all(&self) -> Vec<Project> {
        let mut projects: Vec<Project> = self.rows.values().cloned().collect();
        projects.sort_by(|a, b| {
            b.last_modified
                .cmp(&a.last_modified)
                .then_with(|| a.id.cmp(&b.id))
        });
        projects
    }

    pub fn get_by_path(&self, path: &Path) -> Option<Project> {
        self.rows.values().find(|p| p.path == path).cloned()
    }

    pub fn create(&mut self, project: NewProject) -> StoreResult<ProjectId> {
        if self.rows.values().any(|p| p.path == project.path) {
            return Err(StoreError::DuplicatePath(project.path));
        }

        let next = self.last_id.checked_add(1).ok_or(StoreError::IdsExhausted)?;
        let id = ProjectId::new(next).ok_or(StoreError::IdsExhausted)?;
        self.last_id = next;

        self.rows.insert(
            id,
            Project {
                id,
                name: project.name,
                project_type: project.project_type,
                path: project.path,
                status: project.status,
                port: project.port,
                last_modified: project.last_modified,
                created_at: project.last_modified,
            },
        );
        Ok(id)
    }

    pub fn update(&mut self, id: ProjectId, update: ProjectUpdate) -> StoreResult<()> {
        let project = self.rows.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        update.apply_to(project);
        Ok(())
    }

    pub fn delete(&mut self, id: ProjectId) -> StoreResult<()> {
        self.rows
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn to_document(&self) -> TableDocument {
        TableDocument {
            version: default_version(),
            next_id: self.last_id,
            projects: self.rows.values().cloned().collect(),
        }
    }

    /// Rebuild from a document, keeping the highest id seen as the id floor.
    pub fn from_document(document: TableDocument) -> StoreResult<Self> {
        let mut table = Self {
            last_id: document.next_id,
            rows: BTreeMap::new(),
        };
        for project in document.projects {
            if table.rows.values().any(|p| p.path == project.path) {
                return Err(StoreError::DuplicatePath(project.path));
            }
            table.last_id = table.last_id.max(project.id.value());
            table.rows.insert(project.id, project);
        }
        Ok(table)
    }
}
