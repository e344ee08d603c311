//! JSON file backed store.
//!
//! The whole table is rewritten on every mutation through a temp file in the
//! same directory followed by a rename, so readers never observe a torn file.

use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tempfile::NamedTempFile;

use crate::types::{NewProject, Project, ProjectId, ProjectUpdate};

use super::ProjectStore;
use super::error::{StoreError, StoreResult};
use super::table::{ProjectTable, TableDocument};

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    table: RwLock<ProjectTable>,
}

impl JsonFileStore {
    /// Open the store at `path`, creating an empty one if the file is absent.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let table = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
            let document: TableDocument =
                serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
                    path: path.clone(),
                    source,
                })?;
            ProjectTable::from_document(document)?
        } else {
            ProjectTable::default()
        };

        crate::debug_event!(
            "store",
            "opened",
            "{} ({} projects)",
            path.display(),
            table.len()
        );

        Ok(Self {
            path,
            table: RwLock::new(table),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `mutate` to a copy, persist it, then publish it.
    fn mutate<T>(
        &self,
        mutate: impl FnOnce(&mut ProjectTable) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut guard = self.table.write();
        let mut next = guard.clone();
        let value = mutate(&mut next)?;
        self.persist(&next)?;
        *guard = next;
        Ok(value)
    }

    fn persist(&self, table: &ProjectTable) -> StoreResult<()> {
        let io_err = |source: std::io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent).map_err(io_err)?;

        let json = serde_json::to_vec_pretty(&table.to_document())?;
        let mut file = NamedTempFile::new_in(&parent).map_err(io_err)?;
        file.write_all(&json).map_err(io_err)?;
        file.as_file().sync_all().map_err(io_err)?;
        file.persist(&self.path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}

impl ProjectStore for JsonFileStore {
    fn get_all(&self) -> StoreResult<Vec<Project>> {
        Ok(self.table.read().get_all())
    }

    fn get_by_path(&self, path: &Path) -> StoreResult<Option<Project>> {
        Ok(self.table.read().get_by_path(path))
    }

    fn create(&self, project: NewProject) -> StoreResult<ProjectId> {
        self.mutate(|table| table.create(project))
    }

    fn update(&self, id: ProjectId, update: ProjectUpdate) -> StoreResult<()> {
        self.mutate(|table| table.update(id, update))
    }

    fn delete(&self, id: ProjectId) -> StoreResult<()> {
        self.mutate(|table| table.delete(id))
    }
}
