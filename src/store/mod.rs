//! Project registry storage.
//!
//! The scanner only needs simple keyed CRUD, expressed by [`ProjectStore`].
//! [`MemoryStore`] backs tests and embedded use; [`JsonFileStore`] persists
//! the registry for the CLI.

mod error;
mod json;
mod memory;
mod table;

pub use error::{StoreError, StoreResult};
pub use json::JsonFileStore;
pub use memory::MemoryStore;

use std::path::Path;

use crate::types::{NewProject, Project, ProjectId, ProjectUpdate};

/// Keyed CRUD over project rows. `path` is unique across the store.
pub trait ProjectStore: Send + Sync {
    /// All projects, most recently modified first.
    fn get_all(&self) -> StoreResult<Vec<Project>>;

    fn get_by_path(&self, path: &Path) -> StoreResult<Option<Project>>;

    /// Insert a row; fails with `DuplicatePath` if the path is taken.
    fn create(&self, project: NewProject) -> StoreResult<ProjectId>;

    fn update(&self, id: ProjectId, update: ProjectUpdate) -> StoreResult<()>;

    fn delete(&self, id: ProjectId) -> StoreResult<()>;
}
