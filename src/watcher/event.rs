//! Mapping raw notify events onto directory changes.

use std::path::{Path, PathBuf};

use notify::event::{CreateKind, ModifyKind, RenameMode};
use notify::{Event, EventKind};

/// What a filesystem event means for the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirChange {
    /// A directory appeared (created or renamed into place).
    Created(PathBuf),
    /// Something at this path disappeared. Might have been a file.
    Removed(PathBuf),
    /// Other activity; only used to keep pending creates quiet.
    Touched(PathBuf),
}

impl DirChange {
    pub fn path(&self) -> &Path {
        match self {
            DirChange::Created(path) | DirChange::Removed(path) | DirChange::Touched(path) => path,
        }
    }
}

fn created_if_dir(path: &Path) -> DirChange {
    if path.is_dir() {
        DirChange::Created(path.to_path_buf())
    } else {
        DirChange::Touched(path.to_path_buf())
    }
}

/// Classify one event. Backends differ in how precisely they report kinds, so
/// ambiguous kinds are resolved by looking at the path.
pub fn classify_event(event: &Event) -> Vec<DirChange> {
    let paths = event.paths.iter();
    match event.kind {
        EventKind::Create(CreateKind::Folder) => {
            paths.map(|p| DirChange::Created(p.clone())).collect()
        }
        EventKind::Create(CreateKind::File) => {
            paths.map(|p| DirChange::Touched(p.clone())).collect()
        }
        EventKind::Create(_) => paths.map(|p| created_if_dir(p)).collect(),
        EventKind::Remove(_) => paths.map(|p| DirChange::Removed(p.clone())).collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            paths.map(|p| DirChange::Removed(p.clone())).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            paths.map(|p| created_if_dir(p)).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => paths
            .enumerate()
            .map(|(i, p)| {
                if i == 0 {
                    DirChange::Removed(p.clone())
                } else {
                    created_if_dir(p)
                }
            })
            .collect(),
        EventKind::Modify(ModifyKind::Name(_)) => paths
            .map(|p| {
                if p.exists() {
                    created_if_dir(p)
                } else {
                    DirChange::Removed(p.clone())
                }
            })
            .collect(),
        EventKind::Modify(_) => paths.map(|p| DirChange::Touched(p.clone())).collect(),
        _ => Vec::new(),
    }
}
