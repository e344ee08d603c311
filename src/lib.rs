//! Workspace project discovery and registry sync.
//!
//! Classifies the immediate subdirectories of a workspace into project types,
//! merges them into a [`ProjectStore`], and keeps the store current by
//! watching the workspace for directories appearing and disappearing.

pub mod cli;
pub mod config;
pub mod logging;
pub mod notifications;
pub mod scanner;
pub mod store;
pub mod sync;
pub mod types;
pub mod watcher;

pub use config::Settings;
pub use notifications::{ChangeBroadcaster, ProjectsChanged};
pub use scanner::{
    Detector, DirectoryScanner, WorkspaceScanner, is_project, scan_directory, scan_workspace,
};
pub use store::{JsonFileStore, MemoryStore, ProjectStore, StoreError, StoreResult};
pub use sync::{ProjectSync, PrunePolicy, ReconcileReport, SyncError, WriteGate};
pub use types::{NewProject, Project, ProjectId, ProjectType, ProjectUpdate, ScanResult};
pub use watcher::{WatchError, WatchHandle, WorkspaceWatcher, watch_workspace};
