//! Registry commands: sync and list.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Settings;
use crate::notifications::ChangeBroadcaster;
use crate::scanner::WorkspaceScanner;
use crate::store::{JsonFileStore, ProjectStore};
use crate::sync::{ProjectSync, PrunePolicy};

use super::{print_json, project_table, store_path};

/// Open the registry and wire it to a scanner configured from `settings`.
pub fn open_sync(
    settings: &Settings,
    broadcaster: Option<Arc<ChangeBroadcaster>>,
) -> anyhow::Result<ProjectSync> {
    let store = JsonFileStore::open(store_path(settings))?;
    let mut sync = ProjectSync::new(Arc::new(store))
        .with_scanner(WorkspaceScanner::new(settings.scan.max_concurrency))
        .with_policy(PrunePolicy::from_flag(settings.sync.prune_missing));
    if let Some(broadcaster) = broadcaster {
        sync = sync.with_broadcaster(broadcaster);
    }
    Ok(sync)
}

/// Scan the workspace, merge into the registry, print the registry.
pub async fn run_sync(settings: &Settings, path: Option<PathBuf>, json: bool) -> anyhow::Result<()> {
    let root = settings.resolve_workspace(path);
    let sync = open_sync(settings, None)?;
    let projects = sync.initialize_project_scanning(&root).await?;

    if json {
        return print_json(&projects);
    }
    println!("{}", project_table(&projects));
    println!("{} project(s) registered", projects.len());
    Ok(())
}

/// Print the registry as stored.
pub fn run_list(settings: &Settings, json: bool) -> anyhow::Result<()> {
    let store = JsonFileStore::open(store_path(settings))?;
    let projects = store.get_all()?;

    if json {
        return print_json(&projects);
    }
    if projects.is_empty() {
        println!("No projects registered. Run 'devscan sync' first.");
    } else {
        println!("{}", project_table(&projects));
    }
    Ok(())
}
