//! Watch command.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;

use crate::config::Settings;
use crate::notifications::ChangeBroadcaster;
use crate::watcher::watch_workspace;

use super::sync::open_sync;

/// Sync once, then follow the workspace until Ctrl-C.
pub async fn run_watch(settings: &Settings, path: Option<PathBuf>) -> anyhow::Result<()> {
    let root = settings.resolve_workspace(path);
    let broadcaster = Arc::new(ChangeBroadcaster::new(settings.watch.notify_capacity));
    let sync = open_sync(settings, Some(Arc::clone(&broadcaster)))?;

    let projects = sync.initialize_project_scanning(&root).await?;
    println!("{} project(s) registered", projects.len());

    if !settings.watch.enabled {
        println!("Watching is disabled in settings ([watch] enabled = false)");
        return Ok(());
    }

    let Some(handle) = watch_workspace(&root, &sync, &settings.watch)? else {
        println!("{} does not exist, not watching", root.display());
        return Ok(());
    };
    println!("Watching {} (Ctrl-C to stop)", handle.root().display());

    let mut changes = broadcaster.subscribe();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            received = changes.recv() => match received {
                Ok(_) | Err(RecvError::Lagged(_)) => {
                    let projects = sync.store().get_all()?;
                    println!("Registry changed: {} project(s)", projects.len());
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    handle.stop().await?;
    Ok(())
}
