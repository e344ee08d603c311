//! Command implementations for the CLI.
//!
//! Each command is implemented in its own module.

pub mod init;
pub mod scan;
pub mod sync;
pub mod watch;

use std::path::PathBuf;

use comfy_table::Table;

use crate::config::Settings;
use crate::types::{Project, ScanResult};

/// Where the registry file lives. Relative paths are taken from the directory
/// that holds `.devscan`, or the current directory if there is none.
pub fn store_path(settings: &Settings) -> PathBuf {
    if settings.store_path.is_absolute() {
        return settings.store_path.clone();
    }
    let base = Settings::workspace_root().unwrap_or_else(|| PathBuf::from("."));
    base.join(&settings.store_path)
}

pub(crate) fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn scan_table(results: &[ScanResult]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Name", "Type", "Path", "Detected"]);
    for result in results {
        table.add_row(vec![
            result.name.clone(),
            result.project_type.to_string(),
            result.path.display().to_string(),
            result.detected_files.join(", "),
        ]);
    }
    table
}

pub(crate) fn project_table(projects: &[Project]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Type", "Status", "Port", "Path", "Modified"]);
    for project in projects {
        table.add_row(vec![
            project.id.to_string(),
            project.name.clone(),
            project.project_type.to_string(),
            project.status.clone(),
            project.port.map(|p| p.to_string()).unwrap_or_else(|| "-".into()),
            project.path.display().to_string(),
            project.last_modified.format("%Y-%m-%d %H:%M").to_string(),
        ]);
    }
    table
}
