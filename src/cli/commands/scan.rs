//! Read-only commands: scan and check.

use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::scanner::{WorkspaceScanner, scan_directory};

use super::{print_json, scan_table};

/// Classify every candidate directory of the workspace and print the results.
pub async fn run_scan(settings: &Settings, path: Option<PathBuf>, json: bool) -> anyhow::Result<()> {
    let root = settings.resolve_workspace(path);
    let results = WorkspaceScanner::new(settings.scan.max_concurrency)
        .scan(&root)
        .await;

    if json {
        return print_json(&results);
    }

    if results.is_empty() {
        println!("No projects found in {}", root.display());
    } else {
        println!("{}", scan_table(&results));
        println!("{} project(s) in {}", results.len(), root.display());
    }
    Ok(())
}

/// Classify a single directory.
pub fn run_check(dir: &Path, json: bool) -> anyhow::Result<()> {
    let result = scan_directory(dir);

    if json {
        return print_json(&result);
    }

    match result {
        Some(result) => {
            println!("{}: {}", result.name, result.project_type);
            if !result.detected_files.is_empty() {
                println!("  detected: {}", result.detected_files.join(", "));
            }
        }
        None => println!("{} is not a project", dir.display()),
    }
    Ok(())
}
