//! Watcher behavior against a real filesystem.
//!
//! Project directories are assembled in a staging directory next to the
//! workspace and renamed in, so the watcher sees a complete directory appear.

mod common;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use common::{RecordingStore, make_dir, wait_for};
use devscan::config::WatchConfig;
use devscan::notifications::ChangeBroadcaster;
use devscan::store::ProjectStore;
use devscan::sync::ProjectSync;
use devscan::types::ProjectType;
use devscan::watcher::{WatchHandle, watch_workspace};
use tempfile::TempDir;
use tokio::sync::broadcast;

const TIMEOUT: Duration = Duration::from_secs(10);
const SETTLE: Duration = Duration::from_millis(600);

struct Fixture {
    _temp_dir: TempDir,
    root: PathBuf,
    staging: PathBuf,
    store: Arc<RecordingStore>,
    sync: ProjectSync,
    broadcaster: Arc<ChangeBroadcaster>,
}

impl Fixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("ws");
        let staging = temp_dir.path().join("staging");
        fs::create_dir(&root).unwrap();
        fs::create_dir(&staging).unwrap();
        let root = fs::canonicalize(root).unwrap();

        let store = Arc::new(RecordingStore::new());
        let broadcaster = Arc::new(ChangeBroadcaster::new(16));
        let sync = ProjectSync::new(store.clone()).with_broadcaster(Arc::clone(&broadcaster));

        Self {
            _temp_dir: temp_dir,
            root,
            staging,
            store,
            sync,
            broadcaster,
        }
    }

    fn watch(&self) -> WatchHandle {
        let config = WatchConfig {
            debounce_ms: 100,
            ..WatchConfig::default()
        };
        watch_workspace(&self.root, &self.sync, &config)
            .unwrap()
            .unwrap()
    }

    /// Build `name` in staging and move it into the workspace.
    fn move_in(&self, name: &str, files: &[(&str, &str)]) -> PathBuf {
        let staged = make_dir(&self.staging, name, files);
        let target = self.root.join(name);
        fs::rename(staged, &target).unwrap();
        target
    }

    fn tracked(&self, path: &Path) -> bool {
        self.store.get_by_path(path).unwrap().is_some()
    }
}

fn drain(rx: &mut broadcast::Receiver<devscan::ProjectsChanged>) -> usize {
    let mut count = 0;
    while rx.try_recv().is_ok() {
        count += 1;
    }
    count
}

#[tokio::test]
async fn test_new_project_is_added_once() {
    let fixture = Fixture::new();
    let mut rx = fixture.broadcaster.subscribe();
    let handle = fixture.watch();

    let app = fixture.move_in("app", &[("Cargo.toml", "[package]\nname = \"app\"\n")]);

    assert!(wait_for(TIMEOUT, || fixture.tracked(&app)).await);
    tokio::time::sleep(SETTLE).await;

    assert_eq!(fixture.store.creates(), 1);
    assert_eq!(drain(&mut rx), 1);
    let project = fixture.store.get_by_path(&app).unwrap().unwrap();
    assert_eq!(project.name, "app");
    assert_eq!(project.project_type, ProjectType::Rust);
    assert_eq!(project.status, "stopped");

    handle.stop().await.unwrap();
}

#[tokio::test]
async fn test_non_project_directory_is_ignored() {
    let fixture = Fixture::new();
    let mut rx = fixture.broadcaster.subscribe();
    let handle = fixture.watch();

    fixture.move_in("notes", &[("README.md", "# notes\n")]);
    tokio::time::sleep(SETTLE).await;

    assert_eq!(fixture.store.mutations(), 0);
    assert_eq!(drain(&mut rx), 0);

    handle.stop().await.unwrap();
}

#[tokio::test]
async fn test_directory_filled_after_creation_is_classified() {
    let fixture = Fixture::new();
    let handle = fixture.watch();

    let web = fixture.root.join("web");
    fs::create_dir(&web).unwrap();
    fs::write(web.join("next.config.js"), "module.exports = {}\n").unwrap();

    assert!(wait_for(TIMEOUT, || fixture.tracked(&web)).await);
    let project = fixture.store.get_by_path(&web).unwrap().unwrap();
    assert_eq!(project.project_type, ProjectType::NextJs);
    assert_eq!(fixture.store.creates(), 1);

    handle.stop().await.unwrap();
}

#[tokio::test]
async fn test_project_inside_new_directory_is_added() {
    let fixture = Fixture::new();
    let handle = fixture.watch();

    let group = fixture.move_in("group", &[("notes.txt", "")]);
    tokio::time::sleep(SETTLE).await;
    assert_eq!(fixture.store.mutations(), 0);

    let staged = make_dir(&fixture.staging, "web", &[("go.mod", "module web\n")]);
    let web = group.join("web");
    fs::rename(staged, &web).unwrap();

    assert!(wait_for(TIMEOUT, || fixture.tracked(&web)).await);
    let project = fixture.store.get_by_path(&web).unwrap().unwrap();
    assert_eq!(project.project_type, ProjectType::Go);

    // Three levels down is past the default depth
    let staged = make_dir(&fixture.staging, "deep", &[("Cargo.toml", "")]);
    let deep = web.join("deep");
    fs::rename(staged, &deep).unwrap();
    tokio::time::sleep(SETTLE).await;
    assert!(!fixture.tracked(&deep));
    assert_eq!(fixture.store.creates(), 1);

    handle.stop().await.unwrap();
}

#[tokio::test]
async fn test_tracked_removal_deletes_once() {
    let fixture = Fixture::new();
    let app = make_dir(&fixture.root, "app", &[("go.mod", "module app\n")]);
    fixture
        .sync
        .initialize_project_scanning(&fixture.root)
        .await
        .unwrap();
    assert!(fixture.tracked(&app));

    let mut rx = fixture.broadcaster.subscribe();
    let handle = fixture.watch();

    fs::remove_dir_all(&app).unwrap();

    assert!(wait_for(TIMEOUT, || !fixture.tracked(&app)).await);
    tokio::time::sleep(SETTLE).await;

    assert_eq!(fixture.store.deletes(), 1);
    assert_eq!(drain(&mut rx), 1);

    handle.stop().await.unwrap();
}

#[tokio::test]
async fn test_untracked_removal_is_noop() {
    let fixture = Fixture::new();
    let notes = make_dir(&fixture.root, "notes", &[("README.md", "")]);
    let mut rx = fixture.broadcaster.subscribe();
    let handle = fixture.watch();

    fs::remove_dir_all(&notes).unwrap();
    tokio::time::sleep(SETTLE).await;

    assert_eq!(fixture.store.mutations(), 0);
    assert_eq!(drain(&mut rx), 0);

    handle.stop().await.unwrap();
}

#[tokio::test]
async fn test_ignored_directories_are_not_registered() {
    let fixture = Fixture::new();
    let handle = fixture.watch();

    let ignored = fixture.move_in("node_modules", &[("package.json", "{}")]);
    tokio::time::sleep(SETTLE).await;

    assert!(!fixture.tracked(&ignored));
    assert_eq!(fixture.store.mutations(), 0);

    handle.stop().await.unwrap();
}

#[tokio::test]
async fn test_missing_root_disables_watching() {
    let fixture = Fixture::new();
    let missing = fixture.root.join("does-not-exist");

    let handle = watch_workspace(&missing, &fixture.sync, &WatchConfig::default()).unwrap();
    assert!(handle.is_none());
}
