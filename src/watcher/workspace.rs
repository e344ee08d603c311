//! The long-lived workspace watcher.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

use crate::config::WatchConfig;
use crate::notifications::ChangeBroadcaster;
use crate::scanner::patterns::{has_ignored_segment, is_ignored_name};
use crate::scanner::{DirectoryScanner, candidate_dirs, resolve_root};
use crate::store::ProjectStore;
use crate::sync::{
    ProjectSync, PrunePolicy, WriteGate, reconcile, register_discovered, unregister_path,
};
use crate::types::ScanResult;

use super::debouncer::Debouncer;
use super::error::WatchError;
use super::event::{DirChange, classify_event};

/// How often pending creates are checked against the debounce interval.
const TICK: Duration = Duration::from_millis(50);

/// Watches one workspace root and applies directory changes to the store.
///
/// All events are handled by a single worker, so two mutations never
/// interleave. Mutations also take the [`WriteGate`] shared with full scans.
///
/// Only the root and the non-ignored directories at most `max_depth` levels
/// below it carry a (non-recursive) watch. Watches follow directories as they
/// are created and removed.
pub struct WorkspaceWatcher {
    root: PathBuf,
    store: Arc<dyn ProjectStore>,
    gate: WriteGate,
    broadcaster: Option<Arc<ChangeBroadcaster>>,
    scanner: Arc<DirectoryScanner>,
    policy: PrunePolicy,
    max_depth: usize,
    debouncer: Debouncer,
    event_rx: mpsc::Receiver<notify::Result<Event>>,
    watcher: RecommendedWatcher,
    watched: BTreeSet<PathBuf>,
    /// Set by the notify thread when the event queue was full.
    overflowed: Arc<AtomicBool>,
    rescan_requested: bool,
}

impl WorkspaceWatcher {
    pub fn builder(root: impl Into<PathBuf>, store: Arc<dyn ProjectStore>) -> WorkspaceWatcherBuilder {
        WorkspaceWatcherBuilder::new(root, store)
    }

    /// Canonical root being watched.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directories currently carrying a watch, sorted.
    pub fn watched_dirs(&self) -> Vec<PathBuf> {
        self.watched.iter().cloned().collect()
    }

    /// Run the worker on its own task.
    pub fn spawn(self) -> WatchHandle {
        let cancel = CancellationToken::new();
        let root = self.root.clone();
        let task = tokio::spawn(self.run(cancel.clone()));
        WatchHandle { cancel, task, root }
    }

    /// Process events until `cancel` fires or notify goes away.
    pub async fn run(mut self, cancel: CancellationToken) {
        crate::log_event!(
            "watcher",
            "started",
            "{} ({} directories)",
            self.root.display(),
            self.watched.len()
        );

        let mut tick = interval(TICK);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,

                received = self.event_rx.recv() => {
                    match received {
                        Some(Ok(event)) => self.handle_event(event).await,
                        Some(Err(e)) => tracing::error!("[watcher] file watch error: {e}"),
                        None => {
                            tracing::warn!("[watcher] event source closed");
                            break;
                        }
                    }
                }

                _ = tick.tick() => self.flush().await,
            }
        }

        crate::log_event!("watcher", "stopped", "{}", self.root.display());
    }

    /// Levels below the root, or `None` for the root itself, paths outside it,
    /// and paths crossing an ignored directory.
    fn depth_of(&self, path: &Path) -> Option<usize> {
        let relative = path.strip_prefix(&self.root).ok()?;
        if relative.as_os_str().is_empty() || has_ignored_segment(relative) {
            return None;
        }
        Some(relative.components().count())
    }

    async fn handle_event(&mut self, event: Event) {
        if event.need_rescan() {
            tracing::warn!(
                "[watcher] events were dropped by the backend, rescanning {}",
                self.root.display()
            );
            self.rescan_requested = true;
        }

        for change in classify_event(&event) {
            let Some(depth) = self.depth_of(change.path()) else {
                continue;
            };
            self.debouncer.touch_within(change.path());
            if depth > self.max_depth {
                continue;
            }

            match change {
                DirChange::Created(path) => {
                    crate::debug_event!("watcher", "directory created", "{}", path.display());
                    self.watch_tree(path.clone(), depth);
                    self.debouncer.record(path);
                }
                DirChange::Removed(path) => {
                    self.unwatch_tree(&path);
                    self.debouncer.remove(&path);
                    self.process_removed(path).await;
                }
                DirChange::Touched(_) => {}
            }
        }
    }

    /// Periodic work: recover from lost events, then classify settled creates.
    async fn flush(&mut self) {
        if self.overflowed.swap(false, Ordering::Relaxed) {
            tracing::warn!(
                "[watcher] event queue full, rescanning {}",
                self.root.display()
            );
            self.rescan_requested = true;
        }
        if std::mem::take(&mut self.rescan_requested) {
            self.rescan().await;
        }

        for path in self.debouncer.take_ready() {
            self.process_created(path).await;
        }
    }

    /// Watch `dir` (at `depth`) and the non-ignored directories below it, down
    /// to `max_depth`.
    fn watch_tree(&mut self, dir: PathBuf, depth: usize) {
        let mut pending = vec![(dir, depth)];
        while let Some((dir, depth)) = pending.pop() {
            if depth > self.max_depth || self.watched.contains(&dir) {
                continue;
            }
            if let Err(e) = self.watcher.watch(&dir, RecursiveMode::NonRecursive) {
                tracing::warn!("[watcher] failed to watch {}: {e}", dir.display());
                continue;
            }
            crate::debug_event!("watcher", "watching", "{}", dir.display());

            if depth < self.max_depth {
                pending.extend(subdirectories(&dir).into_iter().map(|child| (child, depth + 1)));
            }
            self.watched.insert(dir);
        }
    }

    /// Drop the watches on `path` and everything below it.
    fn unwatch_tree(&mut self, path: &Path) {
        let gone: Vec<PathBuf> = self
            .watched
            .iter()
            .filter(|dir| dir.starts_with(path) && dir.as_path() != self.root.as_path())
            .cloned()
            .collect();
        for dir in gone {
            // The backend usually drops watches on deleted directories itself
            if let Err(e) = self.watcher.unwatch(&dir) {
                crate::debug_event!("watcher", "unwatch skipped", "{}: {e}", dir.display());
            }
            self.watched.remove(&dir);
        }
    }

    /// Bring the watch set back in line with the disk.
    fn refresh_watches(&mut self) {
        let vanished: Vec<PathBuf> = self
            .watched
            .iter()
            .filter(|dir| !dir.is_dir())
            .cloned()
            .collect();
        for dir in vanished {
            self.unwatch_tree(&dir);
        }
        for dir in subdirectories(&self.root) {
            self.watch_tree(dir, 1);
        }
    }

    /// Full scan of the root after events were lost. Scan and store updates
    /// happen under the gate.
    async fn rescan(&mut self) {
        self.refresh_watches();

        let scanner = Arc::clone(&self.scanner);
        let store = Arc::clone(&self.store);
        let root = self.root.clone();
        let policy = self.policy;

        let outcome = {
            let _guard = self.gate.lock().await;
            tokio::task::spawn_blocking(move || {
                let results: Vec<ScanResult> = candidate_dirs(&root)
                    .iter()
                    .filter_map(|dir| scanner.scan(dir))
                    .collect();
                reconcile(store.as_ref(), &results, &root, policy)
            })
            .await
        };

        match outcome {
            Ok(Ok(report)) => {
                crate::log_event!(
                    "watcher",
                    "rescanned",
                    "{} added, {} updated, {} pruned",
                    report.created,
                    report.updated,
                    report.pruned
                );
                if report.mutations() > 0 {
                    self.notify();
                }
            }
            Ok(Err(e)) => tracing::error!("[watcher] rescan of {} failed: {e}", self.root.display()),
            Err(e) => tracing::error!("[watcher] rescan task failed: {e}"),
        }
    }

    async fn process_created(&self, path: PathBuf) {
        let scanner = Arc::clone(&self.scanner);
        let target = path.clone();
        let result = match tokio::task::spawn_blocking(move || scanner.scan(&target)).await {
            Ok(Some(result)) => result,
            Ok(None) => {
                crate::debug_event!("watcher", "not a project", "{}", path.display());
                return;
            }
            Err(e) => {
                tracing::error!("[watcher] scan of {} failed: {e}", path.display());
                return;
            }
        };

        let registered = {
            let _guard = self.gate.lock().await;
            let store = Arc::clone(&self.store);
            let result = result.clone();
            tokio::task::spawn_blocking(move || register_discovered(store.as_ref(), &result)).await
        };

        match registered {
            Ok(Ok(Some(id))) => {
                crate::log_event!(
                    "watcher",
                    "project added",
                    "{} ({}, id {id})",
                    result.name,
                    result.project_type
                );
                self.notify();
            }
            Ok(Ok(None)) => {
                crate::debug_event!("watcher", "already tracked", "{}", path.display());
            }
            Ok(Err(e)) => tracing::error!("[watcher] failed to add {}: {e}", path.display()),
            Err(e) => tracing::error!("[watcher] add task for {} failed: {e}", path.display()),
        }
    }

    async fn process_removed(&self, path: PathBuf) {
        let removed = {
            let _guard = self.gate.lock().await;
            let store = Arc::clone(&self.store);
            let target = path.clone();
            tokio::task::spawn_blocking(move || unregister_path(store.as_ref(), &target)).await
        };

        match removed {
            Ok(Ok(Some(project))) => {
                crate::log_event!("watcher", "project removed", "{}", project.name);
                self.notify();
            }
            Ok(Ok(None)) => {}
            Ok(Err(e)) => tracing::error!("[watcher] failed to remove {}: {e}", path.display()),
            Err(e) => tracing::error!("[watcher] remove task for {} failed: {e}", path.display()),
        }
    }

    fn notify(&self) {
        if let Some(broadcaster) = &self.broadcaster {
            broadcaster.notify();
        }
    }
}

/// Non-ignored child directories of `dir`. Unreadable entries are skipped.
fn subdirectories(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .flatten()
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
        .filter(|entry| !is_ignored_name(&entry.file_name()))
        .map(|entry| entry.path())
        .collect()
}

/// Handle to a running watcher. Dropping it stops the worker.
#[derive(Debug)]
pub struct WatchHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
    root: PathBuf,
}

impl WatchHandle {
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop the worker and wait for it to finish.
    pub async fn stop(mut self) -> Result<(), WatchError> {
        self.cancel.cancel();
        (&mut self.task).await?;
        Ok(())
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Builder for [`WorkspaceWatcher`].
pub struct WorkspaceWatcherBuilder {
    root: PathBuf,
    store: Arc<dyn ProjectStore>,
    gate: WriteGate,
    broadcaster: Option<Arc<ChangeBroadcaster>>,
    scanner: Option<Arc<DirectoryScanner>>,
    policy: PrunePolicy,
    max_depth: usize,
    debounce_ms: u64,
    queue_capacity: usize,
}

impl WorkspaceWatcherBuilder {
    pub fn new(root: impl Into<PathBuf>, store: Arc<dyn ProjectStore>) -> Self {
        let defaults = WatchConfig::default();
        Self {
            root: root.into(),
            store,
            gate: WriteGate::new(),
            broadcaster: None,
            scanner: None,
            policy: PrunePolicy::default(),
            max_depth: defaults.max_depth,
            debounce_ms: defaults.debounce_ms,
            queue_capacity: defaults.event_queue_capacity,
        }
    }

    /// Share store, gate, broadcaster, scanner and prune policy with a
    /// [`ProjectSync`].
    pub fn from_sync(root: impl Into<PathBuf>, sync: &ProjectSync) -> Self {
        let mut builder = Self::new(root, Arc::clone(sync.store()))
            .gate(sync.gate().clone())
            .scanner(Arc::clone(sync.scanner().directory_scanner()))
            .policy(sync.policy());
        if let Some(broadcaster) = sync.broadcaster() {
            builder = builder.broadcaster(Arc::clone(broadcaster));
        }
        builder
    }

    /// Apply the `[watch]` settings.
    pub fn settings(self, config: &WatchConfig) -> Self {
        self.max_depth(config.max_depth)
            .debounce_ms(config.debounce_ms)
            .queue_capacity(config.event_queue_capacity)
    }

    /// Gate shared with whoever else mutates the store.
    pub fn gate(mut self, gate: WriteGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn broadcaster(mut self, broadcaster: Arc<ChangeBroadcaster>) -> Self {
        self.broadcaster = Some(broadcaster);
        self
    }

    pub fn scanner(mut self, scanner: Arc<DirectoryScanner>) -> Self {
        self.scanner = Some(scanner);
        self
    }

    /// Policy for the recovery rescan after lost events.
    pub fn policy(mut self, policy: PrunePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.debounce_ms = ms;
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Build the watcher and start the notify subscription.
    ///
    /// `Ok(None)` when the root does not exist: watching is disabled, which is
    /// not an error.
    pub fn build(self) -> Result<Option<WorkspaceWatcher>, WatchError> {
        let Some(root) = resolve_root(&self.root) else {
            tracing::warn!(
                "[watcher] not watching missing workspace {}",
                self.root.display()
            );
            return Ok(None);
        };

        let (tx, rx) = mpsc::channel(self.queue_capacity.max(1));
        let overflowed = Arc::new(AtomicBool::new(false));
        let full = Arc::clone(&overflowed);
        // Never block the notify thread: the worker calls back into it to
        // add and remove watches.
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            if let Err(TrySendError::Full(_)) = tx.try_send(res) {
                full.store(true, Ordering::Relaxed);
            }
        })?;

        watcher
            .watch(&root, RecursiveMode::NonRecursive)
            .map_err(|e| WatchError::PathWatchFailed {
                path: root.clone(),
                reason: e.to_string(),
            })?;
        crate::debug_event!("watcher", "watching", "{}", root.display());

        let mut workspace = WorkspaceWatcher {
            watched: BTreeSet::from([root.clone()]),
            root,
            store: self.store,
            gate: self.gate,
            broadcaster: self.broadcaster,
            scanner: self.scanner.unwrap_or_default(),
            policy: self.policy,
            max_depth: self.max_depth,
            debouncer: Debouncer::new(self.debounce_ms),
            event_rx: rx,
            watcher,
            overflowed,
            rescan_requested: false,
        };
        for dir in subdirectories(&workspace.root) {
            workspace.watch_tree(dir, 1);
        }

        Ok(Some(workspace))
    }
}

/// Watch `root` using the same store, gate and broadcaster as `sync`.
///
/// `Ok(None)` when the root does not exist.
pub fn watch_workspace(
    root: &Path,
    sync: &ProjectSync,
    config: &WatchConfig,
) -> Result<Option<WatchHandle>, WatchError> {
    let watcher = WorkspaceWatcherBuilder::from_sync(root, sync)
        .settings(config)
        .build()?;
    Ok(watcher.map(WorkspaceWatcher::spawn))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use notify::EventKind;
    use notify::event::{CreateKind, Flag, RemoveKind};
    use std::fs;
    use tempfile::TempDir;

    fn build(root: &Path, store: Arc<dyn ProjectStore>, max_depth: usize) -> WorkspaceWatcher {
        WorkspaceWatcher::builder(root, store)
            .max_depth(max_depth)
            .build()
            .unwrap()
            .unwrap()
    }

    fn relative(watcher: &WorkspaceWatcher) -> Vec<String> {
        watcher
            .watched_dirs()
            .iter()
            .map(|dir| {
                dir.strip_prefix(watcher.root())
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[tokio::test]
    async fn test_missing_root_disables_watching() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");

        let built = WorkspaceWatcher::builder(&missing, Arc::new(MemoryStore::new()))
            .build()
            .unwrap();
        assert!(built.is_none());
    }

    #[tokio::test]
    async fn test_depth_filtering() {
        let temp_dir = TempDir::new().unwrap();
        let watcher = build(temp_dir.path(), Arc::new(MemoryStore::new()), 2);
        let root = watcher.root().to_path_buf();

        assert_eq!(watcher.depth_of(&root), None);
        assert_eq!(watcher.depth_of(&root.join("app")), Some(1));
        assert_eq!(watcher.depth_of(&root.join("app/web")), Some(2));
        assert_eq!(watcher.depth_of(&root.join("app/node_modules/x")), None);
        assert_eq!(watcher.depth_of(Path::new("/somewhere/else")), None);
    }

    #[tokio::test]
    async fn test_watches_stop_at_max_depth_and_skip_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("app/web/src/components")).unwrap();
        fs::create_dir_all(root.join("app/node_modules/react/lib")).unwrap();
        fs::create_dir_all(root.join("node_modules/left-pad")).unwrap();
        fs::create_dir_all(root.join("svc/dist/assets")).unwrap();
        fs::write(root.join("app/package.json"), "{}").unwrap();

        let watcher = build(root, Arc::new(MemoryStore::new()), 2);
        assert_eq!(relative(&watcher), vec!["", "app", "app/web", "svc"]);

        let shallow = build(root, Arc::new(MemoryStore::new()), 1);
        assert_eq!(relative(&shallow), vec!["", "app", "svc"]);
    }

    #[tokio::test]
    async fn test_watches_follow_created_and_removed_directories() {
        let temp_dir = TempDir::new().unwrap();
        let mut watcher = build(temp_dir.path(), Arc::new(MemoryStore::new()), 2);
        let fresh = watcher.root().join("fresh");
        fs::create_dir_all(fresh.join("inner/deeper")).unwrap();

        watcher
            .handle_event(Event::new(EventKind::Create(CreateKind::Folder)).add_path(fresh.clone()))
            .await;
        assert_eq!(relative(&watcher), vec!["", "fresh", "fresh/inner"]);
        assert!(watcher.debouncer.has_pending());

        fs::remove_dir_all(&fresh).unwrap();
        watcher
            .handle_event(Event::new(EventKind::Remove(RemoveKind::Folder)).add_path(fresh))
            .await;
        assert_eq!(relative(&watcher), vec![""]);
        assert!(!watcher.debouncer.has_pending());
    }

    #[tokio::test]
    async fn test_rescan_flag_registers_existing_projects() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("svc")).unwrap();
        fs::write(temp_dir.path().join("svc/go.mod"), "module svc\n").unwrap();

        let store = Arc::new(MemoryStore::new());
        let mut watcher = build(temp_dir.path(), store.clone(), 2);
        let svc = watcher.root().join("svc");

        watcher
            .handle_event(Event::new(EventKind::Other).set_flag(Flag::Rescan))
            .await;
        assert!(store.is_empty());

        watcher.flush().await;
        let project = store.get_by_path(&svc).unwrap().unwrap();
        assert_eq!(project.name, "svc");
        assert!(!watcher.rescan_requested);
    }

    #[tokio::test]
    async fn test_full_queue_triggers_rescan() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("tool")).unwrap();
        fs::write(temp_dir.path().join("tool/Cargo.toml"), "").unwrap();

        let store = Arc::new(MemoryStore::new());
        let mut watcher = build(temp_dir.path(), store.clone(), 2);

        watcher.flush().await;
        assert!(store.is_empty());

        watcher.overflowed.store(true, Ordering::Relaxed);
        watcher.flush().await;
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_handle_stops() {
        let temp_dir = TempDir::new().unwrap();
        let handle = build(temp_dir.path(), Arc::new(MemoryStore::new()), 2).spawn();
        assert!(handle.is_running());
        handle.stop().await.unwrap();
    }
}
