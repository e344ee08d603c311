//! Quiet-period tracking for newly created directories.
//!
//! A directory is usually created empty and filled a moment later (clone,
//! scaffold, unpack). Classifying it on the create event alone would miss the
//! indicator files, so creates wait until the directory has been quiet.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Debounces directory-created events by path.
#[derive(Debug)]
pub struct Debouncer {
    /// Pending directories: path -> last activity timestamp.
    pending: HashMap<PathBuf, Instant>,
    duration: Duration,
}

impl Debouncer {
    /// Create a new debouncer with the given duration in milliseconds.
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            pending: HashMap::new(),
            duration: Duration::from_millis(debounce_ms),
        }
    }

    /// Record a created directory, resetting its timer if already pending.
    pub fn record(&mut self, path: PathBuf) {
        self.pending.insert(path, Instant::now());
    }

    /// Reset the timer of every pending directory that contains `path`.
    pub fn touch_within(&mut self, path: &Path) {
        let now = Instant::now();
        for (dir, last_activity) in self.pending.iter_mut() {
            if path != dir.as_path() && path.starts_with(dir) {
                *last_activity = now;
            }
        }
    }

    /// Drop a pending directory (e.g. it was removed again).
    ///
    /// Also drops pending directories nested inside it.
    pub fn remove(&mut self, path: &Path) {
        self.pending.retain(|dir, _| !dir.starts_with(path));
    }

    /// Take all directories that have been quiet for the debounce duration.
    pub fn take_ready(&mut self) -> Vec<PathBuf> {
        let now = Instant::now();
        let mut ready = Vec::new();

        self.pending.retain(|path, last_activity| {
            if now.duration_since(*last_activity) >= self.duration {
                ready.push(path.clone());
                false
            } else {
                true
            }
        });

        ready.sort();
        ready
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_debouncer_basic() {
        let mut debouncer = Debouncer::new(50);

        let path = PathBuf::from("/ws/app");
        debouncer.record(path.clone());

        assert!(debouncer.take_ready().is_empty());
        assert!(debouncer.has_pending());

        sleep(Duration::from_millis(60));

        let ready = debouncer.take_ready();
        assert_eq!(ready, vec![path]);
        assert!(!debouncer.has_pending());
    }

    #[test]
    fn test_zero_duration_is_ready_immediately() {
        let mut debouncer = Debouncer::new(0);
        debouncer.record(PathBuf::from("/ws/app"));
        assert_eq!(debouncer.take_ready().len(), 1);
    }

    #[test]
    fn test_activity_inside_resets_timer() {
        let mut debouncer = Debouncer::new(50);
        debouncer.record(PathBuf::from("/ws/app"));

        sleep(Duration::from_millis(30));
        debouncer.touch_within(Path::new("/ws/app/package.json"));
        // A sibling with a shared prefix must not count
        debouncer.touch_within(Path::new("/ws/application"));

        sleep(Duration::from_millis(30));
        assert!(debouncer.take_ready().is_empty());

        sleep(Duration::from_millis(30));
        assert_eq!(debouncer.take_ready().len(), 1);
    }

    #[test]
    fn test_remove_drops_nested() {
        let mut debouncer = Debouncer::new(50);
        debouncer.record(PathBuf::from("/ws/app"));
        debouncer.record(PathBuf::from("/ws/app/web"));
        debouncer.record(PathBuf::from("/ws/other"));

        debouncer.remove(Path::new("/ws/app"));
        assert_eq!(debouncer.pending_count(), 1);
    }
}
