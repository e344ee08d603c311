//! Incremental registry updates from filesystem events.
//!
//! # Architecture
//!
//! ```text
//! notify::RecommendedWatcher (non-recursive, root + dirs down to max_depth)
//!         |  bounded mpsc (overflow -> rescan)
//!         v
//! WorkspaceWatcher worker
//!   - classify_event: notify kind -> Created / Removed / Touched
//!   - depth + ignore filter
//!   - watch set follows created / removed dirs
//!   - Debouncer holds creates until the directory is quiet
//!         |
//!    +----+-----------------+
//!    |                      |
//! created: DirectoryScanner  removed: lookup by path
//!    -> register_discovered  -> unregister_path
//!         |  (under WriteGate)
//!         v
//! ChangeBroadcaster::notify
//! ```

mod debouncer;
mod error;
mod event;
mod workspace;

pub use debouncer::Debouncer;
pub use error::WatchError;
pub use event::{DirChange, classify_event};
pub use workspace::{WatchHandle, WorkspaceWatcher, WorkspaceWatcherBuilder, watch_workspace};
