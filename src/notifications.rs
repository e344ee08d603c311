//! Project registry change notifications.
//!
//! A bounded broadcast channel sits between the code that mutates the registry
//! (watcher, reconciles) and whoever wants to refresh on change. Notifications
//! carry no payload: subscribers re-query the store. A slow subscriber lags and
//! loses messages; it never holds up the sender.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// "The project registry changed, re-read it."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectsChanged;

/// Fan-out of [`ProjectsChanged`] to any number of subscribers.
#[derive(Debug, Clone)]
pub struct ChangeBroadcaster {
    sender: broadcast::Sender<ProjectsChanged>,
}

impl ChangeBroadcaster {
    /// Create a new broadcaster with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish one notification.
    pub fn notify(&self) {
        match self.sender.send(ProjectsChanged) {
            Ok(count) => {
                crate::debug_event!("broadcast", "sent", "to {count} subscribers");
            }
            Err(_) => {
                // No receivers, this is fine
                crate::debug_event!("broadcast", "dropped", "no subscribers");
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProjectsChanged> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Run `callback` once per notification on its own task.
    ///
    /// A lagged subscription still fires the callback once, since the
    /// registry did change. The task ends when every sender is dropped.
    pub fn spawn_callback<F>(&self, callback: F) -> JoinHandle<()>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut receiver = self.subscribe();
        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(ProjectsChanged) => callback(),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("[broadcast] subscriber lagged by {n} notifications");
                        callback();
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        crate::debug_event!("broadcast", "channel closed");
                        break;
                    }
                }
            }
        })
    }
}

impl Default for ChangeBroadcaster {
    fn default() -> Self {
        Self::new(crate::config::default_notify_capacity())
    }
}
