//! # Connectivity Monitor
//!
//! The "is network reachable" flag, as a watch channel. The embedding
//! application forwards its platform signal (browser online/offline events,
//! OS reachability callbacks) into [`ConnectivityMonitor::set_online`] /
//! [`set_offline`](ConnectivityMonitor::set_offline); the sync engine
//! subscribes and reacts to transitions, and the façade samples the flag to
//! route each operation.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Shared online/offline signal. Cheap to clone; clones share state.
#[derive(Debug, Clone)]
pub struct ConnectivityMonitor {
    tx: Arc<watch::Sender<bool>>,
}

impl ConnectivityMonitor {
    /// Creates a monitor with the given initial state.
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        ConnectivityMonitor { tx: Arc::new(tx) }
    }

    /// Marks the network reachable. No-op if already online.
    pub fn set_online(&self) {
        self.set(true);
    }

    /// Marks the network unreachable. No-op if already offline.
    pub fn set_offline(&self) {
        self.set(false);
    }

    fn set(&self, online: bool) {
        // send_if_modified keeps subscribers from seeing duplicate
        // transitions when the platform signal repeats itself.
        let changed = self.tx.send_if_modified(|current| {
            if *current != online {
                *current = online;
                true
            } else {
                false
            }
        });

        if changed {
            info!(online, "Connectivity changed");
        }
    }

    /// Current flag value.
    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Subscribes to transitions. The receiver yields on every change.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for ConnectivityMonitor {
    /// Starts online - the happy path until the platform says otherwise.
    fn default() -> Self {
        ConnectivityMonitor::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_flag_and_transitions() {
        let monitor = ConnectivityMonitor::new(true);
        assert!(monitor.is_online());

        let mut rx = monitor.subscribe();

        monitor.set_offline();
        assert!(!monitor.is_online());
        rx.changed().await.unwrap();
        assert!(!*rx.borrow_and_update());

        monitor.set_online();
        rx.changed().await.unwrap();
        assert!(*rx.borrow_and_update());
    }

    #[tokio::test]
    async fn test_duplicate_transitions_are_suppressed() {
        let monitor = ConnectivityMonitor::new(true);
        let mut rx = monitor.subscribe();
        rx.borrow_and_update();

        monitor.set_online(); // already online
        assert!(!rx.has_changed().unwrap());
    }
}
