//! Change notification for caches.

use tokio::sync::watch;

/// Broadcasts the latest cache version to any number of waiters.
///
/// Waiters hold a [`watch::Receiver`] and wait for a version newer than
/// the one they last served. Wakeups coalesce: a waiter that misses an
/// intermediate version still sees the newest one on its next check.
#[derive(Debug)]
pub struct Cond {
    tx: watch::Sender<u64>,
}

impl Cond {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(0);
        Self { tx }
    }

    /// Publish `version` and wake waiters. Versions never move backwards.
    pub fn notify(&self, version: u64) {
        self.tx.send_if_modified(|current| {
            if version > *current {
                *current = version;
                true
            } else {
                false
            }
        });
    }

    /// Subscribe to version changes.
    pub fn register(&self) -> watch::Receiver<u64> {
        self.tx.subscribe()
    }
}

impl Default for Cond {
    fn default() -> Self {
        Self::new()
    }
}
