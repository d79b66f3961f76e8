//! Shutdown coordination.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Owns the control plane's background tasks and tells them when to stop.
///
/// Tasks subscribe to the broadcast and are registered with [`track`];
/// [`drain`] fires the broadcast and waits for each of them.
///
/// [`track`]: Shutdown::track
/// [`drain`]: Shutdown::drain
pub struct Shutdown {
    tx: broadcast::Sender<()>,
    tasks: Vec<JoinHandle<()>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            tasks: Vec::new(),
        }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Register a task to wait for during [`Shutdown::drain`].
    pub fn track(&mut self, task: JoinHandle<()>) {
        self.tasks.push(task);
    }

    /// Fire the shutdown signal without waiting for anything.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Fire the signal and give each tracked task up to `grace` to finish.
    /// Tasks that overrun are aborted; returns how many were.
    pub async fn drain(mut self, grace: Duration) -> usize {
        self.trigger();

        let mut aborted = 0;
        for mut task in self.tasks.drain(..) {
            if tokio::time::timeout(grace, &mut task).await.is_err() {
                task.abort();
                aborted += 1;
            }
        }
        aborted
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
