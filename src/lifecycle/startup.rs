//! Startup orchestration.
//!
//! # Responsibilities
//! - Feed routing graph updates into the cache observer
//! - Stop feeding once shutdown is signalled

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::dag::Dag;
use crate::xdscache::Observer;

/// Spawn a task that hands every graph received on `updates` to `observer`.
///
/// The task ends when the update channel closes or shutdown fires.
pub fn spawn_graph_updates(
    observer: Arc<dyn Observer>,
    mut updates: mpsc::UnboundedReceiver<Dag>,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                update = updates.recv() => match update {
                    Some(dag) => observer.on_change(&dag),
                    None => {
                        tracing::debug!("Graph update channel closed");
                        break;
                    }
                },
                _ = shutdown.recv() => {
                    tracing::debug!("Graph update task stopping");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::VirtualHost;
    use crate::lifecycle::Shutdown;
    use crate::xdscache::{ResourceCache, RouteCache};
    use std::time::Duration;

    fn dag(host: &str) -> Dag {
        Dag {
            virtual_hosts: vec![VirtualHost::new(host)],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_updates_reach_cache() {
        let cache = Arc::new(RouteCache::new());
        let shutdown = Shutdown::new();
        let (tx, rx) = mpsc::unbounded_channel();
        let mut versions = cache.subscribe();

        let handle = spawn_graph_updates(cache.clone(), rx, shutdown.subscribe());

        tx.send(dag("a.example.com")).unwrap();
        tx.send(dag("b.example.com")).unwrap();

        tokio::time::timeout(Duration::from_secs(1), versions.wait_for(|v| *v == 2))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cache.version(), 2);

        drop(tx);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_stops_on_shutdown() {
        let cache = Arc::new(RouteCache::new());
        let shutdown = Shutdown::new();
        let (_tx, rx) = mpsc::unbounded_channel();

        let handle = spawn_graph_updates(cache, rx, shutdown.subscribe());
        shutdown.trigger();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
