//! Route configuration cache.
//!
//! # Responsibilities
//! - Hold the current generation of route configurations
//! - Replace the whole generation atomically on every graph change
//! - Answer read-all and read-by-name queries without blocking writers
//! - Wake waiters when a new generation is installed
//!
//! # Design Decisions
//! - The snapshot lives behind an `ArcSwap`; a replace is one pointer swap
//! - Readers clone `Arc`s out of the snapshot and sort outside of it
//! - Unknown names are answered with an empty placeholder, never omitted

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use tokio::sync::watch;

use crate::dag::Dag;
use crate::observability::metrics;
use crate::protocol::{RouteConfiguration, ROUTE_TYPE};
use crate::sorter::compare_route_configurations;
use crate::xdscache::translate::route_configurations;
use crate::xdscache::{Cond, Observer, ResourceCache};

/// One generation of route configurations.
#[derive(Debug, Default)]
struct Snapshot {
    version: u64,
    values: BTreeMap<String, Arc<RouteConfiguration>>,
}

/// Manages the route configurations served over route discovery.
#[derive(Debug, Default)]
pub struct RouteCache {
    snapshot: ArcSwap<Snapshot>,
    cond: Cond,
}

impl RouteCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents of the cache with `configs` and wake waiters.
    /// Returns the version of the installed generation.
    pub fn replace_all(&self, configs: BTreeMap<String, RouteConfiguration>) -> u64 {
        let values: BTreeMap<String, Arc<RouteConfiguration>> = configs
            .into_iter()
            .map(|(name, config)| (name, Arc::new(config)))
            .collect();

        let previous = self.snapshot.rcu(|current| Snapshot {
            version: current.version + 1,
            values: values.clone(),
        });
        let version = previous.version + 1;

        self.cond.notify(version);
        version
    }

    /// Version of the currently installed generation; zero before the
    /// first replace.
    pub fn version(&self) -> u64 {
        self.snapshot.load().version
    }

    /// Like [`ResourceCache::read_all`], paired with the version of the
    /// generation the values were read from.
    pub fn versioned_read_all(&self) -> (u64, Vec<Arc<RouteConfiguration>>) {
        let snapshot = self.snapshot.load();
        let mut values: Vec<_> = snapshot.values.values().cloned().collect();
        values.sort_by(|a, b| compare_route_configurations(a, b));

        metrics::record_query("all");
        (snapshot.version, values)
    }

    /// Like [`ResourceCache::read_by_names`], paired with the version of
    /// the generation the values were read from.
    pub fn versioned_read_by_names<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> (u64, Vec<Arc<RouteConfiguration>>) {
        let snapshot = self.snapshot.load();
        let values = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                // A missing route configuration exists as far as the proxy
                // is concerned; it just carries no virtual hosts yet.
                snapshot
                    .values
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| Arc::new(RouteConfiguration::placeholder(name)))
            })
            .collect();

        metrics::record_query("by_name");
        (snapshot.version, values)
    }

    /// Number of virtual hosts across every route configuration.
    pub fn virtual_host_count(&self) -> usize {
        self.snapshot
            .load()
            .values
            .values()
            .map(|c| c.virtual_hosts.len())
            .sum()
    }
}

impl ResourceCache for RouteCache {
    type Resource = RouteConfiguration;

    fn read_all(&self) -> Vec<Arc<RouteConfiguration>> {
        self.versioned_read_all().1
    }

    fn read_by_names<S: AsRef<str>>(&self, names: &[S]) -> Vec<Arc<RouteConfiguration>> {
        self.versioned_read_by_names(names).1
    }

    fn type_identifier(&self) -> &'static str {
        ROUTE_TYPE
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.cond.register()
    }
}

impl Observer for RouteCache {
    /// Rebuild every route configuration from `dag` and install them.
    fn on_change(&self, dag: &Dag) {
        let start = Instant::now();
        let configs = route_configurations(dag);
        let config_count = configs.len();

        let version = self.replace_all(configs);
        let virtual_hosts = self.virtual_host_count();

        metrics::record_cache_update(config_count, virtual_hosts, start);
        tracing::info!(
            version,
            route_configurations = config_count,
            virtual_hosts,
            "Route cache updated"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::{PathMatchCondition, ProxyRoute, Route, RouteAction, SecureVirtualHost, VirtualHost};
    use crate::xdscache::{ENVOY_FALLBACK_ROUTECONFIG, ENVOY_HTTP_LISTENER};

    fn names(values: &[Arc<RouteConfiguration>]) -> Vec<&str> {
        values.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_empty_cache() {
        let cache = RouteCache::new();
        assert_eq!(cache.version(), 0);
        assert!(cache.read_all().is_empty());
    }

    #[test]
    fn test_read_all_sorted_by_name() {
        let cache = RouteCache::new();
        let configs = BTreeMap::from([
            ("ingress_http".to_string(), RouteConfiguration::new("ingress_http")),
            ("https/b.example.com".to_string(), RouteConfiguration::new("https/b.example.com")),
            ("https/a.example.com".to_string(), RouteConfiguration::new("https/a.example.com")),
        ]);
        assert_eq!(cache.replace_all(configs), 1);

        assert_eq!(
            names(&cache.read_all()),
            vec!["https/a.example.com", "https/b.example.com", "ingress_http"]
        );
    }

    #[test]
    fn test_read_by_names_keeps_request_order() {
        let cache = RouteCache::new();
        cache.replace_all(BTreeMap::from([
            ("ingress_http".to_string(), RouteConfiguration::new("ingress_http")),
            ("https/a.example.com".to_string(), RouteConfiguration::new("https/a.example.com")),
        ]));

        let values = cache.read_by_names(&["ingress_http", "does-not-exist", "https/a.example.com"]);
        assert_eq!(
            names(&values),
            vec!["ingress_http", "does-not-exist", "https/a.example.com"]
        );
        assert_eq!(*values[1], RouteConfiguration::placeholder("does-not-exist"));
        assert!(values[1].virtual_hosts.is_empty());
    }

    #[test]
    fn test_replace_discards_previous_generation() {
        let cache = RouteCache::new();
        cache.replace_all(BTreeMap::from([(
            "https/old.example.com".to_string(),
            RouteConfiguration::new("https/old.example.com"),
        )]));
        cache.replace_all(BTreeMap::from([(
            "ingress_http".to_string(),
            RouteConfiguration::new("ingress_http"),
        )]));

        assert_eq!(cache.version(), 2);
        assert_eq!(names(&cache.read_all()), vec!["ingress_http"]);
    }

    #[test]
    fn test_versioned_reads_share_one_generation() {
        let cache = RouteCache::new();
        cache.replace_all(BTreeMap::from([(
            "ingress_http".to_string(),
            RouteConfiguration::new("ingress_http"),
        )]));
        cache.replace_all(BTreeMap::from([(
            "https/a.example.com".to_string(),
            RouteConfiguration::new("https/a.example.com"),
        )]));

        let (version, values) = cache.versioned_read_all();
        assert_eq!(version, 2);
        assert_eq!(names(&values), vec!["https/a.example.com"]);

        let (version, values) = cache.versioned_read_by_names(&["ingress_http"]);
        assert_eq!(version, 2);
        assert_eq!(*values[0], RouteConfiguration::placeholder("ingress_http"));
    }

    #[test]
    fn test_type_identifier() {
        assert_eq!(
            RouteCache::new().type_identifier(),
            "type.googleapis.com/envoy.config.route.v3.RouteConfiguration"
        );
    }

    #[tokio::test]
    async fn test_on_change_notifies_subscribers() {
        let cache = RouteCache::new();
        let mut rx = cache.subscribe();

        let mut dag = Dag::default();
        let mut vh = VirtualHost::new("foo.example.com");
        vh.routes.push(Route::new(
            PathMatchCondition::prefix("/"),
            RouteAction::Proxy(ProxyRoute::to("default/echo/80")),
        ));
        dag.virtual_hosts.push(vh);
        let mut svh = SecureVirtualHost::new("a.example.com");
        svh.fallback_certificate = true;
        dag.secure_virtual_hosts.push(svh);

        cache.on_change(&dag);

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), 1);
        assert_eq!(
            names(&cache.read_all()),
            vec!["https/a.example.com", ENVOY_FALLBACK_ROUTECONFIG, ENVOY_HTTP_LISTENER]
        );
        assert_eq!(cache.virtual_host_count(), 3);
    }
}
