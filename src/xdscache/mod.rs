//! Discovery caches.
//!
//! # Data Flow
//! ```text
//! Dag snapshot (per graph change)
//!     → route.rs on_change (sort, translate, bucket)
//!     → RouteCache::replace_all (atomic swap, bump version)
//!     → cond.rs notify (wake waiters)
//!
//! Discovery / admin readers:
//!     → read_all / read_by_names (copy references out, sort)
//! ```
//!
//! # Design Decisions
//! - Full rebuild on every graph change, no incremental patching
//! - One generation held at a time; readers see old or new, never a mix
//! - Translation happens before the swap so the swap itself is O(1)
//! - Missed wakeups are benign: waiters always re-read current state

pub mod cond;
pub mod route;
pub mod translate;

use std::sync::Arc;

use tokio::sync::watch;

use crate::dag::Dag;

pub use cond::Cond;
pub use route::RouteCache;

/// Route configuration holding every plaintext virtual host.
pub const ENVOY_HTTP_LISTENER: &str = "ingress_http";

/// Route configuration holding secure virtual hosts served with the
/// fallback certificate.
pub const ENVOY_FALLBACK_ROUTECONFIG: &str = "ingress_fallbackcert";

/// Name of the route configuration serving one secure virtual host.
pub fn secure_route_config_name(fqdn: &str) -> String {
    format!("https/{}", fqdn)
}

/// A versioned store of named resources served to the discovery layer.
pub trait ResourceCache: Send + Sync {
    type Resource;

    /// Every resource, sorted by name.
    fn read_all(&self) -> Vec<Arc<Self::Resource>>;

    /// One resource per requested name, in request order. Unknown names
    /// yield an empty resource carrying that name.
    fn read_by_names<S: AsRef<str>>(&self, names: &[S]) -> Vec<Arc<Self::Resource>>;

    /// Resource type served by this cache.
    fn type_identifier(&self) -> &'static str;

    /// Subscribe to version changes.
    fn subscribe(&self) -> watch::Receiver<u64>;
}

/// Receives each new routing graph snapshot.
pub trait Observer: Send + Sync {
    fn on_change(&self, dag: &Dag);
}
