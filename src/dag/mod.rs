//! Routing graph model.
//!
//! # Data Flow
//! ```text
//! graph builder (external) / graph snapshot file
//!     → Dag (plaintext + secure virtual hosts)
//!     → xdscache::route (sorted, converted, bucketed)
//!     → RouteCache snapshot
//! ```
//!
//! # Design Decisions
//! - The graph is an immutable snapshot; consumers never mutate it
//! - Route actions are a sum type, exclusivity is enforced by construction
//! - Maps use `BTreeMap` so every traversal is deterministic
//! - All types deserialize from TOML so a snapshot can be loaded from disk

pub mod policy;
pub mod route;

use serde::{Deserialize, Serialize};

pub use policy::{
    CorsPolicy, GlobalRateLimitPolicy, HeadersPolicy, LocalRateLimitPolicy, RateLimitDescriptor,
    RateLimitDescriptorEntry, RateLimitPolicy,
};
pub use route::{
    Cluster, DirectResponse, HeaderMatchCondition, HeaderMatchType, PathMatchCondition,
    PrefixMatchType, ProxyRoute, Redirect, RetryPolicy, Route, RouteAction, TimeoutPolicy,
};

/// A full snapshot of the routing graph.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Dag {
    /// Virtual hosts served on the plaintext listener.
    pub virtual_hosts: Vec<VirtualHost>,

    /// Virtual hosts served on the secure listener.
    pub secure_virtual_hosts: Vec<SecureVirtualHost>,
}

impl Dag {
    /// Plaintext virtual hosts paired with their routes, in graph order.
    pub fn virtual_host_routes(&self) -> impl Iterator<Item = (&VirtualHost, &[Route])> {
        self.virtual_hosts.iter().map(|vh| (vh, vh.routes.as_slice()))
    }

    /// Secure virtual hosts paired with their routes, in graph order.
    pub fn secure_virtual_host_routes(
        &self,
    ) -> impl Iterator<Item = (&SecureVirtualHost, &[Route])> {
        self.secure_virtual_hosts
            .iter()
            .map(|svh| (svh, svh.virtual_host.routes.as_slice()))
    }
}

/// A named host entry and the routes attached to it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct VirtualHost {
    /// Fully qualified host name, or `*`.
    pub name: String,

    #[serde(default)]
    pub cors_policy: Option<CorsPolicy>,

    #[serde(default)]
    pub rate_limit_policy: Option<RateLimitPolicy>,

    #[serde(default)]
    pub routes: Vec<Route>,
}

impl VirtualHost {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A virtual host reachable over TLS.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SecureVirtualHost {
    #[serde(flatten)]
    pub virtual_host: VirtualHost,

    /// External authorization service protecting this host.
    #[serde(default)]
    pub authorization_service: Option<AuthorizationService>,

    /// Serve this host through the default certificate when the client
    /// does not send SNI.
    #[serde(default)]
    pub fallback_certificate: bool,
}

impl SecureVirtualHost {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            virtual_host: VirtualHost::new(name),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.virtual_host.name
    }
}

/// Reference to an external authorization server.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AuthorizationService {
    /// Extension service (cluster) implementing the check API.
    pub extension_service: String,

    /// Allow requests through when the authorization server is unreachable.
    #[serde(default)]
    pub fail_open: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRAPH: &str = r#"
[[virtual_hosts]]
name = "foo.example.com"

[[virtual_hosts.routes]]
path_match_condition = { type = "prefix", prefix = "/" }
action = { type = "proxy", clusters = [{ name = "default/echo/80" }] }

[[secure_virtual_hosts]]
name = "a.example.com"
fallback_certificate = true
authorization_service = { extension_service = "auth/authz" }

[[secure_virtual_hosts.routes]]
path_match_condition = { type = "exact", path = "/login" }
action = { type = "direct_response", status_code = 403 }
auth_disabled = true
"#;

    #[test]
    fn test_deserialize_graph() {
        let dag: Dag = toml::from_str(GRAPH).unwrap();

        assert_eq!(dag.virtual_hosts.len(), 1);
        let vh = &dag.virtual_hosts[0];
        assert_eq!(vh.name, "foo.example.com");
        assert_eq!(
            vh.routes[0].path_match_condition,
            PathMatchCondition::Prefix {
                prefix: "/".into(),
                match_type: PrefixMatchType::String,
            }
        );
        match &vh.routes[0].action {
            RouteAction::Proxy(upstream) => {
                assert_eq!(upstream.clusters[0].name, "default/echo/80");
                assert_eq!(upstream.clusters[0].weight, 0);
            }
            other => panic!("unexpected action {:?}", other),
        }

        let svh = &dag.secure_virtual_hosts[0];
        assert_eq!(svh.name(), "a.example.com");
        assert!(svh.fallback_certificate);
        assert_eq!(
            svh.authorization_service.as_ref().map(|a| a.extension_service.as_str()),
            Some("auth/authz")
        );
        assert!(svh.virtual_host.routes[0].auth_disabled);
    }

    #[test]
    fn test_route_iterators_keep_graph_order() {
        let mut dag = Dag::default();
        dag.virtual_hosts.push(VirtualHost::new("b.example.com"));
        dag.virtual_hosts.push(VirtualHost::new("a.example.com"));
        dag.secure_virtual_hosts.push(SecureVirtualHost::new("s.example.com"));

        let names: Vec<_> = dag.virtual_host_routes().map(|(vh, _)| vh.name.as_str()).collect();
        assert_eq!(names, vec!["b.example.com", "a.example.com"]);

        let secure: Vec<_> = dag.secure_virtual_host_routes().map(|(svh, _)| svh.name()).collect();
        assert_eq!(secure, vec!["s.example.com"]);
    }
}
