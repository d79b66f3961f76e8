//! Configuration and routing graph validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject graphs the route translator assumes never happen
//! - Validate value ranges (redirect codes, cluster names)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: input → Result<(), Vec<ValidationError>>
//! - Runs before a graph is handed to the cache

use std::collections::HashSet;

use thiserror::Error;

use crate::config::schema::ControlPlaneConfig;
use crate::dag::{Dag, ProxyRoute, Route, RouteAction, VirtualHost};

const REDIRECT_CODES: [u32; 5] = [301, 302, 303, 307, 308];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("admin api_key must not be empty when admin is enabled")]
    EmptyAdminKey,

    #[error("virtual host name must not be empty")]
    EmptyVirtualHostName,

    #[error("duplicate {listener} virtual host {name:?}")]
    DuplicateVirtualHost { listener: &'static str, name: String },

    #[error("route {index} on {vhost:?} proxies to no clusters")]
    NoClusters { vhost: String, index: usize },

    #[error("route {index} on {vhost:?} names a cluster with an empty name")]
    EmptyClusterName { vhost: String, index: usize },

    #[error("route {index} on {vhost:?} has cluster weights summing past {}", u32::MAX)]
    ClusterWeightOverflow { vhost: String, index: usize },

    #[error("route {index} on {vhost:?} uses unsupported redirect status {status}")]
    RedirectStatus { vhost: String, index: usize, status: u32 },

    #[error("route {index} on {vhost:?} sets an authorization override without an authorization service")]
    AuthOverrideWithoutService { vhost: String, index: usize },
}

/// Validate the control plane configuration.
pub fn validate_config(config: &ControlPlaneConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    if config.admin.enabled && config.admin.api_key.is_empty() {
        errors.push(ValidationError::EmptyAdminKey);
    }
    finish(errors)
}

/// Validate a routing graph snapshot.
pub fn validate_graph(dag: &Dag) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut seen = HashSet::new();
    for vh in &dag.virtual_hosts {
        check_virtual_host(vh, "plaintext", &mut seen, &mut errors);
        for (index, route) in vh.routes.iter().enumerate() {
            check_route(&vh.name, index, route, &mut errors);
            if has_auth_override(route) {
                errors.push(ValidationError::AuthOverrideWithoutService {
                    vhost: vh.name.clone(),
                    index,
                });
            }
        }
    }

    let mut seen = HashSet::new();
    for svh in &dag.secure_virtual_hosts {
        let vh = &svh.virtual_host;
        check_virtual_host(vh, "secure", &mut seen, &mut errors);
        for (index, route) in vh.routes.iter().enumerate() {
            check_route(&vh.name, index, route, &mut errors);
            if svh.authorization_service.is_none() && has_auth_override(route) {
                errors.push(ValidationError::AuthOverrideWithoutService {
                    vhost: vh.name.clone(),
                    index,
                });
            }
        }
    }

    finish(errors)
}

fn finish(errors: Vec<ValidationError>) -> Result<(), Vec<ValidationError>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_virtual_host<'a>(
    vh: &'a VirtualHost,
    listener: &'static str,
    seen: &mut HashSet<&'a str>,
    errors: &mut Vec<ValidationError>,
) {
    if vh.name.is_empty() {
        errors.push(ValidationError::EmptyVirtualHostName);
    } else if !seen.insert(vh.name.as_str()) {
        errors.push(ValidationError::DuplicateVirtualHost {
            listener,
            name: vh.name.clone(),
        });
    }
}

fn check_route(vhost: &str, index: usize, route: &Route, errors: &mut Vec<ValidationError>) {
    match &route.action {
        RouteAction::Proxy(upstream) | RouteAction::HttpsUpgrade(upstream) => {
            check_upstream(vhost, index, upstream, errors)
        }
        RouteAction::Redirect(redirect) if !REDIRECT_CODES.contains(&redirect.status_code) => {
            errors.push(ValidationError::RedirectStatus {
                vhost: vhost.to_string(),
                index,
                status: redirect.status_code,
            });
        }
        RouteAction::Redirect(_) | RouteAction::DirectResponse(_) => {}
    }
}

fn check_upstream(vhost: &str, index: usize, upstream: &ProxyRoute, errors: &mut Vec<ValidationError>) {
    if upstream.clusters.is_empty() {
        errors.push(ValidationError::NoClusters {
            vhost: vhost.to_string(),
            index,
        });
        return;
    }

    for cluster in &upstream.clusters {
        if cluster.name.is_empty() {
            errors.push(ValidationError::EmptyClusterName {
                vhost: vhost.to_string(),
                index,
            });
        }
    }

    let total: u64 = upstream.clusters.iter().map(|c| u64::from(c.weight)).sum();
    if total > u64::from(u32::MAX) {
        errors.push(ValidationError::ClusterWeightOverflow {
            vhost: vhost.to_string(),
            index,
        });
    }
}

fn has_auth_override(route: &Route) -> bool {
    route.auth_disabled || !route.auth_context.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::{
        AuthorizationService, DirectResponse, PathMatchCondition, Redirect, SecureVirtualHost,
    };

    fn proxy_route(cluster: &str) -> Route {
        Route::new(
            PathMatchCondition::prefix("/"),
            RouteAction::Proxy(ProxyRoute::to(cluster)),
        )
    }

    #[test]
    fn test_valid_graph() {
        let mut dag = Dag::default();
        let mut vh = VirtualHost::new("foo.example.com");
        vh.routes.push(proxy_route("default/echo/80"));
        dag.virtual_hosts.push(vh);

        // The same name on both listeners is fine.
        let mut svh = SecureVirtualHost::new("foo.example.com");
        svh.authorization_service = Some(AuthorizationService::default());
        let mut route = proxy_route("default/echo/80");
        route.auth_disabled = true;
        svh.virtual_host.routes.push(route);
        dag.secure_virtual_hosts.push(svh);

        assert_eq!(validate_graph(&dag), Ok(()));
    }

    #[test]
    fn test_collects_every_error() {
        let mut dag = Dag::default();
        dag.virtual_hosts.push(VirtualHost::new(""));
        dag.virtual_hosts.push(VirtualHost::new("dup.example.com"));

        let mut vh = VirtualHost::new("dup.example.com");
        vh.routes.push(Route::new(
            PathMatchCondition::prefix("/"),
            RouteAction::Proxy(ProxyRoute::default()),
        ));
        vh.routes.push(Route::new(
            PathMatchCondition::prefix("/old"),
            RouteAction::Redirect(Redirect {
                status_code: 200,
                ..Default::default()
            }),
        ));
        let mut route = Route::new(
            PathMatchCondition::exact("/health"),
            RouteAction::DirectResponse(DirectResponse {
                status_code: 200,
                body: None,
            }),
        );
        route.auth_disabled = true;
        vh.routes.push(route);
        dag.virtual_hosts.push(vh);

        let errors = validate_graph(&dag).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::EmptyVirtualHostName,
                ValidationError::DuplicateVirtualHost {
                    listener: "plaintext",
                    name: "dup.example.com".into(),
                },
                ValidationError::NoClusters {
                    vhost: "dup.example.com".into(),
                    index: 0,
                },
                ValidationError::RedirectStatus {
                    vhost: "dup.example.com".into(),
                    index: 1,
                    status: 200,
                },
                ValidationError::AuthOverrideWithoutService {
                    vhost: "dup.example.com".into(),
                    index: 2,
                },
            ]
        );
    }

    #[test]
    fn test_secure_auth_override_needs_service() {
        let mut dag = Dag::default();
        let mut svh = SecureVirtualHost::new("secure.example.com");
        let mut route = proxy_route("default/echo/80");
        route.auth_context.insert("tier".into(), "gold".into());
        svh.virtual_host.routes.push(route);
        dag.secure_virtual_hosts.push(svh);

        assert_eq!(
            validate_graph(&dag),
            Err(vec![ValidationError::AuthOverrideWithoutService {
                vhost: "secure.example.com".into(),
                index: 0,
            }])
        );
    }

    #[test]
    fn test_cluster_weights_must_fit_total() {
        let mut upstream = ProxyRoute::to("default/a/80");
        upstream.clusters[0].weight = u32::MAX;
        upstream.clusters.push(crate::dag::Cluster {
            name: "default/b/80".into(),
            weight: 1,
        });

        let mut dag = Dag::default();
        let mut vh = VirtualHost::new("foo.example.com");
        vh.routes.push(Route::new(
            PathMatchCondition::prefix("/"),
            RouteAction::Proxy(upstream),
        ));
        dag.virtual_hosts.push(vh);

        assert_eq!(
            validate_graph(&dag),
            Err(vec![ValidationError::ClusterWeightOverflow {
                vhost: "foo.example.com".into(),
                index: 0,
            }])
        );
    }

    #[test]
    fn test_empty_admin_key() {
        let mut config = ControlPlaneConfig::default();
        config.admin.api_key.clear();
        assert_eq!(validate_config(&config), Err(vec![ValidationError::EmptyAdminKey]));

        config.admin.enabled = false;
        assert_eq!(validate_config(&config), Ok(()));
    }
}
