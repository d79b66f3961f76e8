//! Translation of the routing graph into route configurations.
//!
//! # Responsibilities
//! - Sort graph routes into proxy match precedence
//! - Convert each route into exactly one action plus its overrides
//! - Assemble virtual hosts with host level CORS and rate limits
//! - Bucket virtual hosts into the named route configurations

use std::collections::BTreeMap;

use crate::dag::{self, Dag, RouteAction};
use crate::protocol::{
    self,
    filters::{
        cors_policy, global_rate_limits, local_rate_limit_config, route_authz_context,
        route_authz_disabled,
    },
    route::{
        header_value_list, route_direct_response, route_match, route_redirect, route_route,
        upgrade_https,
    },
    FilterConfig, FilterOverrides, RouteConfiguration, EXT_AUTHZ_FILTER, LOCAL_RATE_LIMIT_FILTER,
};
use crate::sorter::{compare_header_match_conditions, compare_routes, compare_virtual_hosts};
use crate::xdscache::{secure_route_config_name, ENVOY_FALLBACK_ROUTECONFIG, ENVOY_HTTP_LISTENER};

/// Build every route configuration for a graph snapshot, keyed by name.
///
/// `ingress_http` is always present. Each secure virtual host gets its own
/// `https/<fqdn>` configuration and, when it opts into the fallback
/// certificate, is also added to `ingress_fallbackcert`.
pub fn route_configurations(dag: &Dag) -> BTreeMap<String, RouteConfiguration> {
    let mut configs = BTreeMap::new();
    configs.insert(
        ENVOY_HTTP_LISTENER.to_string(),
        RouteConfiguration::new(ENVOY_HTTP_LISTENER),
    );

    for (vhost, routes) in dag.virtual_host_routes() {
        let routes = sort_routes(routes)
            .iter()
            .map(|route| insecure_route(vhost, route))
            .collect();
        bucket(&mut configs, ENVOY_HTTP_LISTENER).push(to_virtual_host(vhost, routes));
    }

    for (svhost, routes) in dag.secure_virtual_host_routes() {
        let routes = sort_routes(routes)
            .iter()
            .map(|route| secure_route(svhost, route))
            .collect();
        let evh = to_virtual_host(&svhost.virtual_host, routes);

        if svhost.fallback_certificate {
            bucket(&mut configs, ENVOY_FALLBACK_ROUTECONFIG).push(evh.clone());
        }
        bucket(&mut configs, &secure_route_config_name(svhost.name())).push(evh);
    }

    for config in configs.values_mut() {
        config.virtual_hosts.sort_by(compare_virtual_hosts);
    }

    configs
}

fn bucket<'a>(
    configs: &'a mut BTreeMap<String, RouteConfiguration>,
    name: &str,
) -> &'a mut Vec<protocol::VirtualHost> {
    &mut configs
        .entry(name.to_string())
        .or_insert_with(|| RouteConfiguration::new(name))
        .virtual_hosts
}

/// Sort a copy of `routes` into match precedence. Each copy's header
/// conditions are sorted by name first; the input is left untouched.
pub fn sort_routes(routes: &[dag::Route]) -> Vec<dag::Route> {
    let mut sorted = routes.to_vec();
    for route in &mut sorted {
        route
            .header_match_conditions
            .sort_by(compare_header_match_conditions);
    }
    sorted.sort_by(compare_routes);
    sorted
}

/// Convert a route served on the plaintext listener.
pub fn insecure_route(vhost: &dag::VirtualHost, route: &dag::Route) -> protocol::Route {
    match &route.action {
        RouteAction::HttpsUpgrade(_) => protocol::Route::new(route_match(route), upgrade_https()),
        RouteAction::DirectResponse(response) => {
            protocol::Route::new(route_match(route), route_direct_response(response))
        }
        RouteAction::Redirect(redirect) => {
            protocol::Route::new(route_match(route), route_redirect(redirect))
        }
        RouteAction::Proxy(upstream) => {
            proxy_route(&vhost.name, route, upstream, FilterOverrides::default())
        }
    }
}

/// Convert a route served on the secure listener. An HTTPS upgrade route
/// has already arrived over TLS here, so it proxies to its upstream.
pub fn secure_route(svhost: &dag::SecureVirtualHost, route: &dag::Route) -> protocol::Route {
    match &route.action {
        RouteAction::DirectResponse(response) => {
            protocol::Route::new(route_match(route), route_direct_response(response))
        }
        RouteAction::Redirect(redirect) => {
            protocol::Route::new(route_match(route), route_redirect(redirect))
        }
        RouteAction::HttpsUpgrade(upstream) | RouteAction::Proxy(upstream) => {
            let overrides = if svhost.authorization_service.is_some() {
                FilterOverrides::default().with_opt(EXT_AUTHZ_FILTER, authz_override(route))
            } else {
                FilterOverrides::default()
            };
            proxy_route(svhost.name(), route, upstream, overrides)
        }
    }
}

fn authz_override(route: &dag::Route) -> Option<FilterConfig> {
    if route.auth_disabled {
        Some(route_authz_disabled())
    } else if !route.auth_context.is_empty() {
        Some(route_authz_context(&route.auth_context))
    } else {
        None
    }
}

fn proxy_route(
    vhost_name: &str,
    route: &dag::Route,
    upstream: &dag::ProxyRoute,
    overrides: FilterOverrides,
) -> protocol::Route {
    let mut rt = protocol::Route::new(route_match(route), route_route(upstream));

    if let Some(policy) = &route.request_headers_policy {
        // Set before add: a header in both keeps the overwrite first.
        rt.request_headers_to_add = header_value_list(&policy.set, false);
        rt.request_headers_to_add
            .extend(header_value_list(&policy.add, true));
        rt.request_headers_to_remove = policy.remove.clone();
    }
    if let Some(policy) = &route.response_headers_policy {
        rt.response_headers_to_add = header_value_list(&policy.set, false);
        rt.response_headers_to_remove = policy.remove.clone();
    }

    let local = route
        .rate_limit_policy
        .as_ref()
        .and_then(|p| p.local.as_ref())
        .map(|local| local_rate_limit_config(local, &stat_prefix(vhost_name)));

    rt.typed_per_filter_config = overrides
        .with_opt(LOCAL_RATE_LIMIT_FILTER, local)
        .build();
    rt
}

/// Assemble a virtual host from already sorted, converted routes.
pub fn to_virtual_host(vh: &dag::VirtualHost, routes: Vec<protocol::Route>) -> protocol::VirtualHost {
    let mut evh = protocol::VirtualHost::new(&vh.name, routes);
    evh.cors = vh.cors_policy.as_ref().map(cors_policy);

    if let Some(policy) = &vh.rate_limit_policy {
        let local = policy
            .local
            .as_ref()
            .map(|local| local_rate_limit_config(local, &stat_prefix(&vh.name)));
        evh.typed_per_filter_config = FilterOverrides::default()
            .with_opt(LOCAL_RATE_LIMIT_FILTER, local)
            .build();

        if let Some(global) = &policy.global {
            evh.rate_limits = global_rate_limits(&global.descriptors);
        }
    }

    evh
}

fn stat_prefix(vhost_name: &str) -> String {
    format!("vhost.{}", vhost_name)
}
