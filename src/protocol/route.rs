//! Route configuration, virtual host and route resources.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::dag;
use crate::protocol::duration;
use crate::protocol::filters::{CorsPolicy, FilterConfig, RateLimit};

/// A named, ordered bundle of virtual hosts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteConfiguration {
    pub name: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub virtual_hosts: Vec<VirtualHost>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub request_headers_to_add: Vec<HeaderValueOption>,
}

impl RouteConfiguration {
    /// A route configuration as built from the graph: empty, stamped with
    /// the request start time header.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            virtual_hosts: Vec::new(),
            request_headers_to_add: vec![HeaderValueOption {
                header: HeaderValue::new("x-request-start", "t=%START_TIME(%s.%3f)%"),
                append: true,
            }],
        }
    }

    /// A bare resource carrying only its name.
    pub fn placeholder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            virtual_hosts: Vec::new(),
            request_headers_to_add: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VirtualHost {
    pub name: String,
    pub domains: Vec<String>,
    pub routes: Vec<Route>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cors: Option<CorsPolicy>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub typed_per_filter_config: Option<BTreeMap<String, FilterConfig>>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rate_limits: Vec<RateLimit>,
}

impl VirtualHost {
    /// A virtual host answering for `hostname`, on any port unless it is
    /// the wildcard host.
    pub fn new(hostname: &str, routes: Vec<Route>) -> Self {
        let mut domains = vec![hostname.to_string()];
        if hostname != "*" {
            domains.push(format!("{}:*", hostname));
        }
        Self {
            name: hostname.to_string(),
            domains,
            routes,
            cors: None,
            typed_per_filter_config: None,
            rate_limits: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    #[serde(rename = "match")]
    pub route_match: RouteMatch,

    #[serde(flatten)]
    pub action: Action,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub request_headers_to_add: Vec<HeaderValueOption>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub request_headers_to_remove: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub response_headers_to_add: Vec<HeaderValueOption>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub response_headers_to_remove: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub typed_per_filter_config: Option<BTreeMap<String, FilterConfig>>,
}

impl Route {
    pub fn new(route_match: RouteMatch, action: Action) -> Self {
        Self {
            route_match,
            action,
            request_headers_to_add: Vec::new(),
            request_headers_to_remove: Vec::new(),
            response_headers_to_add: Vec::new(),
            response_headers_to_remove: Vec::new(),
            typed_per_filter_config: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteMatch {
    #[serde(flatten)]
    pub path_specifier: PathSpecifier,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<HeaderMatcher>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathSpecifier {
    Prefix(String),
    Path(String),
    SafeRegex(String),
    PathSeparatedPrefix(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderMatcher {
    pub name: String,

    #[serde(flatten)]
    pub specifier: HeaderMatchSpecifier,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub invert_match: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderMatchSpecifier {
    Exact(String),
    Contains(String),
    PresentMatch(bool),
    SafeRegex(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Route(RouteAction),
    Redirect(RedirectAction),
    DirectResponse(DirectResponseAction),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteAction {
    #[serde(flatten)]
    pub cluster_specifier: ClusterSpecifier,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix_rewrite: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle_timeout: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_policy: Option<RetryPolicy>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub upgrade_configs: Vec<UpgradeConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterSpecifier {
    Cluster(String),
    WeightedClusters {
        clusters: Vec<ClusterWeight>,
        total_weight: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterWeight {
    pub name: String,
    pub weight: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetryPolicy {
    pub retry_on: String,
    pub num_retries: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_try_timeout: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpgradeConfig {
    pub upgrade_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RedirectAction {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub https_redirect: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme_redirect: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_redirect: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_redirect: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_redirect: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix_rewrite: Option<String>,

    pub response_code: RedirectResponseCode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RedirectResponseCode {
    #[default]
    MovedPermanently,
    Found,
    SeeOther,
    TemporaryRedirect,
    PermanentRedirect,
}

impl RedirectResponseCode {
    /// Map an HTTP status to a redirect code. Anything outside the
    /// redirect range falls back to 301.
    pub fn from_status(status: u32) -> Self {
        match status {
            302 => Self::Found,
            303 => Self::SeeOther,
            307 => Self::TemporaryRedirect,
            308 => Self::PermanentRedirect,
            _ => Self::MovedPermanently,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectResponseAction {
    pub status: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderValueOption {
    pub header: HeaderValue,
    pub append: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderValue {
    pub key: String,
    pub value: String,
}

impl HeaderValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Build the match for a graph route. Header conditions are emitted in the
/// order the route carries them.
pub fn route_match(route: &dag::Route) -> RouteMatch {
    RouteMatch {
        path_specifier: path_specifier(&route.path_match_condition),
        headers: route
            .header_match_conditions
            .iter()
            .map(header_matcher)
            .collect(),
    }
}

fn path_specifier(condition: &dag::PathMatchCondition) -> PathSpecifier {
    match condition {
        dag::PathMatchCondition::Prefix {
            prefix,
            match_type: dag::PrefixMatchType::Segment,
        } if prefix != "/" => PathSpecifier::PathSeparatedPrefix(prefix.trim_end_matches('/').to_string()),
        dag::PathMatchCondition::Prefix { prefix, .. } => PathSpecifier::Prefix(prefix.clone()),
        dag::PathMatchCondition::Exact { path } => PathSpecifier::Path(path.clone()),
        dag::PathMatchCondition::Regex { regex } => PathSpecifier::SafeRegex(regex.clone()),
    }
}

fn header_matcher(condition: &dag::HeaderMatchCondition) -> HeaderMatcher {
    let specifier = match condition.match_type {
        dag::HeaderMatchType::Exact => HeaderMatchSpecifier::Exact(condition.value.clone()),
        dag::HeaderMatchType::Contains => HeaderMatchSpecifier::Contains(condition.value.clone()),
        dag::HeaderMatchType::Present => HeaderMatchSpecifier::PresentMatch(true),
        dag::HeaderMatchType::Regex => HeaderMatchSpecifier::SafeRegex(condition.value.clone()),
    };
    HeaderMatcher {
        name: condition.name.clone(),
        specifier,
        invert_match: condition.invert,
    }
}

/// Redirect plaintext clients to the same URL over HTTPS.
pub fn upgrade_https() -> Action {
    Action::Redirect(RedirectAction {
        https_redirect: true,
        ..Default::default()
    })
}

pub fn route_direct_response(response: &dag::DirectResponse) -> Action {
    Action::DirectResponse(DirectResponseAction {
        status: response.status_code,
        body: response.body.clone(),
    })
}

pub fn route_redirect(redirect: &dag::Redirect) -> Action {
    Action::Redirect(RedirectAction {
        https_redirect: false,
        scheme_redirect: redirect.scheme.clone(),
        host_redirect: redirect.hostname.clone(),
        port_redirect: redirect.port,
        path_redirect: redirect.path_rewrite.clone(),
        prefix_rewrite: redirect.prefix_rewrite.clone(),
        response_code: RedirectResponseCode::from_status(redirect.status_code),
    })
}

/// Proxy to the route's upstream clusters.
pub fn route_route(upstream: &dag::ProxyRoute) -> Action {
    let timeouts = upstream.timeout_policy.as_ref();
    Action::Route(RouteAction {
        cluster_specifier: cluster_specifier(&upstream.clusters),
        prefix_rewrite: upstream.prefix_rewrite.clone(),
        timeout: timeouts.and_then(|t| t.response_timeout_ms).map(duration),
        idle_timeout: timeouts.and_then(|t| t.idle_timeout_ms).map(duration),
        retry_policy: upstream.retry_policy.as_ref().map(|p| RetryPolicy {
            retry_on: p.retry_on.clone(),
            num_retries: p.num_retries,
            per_try_timeout: p.per_try_timeout_ms.map(duration),
        }),
        upgrade_configs: if upstream.websocket {
            vec![UpgradeConfig {
                upgrade_type: "websocket".to_string(),
            }]
        } else {
            Vec::new()
        },
    })
}

fn cluster_specifier(clusters: &[dag::Cluster]) -> ClusterSpecifier {
    if let [single] = clusters {
        return ClusterSpecifier::Cluster(single.name.clone());
    }

    // Unweighted clusters share traffic evenly.
    let unweighted = clusters.iter().all(|c| c.weight == 0);
    let mut weights: Vec<ClusterWeight> = clusters
        .iter()
        .map(|c| ClusterWeight {
            name: c.name.clone(),
            weight: if unweighted { 1 } else { c.weight },
        })
        .collect();
    weights.sort_by(|a, b| a.name.cmp(&b.name).then(a.weight.cmp(&b.weight)));

    let total_weight = weights
        .iter()
        .fold(0u32, |total, w| total.saturating_add(w.weight));
    ClusterSpecifier::WeightedClusters {
        clusters: weights,
        total_weight,
    }
}

/// Header entries in key order. `append` selects add versus overwrite.
pub fn header_value_list(headers: &BTreeMap<String, String>, append: bool) -> Vec<HeaderValueOption> {
    headers
        .iter()
        .map(|(key, value)| HeaderValueOption {
            header: HeaderValue::new(key.clone(), value.clone()),
            append,
        })
        .collect()
}
