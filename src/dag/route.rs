//! Route definitions: match conditions and actions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dag::policy::{HeadersPolicy, RateLimitPolicy};

/// A match specification plus the action to take when it matches.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Route {
    pub path_match_condition: PathMatchCondition,

    #[serde(default)]
    pub header_match_conditions: Vec<HeaderMatchCondition>,

    pub action: RouteAction,

    #[serde(default)]
    pub request_headers_policy: Option<HeadersPolicy>,

    #[serde(default)]
    pub response_headers_policy: Option<HeadersPolicy>,

    #[serde(default)]
    pub rate_limit_policy: Option<RateLimitPolicy>,

    /// Skip the external authorization check for this route.
    #[serde(default)]
    pub auth_disabled: bool,

    /// Context handed to the authorization server for this route.
    #[serde(default)]
    pub auth_context: BTreeMap<String, String>,
}

impl Route {
    /// Create a route with no header conditions or policies.
    pub fn new(path_match_condition: PathMatchCondition, action: RouteAction) -> Self {
        Self {
            path_match_condition,
            header_match_conditions: Vec::new(),
            action,
            request_headers_policy: None,
            response_headers_policy: None,
            rate_limit_policy: None,
            auth_disabled: false,
            auth_context: BTreeMap::new(),
        }
    }
}

/// How the request path is matched.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PathMatchCondition {
    Prefix {
        prefix: String,
        #[serde(default)]
        match_type: PrefixMatchType,
    },
    Exact {
        path: String,
    },
    Regex {
        regex: String,
    },
}

impl PathMatchCondition {
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self::Prefix {
            prefix: prefix.into(),
            match_type: PrefixMatchType::String,
        }
    }

    pub fn exact(path: impl Into<String>) -> Self {
        Self::Exact { path: path.into() }
    }

    pub fn regex(regex: impl Into<String>) -> Self {
        Self::Regex {
            regex: regex.into(),
        }
    }
}

/// Whether a prefix must end on a path segment boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrefixMatchType {
    /// `/foo` matches `/foo`, `/foo/bar` and `/foobar`.
    #[default]
    String,
    /// `/foo` matches `/foo` and `/foo/bar` but not `/foobar`.
    Segment,
}

/// A condition on a single request header.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HeaderMatchCondition {
    pub name: String,

    #[serde(default)]
    pub match_type: HeaderMatchType,

    #[serde(default)]
    pub value: String,

    /// Negate the match.
    #[serde(default)]
    pub invert: bool,
}

impl HeaderMatchCondition {
    pub fn exact(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            match_type: HeaderMatchType::Exact,
            value: value.into(),
            invert: false,
        }
    }

    pub fn present(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            match_type: HeaderMatchType::Present,
            value: String::new(),
            invert: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderMatchType {
    #[default]
    Exact,
    Contains,
    Present,
    Regex,
}

/// What the proxy does with a matched request.
///
/// Exactly one action applies to a route. `HttpsUpgrade` carries the
/// upstream the same route proxies to once the client arrives over TLS.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RouteAction {
    HttpsUpgrade(ProxyRoute),
    DirectResponse(DirectResponse),
    Redirect(Redirect),
    Proxy(ProxyRoute),
}

/// Forward the request to one or more weighted clusters.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ProxyRoute {
    pub clusters: Vec<Cluster>,

    #[serde(default)]
    pub prefix_rewrite: Option<String>,

    #[serde(default)]
    pub timeout_policy: Option<TimeoutPolicy>,

    #[serde(default)]
    pub retry_policy: Option<RetryPolicy>,

    /// Allow websocket upgrades on this route.
    #[serde(default)]
    pub websocket: bool,
}

impl ProxyRoute {
    /// Proxy to a single cluster.
    pub fn to(cluster: impl Into<String>) -> Self {
        Self {
            clusters: vec![Cluster::new(cluster)],
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Cluster {
    pub name: String,

    /// Relative weight; zero means "unweighted".
    #[serde(default)]
    pub weight: u32,
}

impl Cluster {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            weight: 0,
        }
    }
}

/// Timeouts in milliseconds. Zero disables the timeout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TimeoutPolicy {
    #[serde(default)]
    pub response_timeout_ms: Option<u64>,

    #[serde(default)]
    pub idle_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RetryPolicy {
    #[serde(default = "default_retry_on")]
    pub retry_on: String,

    #[serde(default = "default_num_retries")]
    pub num_retries: u32,

    #[serde(default)]
    pub per_try_timeout_ms: Option<u64>,
}

fn default_retry_on() -> String {
    "5xx".to_string()
}

fn default_num_retries() -> u32 {
    1
}

/// Answer the request without contacting an upstream.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DirectResponse {
    pub status_code: u32,

    #[serde(default)]
    pub body: Option<String>,
}

/// Send the client somewhere else.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Redirect {
    #[serde(default)]
    pub scheme: Option<String>,

    #[serde(default)]
    pub hostname: Option<String>,

    #[serde(default)]
    pub port: Option<u32>,

    /// Replace the whole path.
    #[serde(default)]
    pub path_rewrite: Option<String>,

    /// Replace only the matched prefix.
    #[serde(default)]
    pub prefix_rewrite: Option<String>,

    #[serde(default = "default_redirect_status")]
    pub status_code: u32,
}

impl Default for Redirect {
    fn default() -> Self {
        Self {
            scheme: None,
            hostname: None,
            port: None,
            path_rewrite: None,
            prefix_rewrite: None,
            status_code: default_redirect_status(),
        }
    }
}

fn default_redirect_status() -> u32 {
    301
}
