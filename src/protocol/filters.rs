//! HTTP filter overrides, rate limit actions and CORS.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::dag;
use crate::protocol::duration;
use crate::protocol::route::{header_value_list, HeaderValueOption};

/// Filter name for per-proxy rate limiting.
pub const LOCAL_RATE_LIMIT_FILTER: &str = "envoy.filters.http.local_ratelimit";

/// Filter name for external authorization.
pub const EXT_AUTHZ_FILTER: &str = "envoy.filters.http.ext_authz";

/// Typed configuration attached to a route or virtual host for one filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterConfig {
    LocalRateLimit(LocalRateLimit),
    ExtAuthzPerRoute(ExtAuthzPerRoute),
}

/// Collects per-filter overrides. Empty collections build to `None` so
/// resources without overrides carry no map at all.
#[derive(Debug, Clone, Default)]
pub struct FilterOverrides {
    configs: BTreeMap<String, FilterConfig>,
}

impl FilterOverrides {
    pub fn with(mut self, filter: &str, config: FilterConfig) -> Self {
        self.configs.insert(filter.to_string(), config);
        self
    }

    pub fn with_opt(self, filter: &str, config: Option<FilterConfig>) -> Self {
        match config {
            Some(config) => self.with(filter, config),
            None => self,
        }
    }

    pub fn build(self) -> Option<BTreeMap<String, FilterConfig>> {
        if self.configs.is_empty() {
            None
        } else {
            Some(self.configs)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalRateLimit {
    pub stat_prefix: String,
    pub token_bucket: TokenBucket,
    pub filter_enabled: RuntimeFractionalPercent,
    pub filter_enforced: RuntimeFractionalPercent,
    pub status: u32,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub response_headers_to_add: Vec<HeaderValueOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenBucket {
    pub max_tokens: u32,
    pub tokens_per_fill: u32,
    pub fill_interval: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuntimeFractionalPercent {
    pub numerator: u32,
    pub denominator: &'static str,
}

impl RuntimeFractionalPercent {
    fn hundred() -> Self {
        Self {
            numerator: 100,
            denominator: "HUNDRED",
        }
    }
}

/// Local rate limit filter config for a route or virtual host.
pub fn local_rate_limit_config(policy: &dag::LocalRateLimitPolicy, stat_prefix: &str) -> FilterConfig {
    let tokens_per_fill = if policy.tokens_per_fill == 0 {
        policy.max_tokens
    } else {
        policy.tokens_per_fill
    };
    let status = if policy.response_status_code == 0 {
        429
    } else {
        policy.response_status_code
    };

    FilterConfig::LocalRateLimit(LocalRateLimit {
        stat_prefix: stat_prefix.to_string(),
        token_bucket: TokenBucket {
            max_tokens: policy.max_tokens,
            tokens_per_fill,
            fill_interval: duration(policy.fill_interval_ms),
        },
        filter_enabled: RuntimeFractionalPercent::hundred(),
        filter_enforced: RuntimeFractionalPercent::hundred(),
        status,
        response_headers_to_add: header_value_list(&policy.response_headers_to_add, false),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtAuthzPerRoute {
    Disabled(bool),
    CheckSettings {
        context_extensions: BTreeMap<String, String>,
    },
}

/// Turn off authorization for a route.
pub fn route_authz_disabled() -> FilterConfig {
    FilterConfig::ExtAuthzPerRoute(ExtAuthzPerRoute::Disabled(true))
}

/// Pass extra context to the authorization server for a route.
pub fn route_authz_context(context: &BTreeMap<String, String>) -> FilterConfig {
    FilterConfig::ExtAuthzPerRoute(ExtAuthzPerRoute::CheckSettings {
        context_extensions: context.clone(),
    })
}

/// One global rate limit descriptor, built from its actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimit {
    pub actions: Vec<RateLimitAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitAction {
    GenericKey {
        #[serde(skip_serializing_if = "Option::is_none")]
        descriptor_key: Option<String>,
        descriptor_value: String,
    },
    RequestHeaders {
        header_name: String,
        descriptor_key: String,
    },
    RemoteAddress {},
}

pub fn global_rate_limits(descriptors: &[dag::RateLimitDescriptor]) -> Vec<RateLimit> {
    descriptors
        .iter()
        .map(|descriptor| RateLimit {
            actions: descriptor
                .entries
                .iter()
                .map(|entry| match entry {
                    dag::RateLimitDescriptorEntry::GenericKey { key, value } => {
                        RateLimitAction::GenericKey {
                            descriptor_key: key.clone(),
                            descriptor_value: value.clone(),
                        }
                    }
                    dag::RateLimitDescriptorEntry::RequestHeader { header_name, key } => {
                        RateLimitAction::RequestHeaders {
                            header_name: header_name.clone(),
                            descriptor_key: key.clone(),
                        }
                    }
                    dag::RateLimitDescriptorEntry::RemoteAddress => RateLimitAction::RemoteAddress {},
                })
                .collect(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorsPolicy {
    pub allow_origin_string_match: Vec<StringMatcher>,
    pub allow_credentials: bool,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub allow_methods: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub allow_headers: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub expose_headers: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StringMatcher {
    Exact(String),
    SafeRegex(String),
}

pub fn cors_policy(policy: &dag::CorsPolicy) -> CorsPolicy {
    CorsPolicy {
        allow_origin_string_match: policy
            .allow_origin
            .iter()
            .map(|origin| {
                if origin == "*" {
                    StringMatcher::SafeRegex(".*".to_string())
                } else {
                    StringMatcher::Exact(origin.clone())
                }
            })
            .collect(),
        allow_credentials: policy.allow_credentials,
        allow_methods: policy.allow_methods.join(","),
        allow_headers: policy.allow_headers.join(","),
        expose_headers: policy.expose_headers.join(","),
        max_age: policy.max_age_secs.map(|secs| secs.to_string()),
    }
}
