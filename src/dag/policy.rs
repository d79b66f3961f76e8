//! Header, rate limit and CORS policies attached to routes and hosts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Header mutations applied to a request or response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HeadersPolicy {
    /// Headers overwritten with the given value.
    pub set: BTreeMap<String, String>,

    /// Headers appended alongside any existing value.
    pub add: BTreeMap<String, String>,

    /// Headers stripped.
    pub remove: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitPolicy {
    pub local: Option<LocalRateLimitPolicy>,
    pub global: Option<GlobalRateLimitPolicy>,
}

/// Per-proxy token bucket.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LocalRateLimitPolicy {
    pub max_tokens: u32,

    /// Tokens added per interval; zero refills the whole bucket.
    #[serde(default)]
    pub tokens_per_fill: u32,

    pub fill_interval_ms: u64,

    /// Status returned to limited clients; zero means 429.
    #[serde(default)]
    pub response_status_code: u32,

    #[serde(default)]
    pub response_headers_to_add: BTreeMap<String, String>,
}

/// Descriptors sent to a central rate limit service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GlobalRateLimitPolicy {
    pub descriptors: Vec<RateLimitDescriptor>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitDescriptor {
    pub entries: Vec<RateLimitDescriptorEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RateLimitDescriptorEntry {
    /// A static key/value pair.
    GenericKey {
        #[serde(default)]
        key: Option<String>,
        value: String,
    },
    /// The value of a request header, reported under `key`.
    RequestHeader { header_name: String, key: String },
    /// The client address.
    RemoteAddress,
}

/// Cross-origin resource sharing policy for a virtual host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsPolicy {
    pub allow_credentials: bool,

    /// Exact origins, or `*` for any origin.
    pub allow_origin: Vec<String>,

    pub allow_methods: Vec<String>,
    pub allow_headers: Vec<String>,
    pub expose_headers: Vec<String>,
    pub max_age_secs: Option<u64>,
}
