//! Route discovery resources.
//!
//! # Responsibilities
//! - Define the route resources served to the proxy fleet
//! - Provide constructors that translate graph pieces into resources
//! - Keep every resource serializable for debugging and dumps
//!
//! # Design Decisions
//! - Resources are plain data, built once per rebuild and never mutated
//!   after they are installed in the cache
//! - Per-filter overrides are absent by default and assembled through
//!   [`filters::FilterOverrides`]
//! - Ordered maps only, so two builds of the same graph serialize to the
//!   same bytes

pub mod filters;
pub mod route;

pub use filters::{
    CorsPolicy, ExtAuthzPerRoute, FilterConfig, FilterOverrides, LocalRateLimit, RateLimit,
    RateLimitAction, StringMatcher, EXT_AUTHZ_FILTER, LOCAL_RATE_LIMIT_FILTER,
};
pub use route::{
    Action, ClusterSpecifier, ClusterWeight, DirectResponseAction, HeaderMatchSpecifier,
    HeaderMatcher, HeaderValue, HeaderValueOption, PathSpecifier, RedirectAction, Route,
    RouteAction, RouteConfiguration, RouteMatch, VirtualHost,
};

/// Resource type served by the route cache.
pub const ROUTE_TYPE: &str = "type.googleapis.com/envoy.config.route.v3.RouteConfiguration";

/// Render milliseconds the way the discovery protocol spells durations.
pub(crate) fn duration(ms: u64) -> String {
    if ms % 1000 == 0 {
        format!("{}s", ms / 1000)
    } else {
        format!("{}.{:03}s", ms / 1000, ms % 1000)
    }
}
