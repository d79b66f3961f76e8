//! Deterministic orderings for routes and route resources.
//!
//! # Responsibilities
//! - Order graph routes from most to least specific match
//! - Order header match conditions by header name
//! - Order virtual hosts and route configurations by name
//!
//! # Design Decisions
//! - Comparators work on graph types, not protocol types, so the order
//!   stays correct however a match kind ends up encoded for the proxy
//! - Callers sort with a stable sort; equal elements keep graph order
//! - Prefixes compare by length first (longest wins), then lexically

use std::cmp::Ordering;

use crate::dag::{HeaderMatchCondition, PathMatchCondition, Route};
use crate::protocol::{RouteConfiguration, VirtualHost};

/// Order two routes by match specificity.
///
/// Path kind first (`exact < prefix < regex`), then path value, then
/// number of header conditions (more first), then header names pairwise.
/// Header lists are expected to already be sorted with
/// [`compare_header_match_conditions`].
pub fn compare_routes(a: &Route, b: &Route) -> Ordering {
    compare_path_match(&a.path_match_condition, &b.path_match_condition)
        .then_with(|| {
            b.header_match_conditions
                .len()
                .cmp(&a.header_match_conditions.len())
        })
        .then_with(|| {
            a.header_match_conditions
                .iter()
                .zip(&b.header_match_conditions)
                .map(|(x, y)| compare_header_match_conditions(x, y))
                .find(|ord| ord.is_ne())
                .unwrap_or(Ordering::Equal)
        })
}

fn compare_path_match(a: &PathMatchCondition, b: &PathMatchCondition) -> Ordering {
    use PathMatchCondition::*;

    match (a, b) {
        (Exact { path: x }, Exact { path: y }) => x.cmp(y),
        (Prefix { prefix: x, .. }, Prefix { prefix: y, .. }) => {
            y.len().cmp(&x.len()).then_with(|| x.cmp(y))
        }
        (Regex { regex: x }, Regex { regex: y }) => x.cmp(y),
        _ => path_rank(a).cmp(&path_rank(b)),
    }
}

fn path_rank(condition: &PathMatchCondition) -> u8 {
    match condition {
        PathMatchCondition::Exact { .. } => 0,
        PathMatchCondition::Prefix { .. } => 1,
        PathMatchCondition::Regex { .. } => 2,
    }
}

/// Order header match conditions by header name.
pub fn compare_header_match_conditions(a: &HeaderMatchCondition, b: &HeaderMatchCondition) -> Ordering {
    a.name.cmp(&b.name)
}

pub fn compare_virtual_hosts(a: &VirtualHost, b: &VirtualHost) -> Ordering {
    a.name.cmp(&b.name)
}

pub fn compare_route_configurations(a: &RouteConfiguration, b: &RouteConfiguration) -> Ordering {
    a.name.cmp(&b.name)
}
