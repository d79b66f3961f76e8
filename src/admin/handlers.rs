use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::AdminState;
use crate::protocol::RouteConfiguration;
use crate::xdscache::ResourceCache;

const DEFAULT_WATCH_TIMEOUT_SECS: u64 = 30;
const MAX_WATCH_TIMEOUT_SECS: u64 = 300;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub cache_version: u64,
}

#[derive(Serialize)]
pub struct RoutesResponse {
    pub version: u64,
    pub type_url: &'static str,
    pub resources: Vec<Arc<RouteConfiguration>>,
}

#[derive(Serialize)]
pub struct WatchResponse {
    pub version: u64,
    pub changed: bool,
    pub resources: Vec<Arc<RouteConfiguration>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RoutesQuery {
    /// Comma separated route configuration names.
    pub names: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WatchQuery {
    /// Version the caller already holds.
    #[serde(default)]
    pub version: u64,
    pub timeout_secs: Option<u64>,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        cache_version: state.cache.version(),
    })
}

pub async fn get_routes(
    State(state): State<AdminState>,
    Query(query): Query<RoutesQuery>,
) -> Json<RoutesResponse> {
    let names: Vec<&str> = query
        .names
        .as_deref()
        .map(|names| {
            names
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let (version, resources) = if names.is_empty() {
        state.cache.versioned_read_all()
    } else {
        state.cache.versioned_read_by_names(&names)
    };

    Json(RoutesResponse {
        version,
        type_url: state.cache.type_identifier(),
        resources,
    })
}

/// Block until the cache moves past `version` or the timeout expires,
/// then answer with the current generation.
pub async fn watch_routes(
    State(state): State<AdminState>,
    Query(query): Query<WatchQuery>,
) -> Json<WatchResponse> {
    let timeout = Duration::from_secs(
        query
            .timeout_secs
            .unwrap_or(DEFAULT_WATCH_TIMEOUT_SECS)
            .min(MAX_WATCH_TIMEOUT_SECS),
    );

    let mut rx = state.cache.subscribe();
    let changed = match tokio::time::timeout(timeout, rx.wait_for(|v| *v > query.version)).await {
        Ok(result) => result.is_ok(),
        Err(_) => false,
    };

    let (version, resources) = state.cache.versioned_read_all();
    Json(WatchResponse {
        version,
        changed,
        resources,
    })
}

#[cfg(test)]
mod tests {
    use super::super::{setup_admin_router, AdminState};
    use crate::dag::{Dag, PathMatchCondition, ProxyRoute, Route, RouteAction, VirtualHost};
    use crate::xdscache::{Observer, RouteCache};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    const KEY: &str = "test-key";

    fn dag(host: &str) -> Dag {
        let mut vh = VirtualHost::new(host);
        vh.routes.push(Route::new(
            PathMatchCondition::prefix("/"),
            RouteAction::Proxy(ProxyRoute::to("default/echo/80")),
        ));
        Dag {
            virtual_hosts: vec![vh],
            ..Default::default()
        }
    }

    fn state() -> AdminState {
        let cache = Arc::new(RouteCache::new());
        cache.on_change(&dag("foo.example.com"));
        AdminState::new(cache, KEY)
    }

    fn request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("Authorization", format!("Bearer {}", KEY))
            .body(Body::empty())
            .unwrap()
    }

    async fn json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_rejects_missing_key() {
        let app = setup_admin_router(state());
        let response = app
            .oneshot(Request::builder().uri("/admin/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_rejects_wrong_key() {
        let app = setup_admin_router(state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/admin/status")
                    .header("Authorization", "Bearer nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_status_reports_cache_version() {
        let app = setup_admin_router(state());
        let response = app.oneshot(request("/admin/status")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json(response).await;
        assert_eq!(body["status"], "operational");
        assert_eq!(body["cache_version"], 1);
    }

    #[tokio::test]
    async fn test_routes_read_all() {
        let app = setup_admin_router(state());
        let body = json(app.oneshot(request("/admin/routes")).await.unwrap()).await;

        assert_eq!(
            body["type_url"],
            "type.googleapis.com/envoy.config.route.v3.RouteConfiguration"
        );
        assert_eq!(body["version"], 1);
        let resources = body["resources"].as_array().unwrap();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0]["name"], "ingress_http");
        assert_eq!(
            resources[0]["virtual_hosts"][0]["name"],
            "foo.example.com"
        );
    }

    #[tokio::test]
    async fn test_routes_by_name_keeps_request_order() {
        let app = setup_admin_router(state());
        let body = json(
            app.oneshot(request("/admin/routes?names=https/missing,ingress_http"))
                .await
                .unwrap(),
        )
        .await;

        let resources = body["resources"].as_array().unwrap();
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0]["name"], "https/missing");
        assert!(resources[0].get("virtual_hosts").is_none());
        assert_eq!(resources[1]["name"], "ingress_http");
    }

    #[tokio::test]
    async fn test_watch_returns_immediately_when_behind() {
        let app = setup_admin_router(state());
        let body = json(
            app.oneshot(request("/admin/routes/watch?version=0&timeout_secs=5"))
                .await
                .unwrap(),
        )
        .await;

        assert_eq!(body["changed"], true);
        assert_eq!(body["version"], 1);
    }

    #[tokio::test]
    async fn test_watch_times_out_when_current() {
        let app = setup_admin_router(state());
        let body = json(
            app.oneshot(request("/admin/routes/watch?version=1&timeout_secs=0"))
                .await
                .unwrap(),
        )
        .await;

        assert_eq!(body["changed"], false);
        assert_eq!(body["version"], 1);
    }

    #[tokio::test]
    async fn test_watch_wakes_on_update() {
        let state = state();
        let cache = state.cache.clone();
        let app = setup_admin_router(state);

        let pending = tokio::spawn(async move {
            app.oneshot(request("/admin/routes/watch?version=1&timeout_secs=10"))
                .await
                .unwrap()
        });

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        cache.on_change(&dag("bar.example.com"));

        let body = json(pending.await.unwrap()).await;
        assert_eq!(body["changed"], true);
        assert_eq!(body["version"], 2);
        assert_eq!(
            body["resources"][0]["virtual_hosts"][0]["name"],
            "bar.example.com"
        );
    }
}
