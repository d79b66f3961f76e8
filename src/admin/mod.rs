//! Admin HTTP surface.
//!
//! # Endpoints
//! - `GET /admin/status`: build and cache version
//! - `GET /admin/routes[?names=a,b]`: current route configurations
//! - `GET /admin/routes/watch?version=N`: long poll for a newer generation
//!
//! Every endpoint requires `Authorization: Bearer <api_key>`.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::xdscache::RouteCache;

/// Shared state for admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub cache: Arc<RouteCache>,
    pub api_key: Arc<str>,
}

impl AdminState {
    pub fn new(cache: Arc<RouteCache>, api_key: &str) -> Self {
        Self {
            cache,
            api_key: Arc::from(api_key),
        }
    }
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/routes", get(get_routes))
        .route("/admin/routes/watch", get(watch_routes))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    admin_auth_middleware,
                )),
        )
        .with_state(state)
}

/// Serve the admin router until the shutdown signal fires.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "Admin server starting");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;

    tracing::info!("Admin server stopped");
    Ok(())
}
