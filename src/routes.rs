//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /{code}`        - Short link redirect
//! - `GET  /health`        - Liveness
//! - `GET  /health/ready`  - Readiness: store, click queue, cache
//! - `/api/url/*`          - REST API (bearer identity optional per route)
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-IP token bucket on `/api`
//! - **Identity** - Bearer JWT resolved once per API request
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::{health_handler, ready_handler, redirect_handler};
use crate::api::middleware::{auth, rate_limit, tracing};
use crate::state::AppState;
use axum::routing::get;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the production router with all routes and middleware.
///
/// # Arguments
///
/// - `state` - shared application state injected into all handlers
/// - `behind_proxy` - when `true`, rate limiting reads the client IP from
///   proxy headers instead of the peer socket address; enable only when the
///   service runs behind a trusted reverse proxy
pub fn app_router(state: AppState, behind_proxy: bool) -> NormalizePath<Router> {
    let router = compose(state, |api| rate_limit::apply(api, behind_proxy));
    NormalizePathLayer::trim_trailing_slash().layer(router)
}

/// Router with every route and middleware except rate limiting.
///
/// Used by in-process HTTP tests, which have no peer socket for the limiter
/// to key on.
pub fn build_router(state: AppState) -> Router {
    compose(state, |api| api)
}

fn compose(
    state: AppState,
    limit: impl FnOnce(Router<AppState>) -> Router<AppState>,
) -> Router {
    let api_router = api::routes::url_routes()
        .layer(middleware::from_fn_with_state(state.clone(), auth::layer));

    Router::new()
        .route("/{code}", get(redirect_handler))
        .route("/health", get(health_handler))
        .route("/health/ready", get(ready_handler))
        .nest("/api", limit(api_router))
        .with_state(state)
        .layer(tracing::layer())
}
