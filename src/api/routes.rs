//! API route configuration.
//!
//! Caller identity is resolved by [`crate::api::middleware::auth`]; handlers
//! decide whether it is required.

use crate::api::handlers::{
    check_handler, delete_handler, history_handler, qr_handler, shorten_handler, stats_handler,
    update_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post, put},
};

/// All URL routes, mounted under `/api`.
///
/// # Endpoints
///
/// - `POST   /url/shorten`       - Create a short URL (auth optional)
/// - `GET    /url/history`       - Caller's URLs, paginated (auth required)
/// - `GET    /url/stats/{code}`  - Click statistics (owner only for owned URLs)
/// - `GET    /url/check/{code}`  - Code availability
/// - `GET    /url/qr/{code}`     - QR code PNG of the target URL
/// - `PUT    /url/{code}`        - Update an owned URL (auth required)
/// - `DELETE /url/{code}`        - Delete an owned URL (auth required)
pub fn url_routes() -> Router<AppState> {
    Router::new()
        .route("/url/shorten", post(shorten_handler))
        .route("/url/history", get(history_handler))
        .route("/url/stats/{code}", get(stats_handler))
        .route("/url/check/{code}", get(check_handler))
        .route("/url/qr/{code}", get(qr_handler))
        .route("/url/{code}", put(update_handler).delete(delete_handler))
}
