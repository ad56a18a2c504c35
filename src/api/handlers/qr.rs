//! Handler for QR code images.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
};
use serde_json::json;

use crate::api::dto::qr::QrQuery;
use crate::application::services::qr_service::DEFAULT_MODULE_SIZE;
use crate::error::AppError;
use crate::state::AppState;

/// Renders a PNG QR code of the URL a code redirects to.
///
/// # Endpoint
///
/// `GET /api/url/qr/{code}?size=10`
///
/// `size` is the number of pixels per module.
///
/// # Errors
///
/// - 400 if `size` is out of range
/// - 404 if the code is unknown, expired or deactivated
pub async fn qr_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<QrQuery>,
) -> Result<impl IntoResponse, AppError> {
    let original_url = state
        .shortener
        .resolve(&code)
        .await?
        .ok_or_else(|| AppError::not_found("Short URL not found", json!({ "code": code })))?;

    let png = state
        .qr_service
        .render_png(&original_url, query.size.unwrap_or(DEFAULT_MODULE_SIZE))?;

    Ok((
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        png,
    ))
}
