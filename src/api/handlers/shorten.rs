//! Handler for the URL shortening endpoint.

use axum::{
    Json,
    extract::State,
    http::HeaderMap,
};
use validator::Validate;

use crate::api::dto::shorten::{ShortenRequest, ShortenResponse};
use crate::api::middleware::CurrentUser;
use crate::application::services::ShortenCommand;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::request_info::public_base_url;

/// Creates a shortened URL.
///
/// # Endpoint
///
/// `POST /api/url/shorten`
///
/// # Request Body
///
/// ```json
/// {
///   "originalUrl": "https://example.com/some/long/path",
///   "customCode": "my-link",
///   "expiresInDays": 30
/// }
/// ```
///
/// `customCode` requires a bearer token; `expiresInDays` is optional.
///
/// # Errors
///
/// - 400 for a malformed URL, custom code or expiry
/// - 401 for a custom code without authentication
/// - 409 if the custom code is taken
pub async fn shorten_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    headers: HeaderMap,
    Json(payload): Json<ShortenRequest>,
) -> Result<Json<ShortenResponse>, AppError> {
    payload.validate()?;

    let base_url = public_base_url(&headers, state.base_url.as_deref(), state.behind_proxy)?;

    let url = state
        .shortener
        .shorten(ShortenCommand {
            url: payload.original_url,
            owner_id: user.map(|u| u.id),
            custom_code: payload.custom_code,
            expires_in_days: payload.expires_in_days,
        })
        .await?;

    tracing::info!(code = %url.short_code, custom = url.is_custom, "Shortened URL");

    Ok(Json(ShortenResponse::new(&url, &base_url)))
}
