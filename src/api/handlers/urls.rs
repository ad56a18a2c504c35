//! Handlers for history, statistics, availability and management of
//! shortened URLs.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::HeaderMap,
};
use serde_json::json;

use crate::api::dto::history::{HistoryQuery, HistoryResponse};
use crate::api::dto::shorten::ShortenResponse;
use crate::api::dto::stats::{AvailabilityResponse, StatsResponse};
use crate::api::dto::update_url::{MessageResponse, UpdateUrlRequest};
use crate::api::middleware::{CurrentUser, RequireUser};
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::request_info::public_base_url;

/// Lists the caller's URLs, newest first.
///
/// # Endpoint
///
/// `GET /api/url/history?page=1&pageSize=20`
///
/// Totals cover all of the caller's URLs, not just the returned page.
///
/// # Errors
///
/// - 400 for a page below 1 or a page size outside 1..=100
/// - 401 without authentication
pub async fn history_handler(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    headers: HeaderMap,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, AppError> {
    let base_url = public_base_url(&headers, state.base_url.as_deref(), state.behind_proxy)?;
    let (page, page_size) = query.resolved();

    let history = state
        .shortener
        .list_history(&user.id, page, page_size)
        .await?;

    Ok(Json(HistoryResponse::new(history, &base_url)))
}

/// Returns click statistics of a shortened URL.
///
/// # Endpoint
///
/// `GET /api/url/stats/{code}`
///
/// Statistics of anonymous URLs are public; owned URLs are visible to their
/// owner only.
///
/// # Errors
///
/// - 401 if the URL belongs to someone else
/// - 404 if the code is unknown or deactivated
pub async fn stats_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(code): Path<String>,
) -> Result<Json<StatsResponse>, AppError> {
    let stats = state
        .shortener
        .get_statistics(&code, user.as_ref().map(|u| u.id.as_str()))
        .await?;

    Ok(Json(stats.into()))
}

/// Reports whether a code is still free.
///
/// # Endpoint
///
/// `GET /api/url/check/{code}`
pub async fn check_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let available = state.shortener.check_availability(&code).await?;

    Ok(Json(AvailabilityResponse { code, available }))
}

/// Deletes an owned URL together with its click history.
///
/// # Endpoint
///
/// `DELETE /api/url/{code}`
///
/// # Errors
///
/// - 401 without authentication
/// - 404 if the code is unknown or owned by someone else
pub async fn delete_handler(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(code): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    if !state.shortener.delete(&code, &user.id).await? {
        return Err(not_found(&code));
    }

    state.invalidate_cached(&code).await;
    tracing::info!(%code, user_id = %user.id, "Deleted URL");

    Ok(Json(MessageResponse::new("URL deleted successfully")))
}

/// Updates the target and/or the code of an owned URL.
///
/// # Endpoint
///
/// `PUT /api/url/{code}`
///
/// # Request Body
///
/// ```json
/// {
///   "originalUrl": "https://example.com/new",
///   "newCustomCode": "renamed",
///   "generateRandom": false
/// }
/// ```
///
/// # Errors
///
/// - 400 for a malformed URL or custom code
/// - 401 without authentication
/// - 404 if the code is unknown or owned by someone else
/// - 409 if the new custom code is taken
pub async fn update_handler(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(code): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<UpdateUrlRequest>,
) -> Result<Json<ShortenResponse>, AppError> {
    let base_url = public_base_url(&headers, state.base_url.as_deref(), state.behind_proxy)?;

    let updated = state
        .shortener
        .update(&code, &user.id, payload.into())
        .await?
        .ok_or_else(|| not_found(&code))?;

    state.invalidate_cached(&code).await;
    if updated.short_code != code {
        state.invalidate_cached(&updated.short_code).await;
    }

    tracing::info!(%code, new_code = %updated.short_code, user_id = %user.id, "Updated URL");

    Ok(Json(ShortenResponse::new(&updated, &base_url)))
}

fn not_found(code: &str) -> AppError {
    AppError::not_found("Short URL not found", json!({ "code": code }))
}
