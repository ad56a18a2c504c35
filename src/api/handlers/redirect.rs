//! Handler for short URL redirect.

use axum::{
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;
use std::net::SocketAddr;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use crate::domain::click_event::ClickEvent;
use crate::error::AppError;
use crate::infrastructure::cache::entry_ttl;
use crate::state::AppState;
use crate::utils::request_info::{client_ip, header_str};

/// Redirects a short code to its original URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Request Flow
///
/// 1. Check the cache for the code
/// 2. On miss, resolve against the store (active, not expired)
/// 3. Spawn a cache fill whose TTL never outlives the URL; the fill is
///    dropped if an update or delete invalidated codes meanwhile
/// 4. Queue a click event for the background worker
/// 5. Return `302 Found`
///
/// # Click Tracking
///
/// Click events go to a bounded channel. When the queue is full or closed
/// the click is dropped and logged; the redirect never waits on analytics.
///
/// # Errors
///
/// Returns 404 Not Found if the code is unknown, expired or deactivated.
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Result<impl IntoResponse, AppError> {
    let original_url = match state.cache.get_url(&code).await {
        Some(url) => {
            debug!(%code, "Cache HIT");
            url
        }
        None => {
            debug!(%code, "Cache MISS");

            let epoch = state.cache_epoch();
            let target = state
                .shortener
                .resolve_target(&code)
                .await?
                .ok_or_else(|| AppError::not_found("Short URL not found", json!({ "code": code })))?;

            if let Some(ttl) = entry_ttl(state.cache_ttl, target.expires_at, Utc::now()) {
                let fill_state = state.clone();
                let key = code.clone();
                let url = target.original_url.clone();
                tokio::spawn(async move {
                    fill_state.fill_cache(epoch, &key, &url, ttl).await;
                });
            }

            target.original_url
        }
    };

    let location = HeaderValue::try_from(original_url.as_str()).map_err(|e| {
        AppError::internal(
            "Stored URL is not a valid Location header",
            json!({ "reason": e.to_string() }),
        )
    })?;

    let event = ClickEvent::new(
        code,
        client_ip(&headers, addr, state.behind_proxy),
        header_str(&headers, &header::USER_AGENT),
        header_str(&headers, &header::REFERER),
    );

    match state.click_tx.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(event)) => {
            warn!(code = %event.code, "Click queue full, dropping click");
        }
        Err(TrySendError::Closed(event)) => {
            warn!(code = %event.code, "Click queue closed, dropping click");
        }
    }

    Ok((StatusCode::FOUND, [(header::LOCATION, location)]))
}
