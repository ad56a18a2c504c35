//! Handlers for liveness and readiness probes.

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse, ReadinessResponse};
use crate::state::AppState;

/// Click queue usage above which readiness reports the queue as degraded.
const QUEUE_DEGRADED_PERCENT: u8 = 80;

/// Liveness probe.
///
/// # Endpoint
///
/// `GET /health`
///
/// Always answers 200 while the process serves requests.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

/// Readiness probe with component checks.
///
/// # Endpoint
///
/// `GET /health/ready`
///
/// # Response Codes
///
/// - **200 OK**: store reachable; queue or cache may be degraded
/// - **503 Service Unavailable**: store unreachable or click queue closed
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "timestamp": "2025-11-18T10:00:00Z",
///   "checks": {
///     "database": { "status": "healthy" },
///     "clickQueue": { "status": "healthy", "message": "3% used" },
///     "cache": { "status": "healthy", "message": "redis" }
///   }
/// }
/// ```
pub async fn ready_handler(
    State(state): State<AppState>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let checks = HealthChecks {
        database: check_database(&state).await,
        click_queue: check_click_queue(&state),
        cache: check_cache(&state).await,
    };

    let unhealthy = checks.database.is_unhealthy() || checks.click_queue.is_unhealthy();
    let degraded = checks.click_queue.status != "healthy" || checks.cache.status != "healthy";

    let (status, code) = if unhealthy {
        ("unhealthy", StatusCode::SERVICE_UNAVAILABLE)
    } else if degraded {
        ("degraded", StatusCode::OK)
    } else {
        ("healthy", StatusCode::OK)
    };

    (
        code,
        Json(ReadinessResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            checks,
        }),
    )
}

async fn check_database(state: &AppState) -> CheckStatus {
    match state.store.ping().await {
        Ok(()) => CheckStatus::healthy(),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness: store unreachable");
            CheckStatus::unhealthy("Store unreachable")
        }
    }
}

fn check_click_queue(state: &AppState) -> CheckStatus {
    if state.click_tx.is_closed() {
        return CheckStatus::unhealthy("Click queue is closed");
    }

    let usage = state.click_queue_usage_percent();
    if usage >= QUEUE_DEGRADED_PERCENT {
        CheckStatus::degraded(format!("{usage}% used"))
    } else {
        CheckStatus {
            status: "healthy".to_string(),
            message: Some(format!("{usage}% used")),
        }
    }
}

async fn check_cache(state: &AppState) -> CheckStatus {
    let backend = state.cache.backend();

    if state.cache.health_check().await {
        CheckStatus {
            status: "healthy".to_string(),
            message: Some(backend.to_string()),
        }
    } else {
        CheckStatus::degraded(format!("{backend} unreachable, serving from store"))
    }
}
