//! Bearer token identity middleware and extractors.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_auth::AuthBearer;
use serde_json::json;

use crate::application::services::AuthUser;
use crate::{error::AppError, state::AppState};

/// Resolves the caller identity from the `Authorization` header.
///
/// # Header Format
///
/// ```text
/// Authorization: Bearer <token>
/// ```
///
/// Never rejects a request. A missing, malformed or invalid token makes the
/// caller anonymous; handlers that need an identity use [`RequireUser`].
///
/// # Example
///
/// ```rust,ignore
/// let api = Router::new()
///     .route("/url/history", get(history_handler))
///     .layer(middleware::from_fn_with_state(state.clone(), auth::layer));
/// ```
pub async fn layer(State(st): State<AppState>, req: Request, next: Next) -> Response {
    let (mut parts, body) = req.into_parts();

    let user = match AuthBearer::from_request_parts(&mut parts, &()).await {
        Ok(AuthBearer(token)) => st.auth_service.identify(&token),
        Err(_) => None,
    };

    if let Some(user) = &user {
        tracing::debug!(user_id = %user.id, "Authenticated request");
    }

    parts.extensions.insert(CurrentUser(user));

    next.run(Request::from_parts(parts, body)).await
}

/// Optional caller identity set by [`layer`].
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<AuthUser>);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .unwrap_or_default())
    }
}

/// Caller identity, rejecting anonymous requests with 401.
#[derive(Debug, Clone)]
pub struct RequireUser(pub AuthUser);

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        user.map(RequireUser).ok_or_else(|| {
            AppError::unauthorized(
                "Authentication required",
                json!({"reason": "Authorization header is missing or invalid"}),
            )
        })
    }
}
