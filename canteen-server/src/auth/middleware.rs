//! Request authentication middleware

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use shared::error::AppError;

use crate::state::AppState;

/// Middleware that extracts and verifies the bearer token from the
/// Authorization header and inserts a [`crate::auth::CurrentUser`] into
/// request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::not_authenticated().into_response())?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::not_authenticated().into_response())?;

    let user = state.jwt.validate_token(token).map_err(|e| {
        tracing::debug!("Token validation failed: {}", e.message);
        e.into_response()
    })?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
