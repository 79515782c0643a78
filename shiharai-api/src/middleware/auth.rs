//! Bearer token authentication
//!
//! [`require_bearer`] validates the `Authorization: Bearer <token>` header
//! through the auth flow and injects an [`AuthContext`] into the request
//! extensions. Handlers behind it read the caller's tenant from there.

use crate::{app::AppState, error::ApiError};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::debug;

/// Authenticated caller, as carried by the access token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    /// Authenticated user
    pub user_id: i64,

    /// Tenant every request is scoped to
    pub company_id: i64,
}

/// Extracts the raw token from an `Authorization` header
///
/// The scheme is matched case-insensitively. Returns `None` when the header
/// is absent, not ASCII, uses another scheme, or carries an empty token.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Rejects requests without a valid access token
pub async fn require_bearer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers()).ok_or_else(|| {
        ApiError::Unauthorized("Missing or malformed authorization header".to_string())
    })?;

    let claims = state.auth.validate(token).await.map_err(|e| {
        debug!(error = %e, "Rejected bearer token");
        ApiError::from(e)
    })?;

    req.extensions_mut().insert(AuthContext {
        user_id: claims.user_id,
        company_id: claims.company_id,
    });

    Ok(next.run(req).await)
}
