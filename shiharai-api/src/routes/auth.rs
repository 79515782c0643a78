//! Authentication endpoints
//!
//! - `POST /api/auth/register` - Register a user under an existing company
//! - `POST /api/auth/login` - Exchange credentials for tokens
//! - `POST /api/auth/refresh` - Exchange a refresh token for a new pair
//!
//! All three answer with the OAuth 2.0 token shape, [`TokenResponse`].

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use shiharai_shared::{
    auth::jwt::TokenPair,
    flows::{LoginInput, RegisterInput},
};
use std::fmt;
use validator::Validate;

/// Register request
#[derive(Deserialize, Validate)]
pub struct RegisterRequest {
    /// Company the user joins
    #[validate(range(min = 1, message = "company_id must be positive"))]
    pub company_id: i64,

    /// Display name
    #[validate(length(min = 1, max = 255, message = "Name must be 1 to 255 characters"))]
    pub name: String,

    /// Email address
    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: String,

    /// Password
    #[validate(length(min = 8, max = 72, message = "Password must be 8 to 72 characters"))]
    pub password: String,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("company_id", &self.company_id)
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Login request
#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Refresh token request
#[derive(Deserialize, Validate)]
pub struct RefreshRequest {
    /// Refresh token
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Token response
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Access token (15 minutes)
    pub access_token: String,

    /// Always `Bearer`
    pub token_type: String,

    /// Seconds until the access token expires
    pub expires_in: i64,

    /// Refresh token (7 days)
    pub refresh_token: String,
}

impl TokenResponse {
    fn from_pair(state: &AppState, pair: TokenPair) -> Self {
        let expires_in = (pair.access_expires_at - state.clock.now())
            .num_seconds()
            .max(0);

        Self {
            access_token: pair.access_token,
            token_type: "Bearer".to_string(),
            expires_in,
            refresh_token: pair.refresh_token,
        }
    }
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/register
/// Content-Type: application/json
///
/// {
///   "company_id": 1,
///   "name": "Yamada Taro",
///   "email": "taro@example.com",
///   "password": "SecureP@ss123"
/// }
/// ```
///
/// # Response
///
/// `201 Created`
///
/// ```json
/// {
///   "access_token": "eyJ...",
///   "token_type": "Bearer",
///   "expires_in": 900,
///   "refresh_token": "eyJ..."
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Malformed body or unknown company
/// - `409 Conflict`: Email already exists
/// - `422 Unprocessable Entity`: Validation failed
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TokenResponse>)> {
    let Json(req) = payload?;
    req.validate()?;

    let pair = state
        .auth
        .register(RegisterInput {
            company_id: req.company_id,
            name: req.name,
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(TokenResponse::from_pair(&state, pair))))
}

/// Login endpoint
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/login
/// Content-Type: application/json
///
/// {
///   "email": "taro@example.com",
///   "password": "SecureP@ss123"
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown email or wrong password (indistinguishable)
/// - `422 Unprocessable Entity`: Validation failed
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<TokenResponse>> {
    let Json(req) = payload?;
    req.validate()?;

    let pair = state
        .auth
        .login(LoginInput {
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok(Json(TokenResponse::from_pair(&state, pair)))
}

/// Refresh endpoint
///
/// Issues a new pair for the token's user. The presented refresh token stays
/// valid until its own expiry.
///
/// # Errors
///
/// - `401 Unauthorized`: Token invalid, expired, or its user no longer exists
pub async fn refresh(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> ApiResult<Json<TokenResponse>> {
    let Json(req) = payload?;
    req.validate()?;

    let pair = state.auth.refresh_token(&req.refresh_token).await?;

    Ok(Json(TokenResponse::from_pair(&state, pair)))
}
