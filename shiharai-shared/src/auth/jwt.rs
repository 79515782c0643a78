//! JWT token generation and validation module
//!
//! This module provides the [`TokenService`], which issues and validates the
//! bearer credentials carried by every authenticated request. Tokens are
//! signed with HS256 (HMAC-SHA256) and carry the user/company identity plus
//! the validity window.
//!
//! # Security
//!
//! - **Algorithm**: HS256 for issuance; only the HMAC family is accepted on
//!   validation, so a header naming RS256 or `none` is rejected outright
//! - **Expiration**: 15 minutes for access tokens, 7 days for refresh tokens
//! - **Time**: expiry is judged against the injected [`Clock`] with zero leeway
//! - **Secret Management**: the key is handed over once at construction and
//!   never read from ambient state; it should be at least 32 bytes
//!
//! # Wire Format
//!
//! ```text
//! base64url({"typ":"JWT","alg":"HS256"})
//!   . base64url({"user_id":1,"company_id":1,"iat":..,"nbf":..,"exp":..})
//!   . base64url(HMAC-SHA256 signature)
//! ```
//!
//! # Example
//!
//! ```
//! use shiharai_shared::auth::jwt::TokenService;
//! use shiharai_shared::clock::SystemClock;
//! use std::sync::Arc;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = TokenService::new(b"your-secret-key-at-least-32-bytes", Arc::new(SystemClock));
//!
//! let (token, _expires_at) = service.generate_access_token(1, 42)?;
//! let claims = service.validate_token(&token)?;
//! assert_eq!(claims.user_id, 1);
//! assert_eq!(claims.company_id, 42);
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Duration, SubsecRound, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::clock::Clock;

/// Error type for token operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Malformed, wrongly signed, foreign algorithm, or not yet valid
    #[error("invalid token")]
    Invalid,

    /// Correctly signed but past its expiry
    #[error("expired token")]
    Expired,

    /// Failed to encode or sign a token
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Token kind, selecting the validity window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Access token (short-lived, 15 minutes)
    Access,

    /// Refresh token (long-lived, 7 days)
    Refresh,
}

impl TokenKind {
    /// Gets the validity window for this kind
    pub fn lifetime(&self) -> Duration {
        match self {
            TokenKind::Access => Duration::minutes(15),
            TokenKind::Refresh => Duration::days(7),
        }
    }

    /// Gets token kind as string
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// JWT claims structure
///
/// Serialized as a flat object. Timestamps are Unix seconds.
///
/// - `user_id`: Subject user
/// - `company_id`: Tenant the user belongs to
/// - `iat`: Issued at
/// - `nbf`: Not before (always equal to `iat`)
/// - `exp`: Expiration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject user ID
    pub user_id: i64,

    /// Tenant ID
    pub company_id: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Creates claims issued at `issued_at` and valid for `lifetime`
    ///
    /// A negative lifetime yields claims that are already expired, which is
    /// how tests exercise the expiry path.
    pub fn new(user_id: i64, company_id: i64, issued_at: DateTime<Utc>, lifetime: Duration) -> Self {
        let expiration = issued_at + lifetime;

        Self {
            user_id,
            company_id,
            iat: issued_at.timestamp(),
            nbf: issued_at.timestamp(),
            exp: expiration.timestamp(),
        }
    }

    /// Gets the expiry as an instant
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Gets the issuance as an instant
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }

    /// Checks whether the claims have expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

/// Access/refresh tokens minted from one issuance instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    /// Short-lived bearer token
    pub access_token: String,

    /// When the access token stops validating
    pub access_expires_at: DateTime<Utc>,

    /// Long-lived token used to mint a new pair
    pub refresh_token: String,

    /// When the refresh token stops validating
    pub refresh_expires_at: DateTime<Utc>,
}

/// Issues and validates signed, expiring claims
///
/// The service is immutable after construction and cheap to share behind an
/// `Arc`.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService").finish_non_exhaustive()
    }
}

impl TokenService {
    /// Creates a token service
    ///
    /// # Arguments
    ///
    /// * `secret` - Symmetric signing key (should be at least 32 bytes)
    /// * `clock` - Time source for issuance and expiry checks
    pub fn new(secret: &[u8], clock: Arc<dyn Clock>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            clock,
        }
    }

    /// Generates an access token valid for 15 minutes
    ///
    /// # Returns
    ///
    /// The compact token and its absolute expiry
    pub fn generate_access_token(
        &self,
        user_id: i64,
        company_id: i64,
    ) -> Result<(String, DateTime<Utc>), TokenError> {
        self.generate_at(self.snapshot(), user_id, company_id, TokenKind::Access)
    }

    /// Generates a refresh token valid for 7 days
    pub fn generate_refresh_token(
        &self,
        user_id: i64,
        company_id: i64,
    ) -> Result<(String, DateTime<Utc>), TokenError> {
        self.generate_at(self.snapshot(), user_id, company_id, TokenKind::Refresh)
    }

    /// Issues an access/refresh pair from a single reading of the clock
    ///
    /// Both expiries are computed from the same instant, so
    /// `refresh_expires_at - access_expires_at` is always exactly
    /// 7 days minus 15 minutes.
    pub fn issue_pair(&self, user_id: i64, company_id: i64) -> Result<TokenPair, TokenError> {
        let now = self.snapshot();

        let (access_token, access_expires_at) =
            self.generate_at(now, user_id, company_id, TokenKind::Access)?;
        let (refresh_token, refresh_expires_at) =
            self.generate_at(now, user_id, company_id, TokenKind::Refresh)?;

        Ok(TokenPair {
            access_token,
            access_expires_at,
            refresh_token,
            refresh_expires_at,
        })
    }

    /// Signs arbitrary claims with HS256
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if encoding fails
    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        let header = Header::new(Algorithm::HS256);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(format!("Token encoding failed: {}", e)))
    }

    /// Validates a token and extracts claims
    ///
    /// Verifies, in order:
    /// - The header algorithm is HS256, HS384 or HS512
    /// - The signature matches this service's key
    /// - The token is not past `exp` (per the injected clock)
    /// - The token is not before `nbf`
    ///
    /// # Errors
    ///
    /// - `TokenError::Expired` if the signature is valid but `exp` has passed
    /// - `TokenError::Invalid` for every other failure
    pub fn validate_token(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.set_required_spec_claims(&["exp", "nbf"]);
        // Time checks run below against the injected clock.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            tracing::debug!(error = %e, "Token rejected");
            TokenError::Invalid
        })?;

        let claims = token_data.claims;
        let now = self.clock.now();

        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }

        if now.timestamp() < claims.nbf {
            return Err(TokenError::Invalid);
        }

        Ok(claims)
    }

    fn generate_at(
        &self,
        now: DateTime<Utc>,
        user_id: i64,
        company_id: i64,
        kind: TokenKind,
    ) -> Result<(String, DateTime<Utc>), TokenError> {
        let claims = Claims::new(user_id, company_id, now, kind.lifetime());
        let token = self.sign(&claims)?;

        Ok((token, now + kind.lifetime()))
    }

    /// Reads the clock once, truncated to the second precision tokens carry
    fn snapshot(&self) -> DateTime<Utc> {
        self.clock.now().trunc_subsecs(0)
    }
}
