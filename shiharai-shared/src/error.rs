//! Domain error taxonomy
//!
//! Flows return [`DomainError`], a closed set of kinds the boundary layer
//! matches on structurally. Failures the domain does not recognize (a dropped
//! connection, a serialization fault in the driver) travel through
//! [`DomainError::Storage`] untouched so the boundary can map them to a
//! generic internal failure without exposing their text.

use crate::auth::jwt::TokenError;
use crate::auth::password::PasswordError;
use crate::billing::fee::CalculationError;
use crate::store::StoreError;

/// Result alias used by the flows
pub type DomainResult<T> = Result<T, DomainError>;

/// Error kinds surfaced by the auth and invoice flows
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    /// Entity missing, or present but outside the caller's tenant
    #[error("not found")]
    NotFound,

    /// Generic uniqueness conflict
    #[error("already exists")]
    AlreadyExists,

    /// Registration attempted with an email that is already taken
    #[error("email already exists")]
    EmailAlreadyExists,

    /// Unknown email, wrong password, or a token whose subject is gone
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Token malformed, wrongly signed, or signed with a foreign algorithm
    #[error("invalid token")]
    InvalidToken,

    /// Token well-formed and correctly signed but past its expiry
    #[error("expired token")]
    ExpiredToken,

    /// Reserved for the boundary layer
    #[error("unauthorized")]
    Unauthorized,

    /// Reserved; lookups across tenants report `NotFound` instead
    #[error("forbidden")]
    Forbidden,

    /// Input the core refuses to process
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Unrecognized storage failure, passed through opaquely
    #[error(transparent)]
    Storage(StoreError),

    /// Hashing, signing, or worker-pool failure
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        DomainError::Storage(err)
    }
}

impl From<TokenError> for DomainError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid => DomainError::InvalidToken,
            TokenError::Expired => DomainError::ExpiredToken,
            TokenError::Signing(msg) => DomainError::Internal(format!("token signing failed: {}", msg)),
        }
    }
}

impl From<PasswordError> for DomainError {
    fn from(err: PasswordError) -> Self {
        DomainError::Internal(err.to_string())
    }
}

impl From<CalculationError> for DomainError {
    fn from(err: CalculationError) -> Self {
        match err {
            CalculationError::NegativeAmount(amount) => {
                DomainError::InvalidInput(format!("payment amount must not be negative: {}", amount))
            }
            CalculationError::Overflow => {
                DomainError::InvalidInput("payment amount is too large".to_string())
            }
        }
    }
}

impl From<tokio::task::JoinError> for DomainError {
    fn from(err: tokio::task::JoinError) -> Self {
        DomainError::Internal(format!("blocking task failed: {}", err))
    }
}
