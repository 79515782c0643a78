//! Authentication primitives
//!
//! # Modules
//!
//! - [`password`]: Argon2id password hashing behind the `PasswordHasher` trait
//! - [`jwt`]: Access/refresh token issuance and validation
//!
//! # Example
//!
//! ```
//! use shiharai_shared::auth::jwt::TokenService;
//! use shiharai_shared::clock::SystemClock;
//! use std::sync::Arc;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let tokens = TokenService::new(b"secret-key-that-is-at-least-32-bytes", Arc::new(SystemClock));
//! let pair = tokens.issue_pair(1, 1)?;
//! assert!(pair.refresh_expires_at > pair.access_expires_at);
//! # Ok(())
//! # }
//! ```

pub mod jwt;
pub mod password;
