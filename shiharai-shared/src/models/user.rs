//! User model
//!
//! Every user belongs to exactly one company. Email addresses are unique
//! across all companies.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE users (
//!     id BIGSERIAL PRIMARY KEY,
//!     company_id BIGINT NOT NULL REFERENCES companies(id),
//!     name VARCHAR(255) NOT NULL,
//!     email VARCHAR(255) NOT NULL,
//!     password_hash VARCHAR(255) NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     CONSTRAINT users_email_key UNIQUE (email)
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name of the unique constraint on `users.email`
pub const EMAIL_UNIQUE_CONSTRAINT: &str = "users_email_key";

/// User account
///
/// Passwords are stored as Argon2id hashes, never in plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: i64,

    /// Company the user belongs to
    pub company_id: i64,

    /// Display name
    pub name: String,

    /// Email address, unique system-wide
    pub email: String,

    /// Argon2id password hash (PHC string)
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// When the user account was created
    pub created_at: DateTime<Utc>,

    /// When the user account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Company the user joins
    pub company_id: i64,

    /// Display name
    pub name: String,

    /// Email address
    pub email: String,

    /// Password hash (NOT the plaintext password)
    pub password_hash: String,
}
