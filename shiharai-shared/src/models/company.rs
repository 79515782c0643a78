//! Company model
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE companies (
//!     id BIGSERIAL PRIMARY KEY,
//!     name VARCHAR(255) NOT NULL,
//!     representative_name VARCHAR(255) NOT NULL,
//!     phone_number VARCHAR(32) NOT NULL,
//!     zip_code VARCHAR(16) NOT NULL,
//!     address TEXT NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Company (tenant) owning users, vendors and invoices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Company {
    pub id: i64,
    pub name: String,
    pub representative_name: String,
    pub phone_number: String,
    pub zip_code: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a company
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCompany {
    pub name: String,
    pub representative_name: String,
    pub phone_number: String,
    pub zip_code: String,
    pub address: String,
}
