//! # Shiharai Shared Library
//!
//! This crate contains the domain core shared by the Shiharai API server:
//! credential tokens, password hashing, the invoice fee engine, and the
//! flows that orchestrate them over pluggable storage.
//!
//! ## Module Organization
//!
//! - `clock`: Injectable source of the current instant
//! - `auth`: Token service and password hashing
//! - `billing`: Deterministic fee/tax calculation
//! - `models`: Persisted entities (company, user, vendor, invoice)
//! - `store`: Storage traits with PostgreSQL and in-memory backends
//! - `flows`: Registration/login/refresh and invoice orchestration
//! - `db`: Connection pool and migrations
//! - `error`: Domain error taxonomy

pub mod auth;
pub mod billing;
pub mod clock;
pub mod db;
pub mod error;
pub mod flows;
pub mod models;
pub mod store;

/// Current version of the Shiharai shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
