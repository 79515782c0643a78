//! API route handlers
//!
//! - `health`: Health check endpoint
//! - `auth`: Authentication endpoints (register, login, refresh)
//! - `invoices`: Tenant-scoped invoice endpoints

pub mod auth;
pub mod health;
pub mod invoices;
