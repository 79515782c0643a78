//! Configuration management for the API server
//!
//! Loaded once from environment variables (and a `.env` file in development)
//! and immutable afterwards.
//!
//! # Environment Variables
//!
//! - `API_HOST`: Host to bind to (default: 0.0.0.0)
//! - `API_PORT`: Port to bind to (default: 8080)
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `DATABASE_MAX_CONNECTIONS`: Pool ceiling (default: 25)
//! - `DATABASE_MIN_CONNECTIONS`: Warm connections (default: 5)
//! - `JWT_SECRET`: Token signing key, at least 32 characters (required)
//! - `FEE_RATE`: Invoice fee rate (default: 0.04)
//! - `TAX_RATE`: Consumption tax rate on the fee (default: 0.10)
//! - `REQUEST_TIMEOUT_SECS`: Per-request timeout (default: 30)
//! - `CORS_ORIGINS`: Comma-separated origins, `*` for any (default: `*`)
//!
//! # Example
//!
//! ```no_run
//! use shiharai_api::config::Config;
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! println!("Server will listen on {}", config.bind_address());
//! # Ok(())
//! # }
//! ```

use anyhow::Context;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;

/// Minimum accepted length of `JWT_SECRET`
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Decimal places a rate may carry; invoice rate columns are `NUMERIC(5,4)`
pub const MAX_RATE_SCALE: u32 = 4;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Invoice rate configuration
    pub billing: BillingConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins (`*` allows any)
    pub cors_origins: Vec<String>,

    /// Requests running longer than this are aborted
    pub request_timeout_secs: u64,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,

    /// Minimum number of idle connections
    pub min_connections: u32,
}

/// JWT configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig").field("secret", &"[redacted]").finish()
    }
}

/// Rates applied to new invoices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingConfig {
    /// Fee rate, within `[0, 1]`
    pub fee_rate: Decimal,

    /// Tax rate applied to the fee, within `[0, 1]`
    pub tax_rate: Decimal,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or any value
    /// fails to parse or is out of range
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = get("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = parse_or(&get, "API_PORT", 8080)?;

        let database_url = get("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;
        let max_connections: u32 = parse_or(&get, "DATABASE_MAX_CONNECTIONS", 25)?;
        let min_connections: u32 = parse_or(&get, "DATABASE_MIN_CONNECTIONS", 5)?;

        if min_connections > max_connections {
            anyhow::bail!("DATABASE_MIN_CONNECTIONS must not exceed DATABASE_MAX_CONNECTIONS");
        }

        let jwt_secret = get("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            anyhow::bail!("JWT_SECRET must be at least {} characters long", MIN_JWT_SECRET_LEN);
        }

        let fee_rate = parse_rate(&get, "FEE_RATE", Decimal::new(4, 2))?;
        let tax_rate = parse_rate(&get, "TAX_RATE", Decimal::new(10, 2))?;

        let request_timeout_secs: u64 = parse_or(&get, "REQUEST_TIMEOUT_SECS", 30)?;
        if request_timeout_secs == 0 {
            anyhow::bail!("REQUEST_TIMEOUT_SECS must be greater than zero");
        }

        let cors_origins = get("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
                request_timeout_secs,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
                min_connections,
            },
            jwt: JwtConfig { secret: jwt_secret },
            billing: BillingConfig { fee_rate, tax_rate },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Whether any origin is allowed
    pub fn allows_any_origin(&self) -> bool {
        self.api.cors_origins.iter().any(|origin| origin == "*")
    }
}

fn parse_or<F, T>(get: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{} has an invalid value: {}", key, raw)),
        None => Ok(default),
    }
}

fn parse_rate<F>(get: &F, key: &str, default: Decimal) -> anyhow::Result<Decimal>
where
    F: Fn(&str) -> Option<String>,
{
    let rate: Decimal = parse_or(get, key, default)?;

    if rate < Decimal::ZERO || rate > Decimal::ONE {
        anyhow::bail!("{} must be between 0 and 1, got {}", key, rate);
    }

    if rate.normalize().scale() > MAX_RATE_SCALE {
        anyhow::bail!(
            "{} must have at most {} decimal places, got {}",
            key,
            MAX_RATE_SCALE,
            rate
        );
    }

    Ok(rate)
}
