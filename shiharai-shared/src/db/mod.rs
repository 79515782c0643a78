//! Database layer
//!
//! - `pool`: PostgreSQL connection pool with health checks
//! - `migrations`: Embedded schema migrations from `migrations/`
//!
//! Queries live in [`crate::store::postgres`].
//!
//! # Example
//!
//! ```no_run
//! use shiharai_shared::db::pool::{create_pool, DatabaseConfig};
//! use shiharai_shared::db::migrations::run_migrations;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(DatabaseConfig {
//!         url: std::env::var("DATABASE_URL")?,
//!         ..Default::default()
//!     })
//!     .await?;
//!
//!     run_migrations(&pool).await?;
//!     Ok(())
//! }
//! ```

pub mod migrations;
pub mod pool;
