//! Health check endpoint
//!
//! ```text
//! GET /health
//! ```
//!
//! ```json
//! {
//!   "status": "healthy",
//!   "version": "0.1.0",
//!   "database": "connected"
//! }
//! ```

use crate::app::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use shiharai_shared::db::pool;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Application version
    pub version: String,

    /// Database status, absent when no database is attached
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

/// Health check handler
///
/// Reports `degraded` when the attached database does not answer.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match &state.db {
        Some(db) => match pool::health_check(db).await {
            Ok(()) => Some("connected"),
            Err(e) => {
                tracing::warn!(error = %e, "Database health check failed");
                Some("disconnected")
            }
        },
        None => None,
    };

    let status = if database == Some("disconnected") {
        "degraded"
    } else {
        "healthy"
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.map(str::to_string),
    })
}
