//! Application state and router builder
//!
//! This module defines the shared application state and provides
//! a function to build the Axum router with all routes and middleware.
//!
//! # Example
//!
//! ```no_run
//! use shiharai_api::{app::{build_router, AppState}, config::Config};
//! use shiharai_shared::{auth::password::Argon2Hasher, clock::SystemClock, store::Stores};
//! use sqlx::PgPool;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let pool = PgPool::connect(&config.database.url).await?;
//! let stores = Stores::postgres(pool.clone());
//! let state = AppState::new(
//!     config,
//!     &stores,
//!     Arc::new(Argon2Hasher::default()),
//!     Arc::new(SystemClock),
//! )
//! .with_database(pool);
//! let app = build_router(state);
//! # Ok(())
//! # }
//! ```

use crate::{config::Config, middleware::auth::require_bearer, routes};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use shiharai_shared::{
    auth::{jwt::TokenService, password::PasswordHasher},
    billing::FeeCalculator,
    clock::Clock,
    flows::{AuthFlow, InvoiceFlow},
    store::Stores,
};
use sqlx::PgPool;
use std::{sync::Arc, time::Duration};
use tower_http::{
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Every field is reference-counted, so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,

    /// Registration, login and refresh
    pub auth: AuthFlow,

    /// Tenant-scoped invoice operations
    pub invoices: InvoiceFlow,

    /// Time source shared with the token service
    pub clock: Arc<dyn Clock>,

    /// Database pool, when running against PostgreSQL
    pub db: Option<PgPool>,
}

impl AppState {
    /// Wires the flows over the given stores
    pub fn new(
        config: Config,
        stores: &Stores,
        hasher: Arc<dyn PasswordHasher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let tokens = Arc::new(TokenService::new(
            config.jwt.secret.as_bytes(),
            clock.clone(),
        ));
        let calculator =
            FeeCalculator::with_rates(config.billing.fee_rate, config.billing.tax_rate);

        Self {
            auth: AuthFlow::new(tokens, hasher, stores.users.clone()),
            invoices: InvoiceFlow::from_stores(calculator, stores),
            config: Arc::new(config),
            clock,
            db: None,
        }
    }

    /// Attaches the pool the health check probes
    pub fn with_database(mut self, pool: PgPool) -> Self {
        self.db = Some(pool);
        self
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /health                 # Health check (public)
/// └── /api/
///     ├── /auth/                   # Authentication (public)
///     │   ├── POST /register
///     │   ├── POST /login
///     │   └── POST /refresh
///     └── /invoices                # Bearer token required
///         ├── POST /
///         ├── GET  /?start_date&end_date
///         └── GET  /:id
/// ```
///
/// # Middleware Stack
///
/// Applied in order (innermost first):
/// 1. Bearer authentication (invoice routes only)
/// 2. Request timeout (tower-http TimeoutLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. CORS (tower-http CorsLayer)
pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    let invoice_routes = Router::new()
        .route(
            "/invoices",
            post(routes::invoices::create_invoice).get(routes::invoices::list_invoices),
        )
        .route("/invoices/:id", get(routes::invoices::get_invoice))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_bearer,
        ));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(invoice_routes);

    let cors = if state.config.allows_any_origin() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(Duration::from_secs(3600))
    };

    let timeout = Duration::from_secs(state.config.api.request_timeout_secs);

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(TimeoutLayer::new(timeout))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}
