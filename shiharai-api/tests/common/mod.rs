//! Common test utilities for integration tests
//!
//! Builds the full router over in-memory stores with a pinned clock and a
//! cheap Argon2 configuration, and seeds two companies so tenant isolation
//! can be exercised.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use shiharai_api::app::{build_router, AppState};
use shiharai_api::config::{ApiConfig, BillingConfig, Config, DatabaseConfig, JwtConfig};
use shiharai_shared::auth::password::Argon2Hasher;
use shiharai_shared::clock::FixedClock;
use shiharai_shared::models::{
    Company, CreateBankAccount, CreateCompany, CreateVendor, Vendor, VendorBankAccount,
};
use shiharai_shared::store::memory::InMemoryStore;
use shiharai_shared::store::Stores;
use std::sync::Arc;
use tower::Service as _;

pub const PASSWORD: &str = "correct horse battery";

/// A company with one vendor and one bank account
pub struct Tenant {
    pub company: Company,
    pub vendor: Vendor,
    pub account: VendorBankAccount,
}

/// Test context containing all necessary resources
pub struct TestContext {
    pub app: axum::Router,
    pub clock: Arc<FixedClock>,
    pub stores: Stores,
    pub acme: Tenant,
    pub globex: Tenant,
}

pub fn start_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 1, 23, 45).unwrap()
}

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            request_timeout_secs: 30,
        },
        database: DatabaseConfig {
            url: "postgresql://unused".to_string(),
            max_connections: 1,
            min_connections: 0,
        },
        jwt: JwtConfig {
            secret: "integration-test-secret-key-32-bytes!".to_string(),
        },
        billing: BillingConfig {
            fee_rate: Decimal::new(4, 2),
            tax_rate: Decimal::new(10, 2),
        },
    }
}

async fn seed_tenant(stores: &Stores, name: &str) -> Tenant {
    let company = stores
        .companies
        .create(CreateCompany {
            name: name.to_string(),
            representative_name: format!("{} Rep", name),
            phone_number: "03-0000-0000".to_string(),
            zip_code: "100-0001".to_string(),
            address: "Tokyo".to_string(),
        })
        .await
        .unwrap();

    let vendor = stores
        .vendors
        .create(CreateVendor {
            company_id: company.id,
            name: format!("{} Supplier", name),
            representative_name: "Supplier Rep".to_string(),
            phone_number: "06-0000-0000".to_string(),
            zip_code: "530-0001".to_string(),
            address: "Osaka".to_string(),
        })
        .await
        .unwrap();

    let account = stores
        .bank_accounts
        .create(CreateBankAccount {
            vendor_id: vendor.id,
            bank_name: "Example Bank".to_string(),
            branch_name: "Head Office".to_string(),
            account_number: "1234567".to_string(),
            account_holder_name: format!("{} Supplier", name),
        })
        .await
        .unwrap();

    Tenant {
        company,
        vendor,
        account,
    }
}

impl TestContext {
    pub async fn new() -> Self {
        let clock = Arc::new(FixedClock::new(start_instant()));
        let stores = Stores::from_backend(Arc::new(InMemoryStore::with_clock(clock.clone())));

        let acme = seed_tenant(&stores, "Acme").await;
        let globex = seed_tenant(&stores, "Globex").await;

        let state = AppState::new(
            test_config(),
            &stores,
            Arc::new(Argon2Hasher::with_params(1024, 1, 1).unwrap()),
            clock.clone(),
        );

        TestContext {
            app: build_router(state),
            clock,
            stores,
            acme,
            globex,
        }
    }

    /// Sends a request through the router
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().call(request).await.unwrap()
    }

    /// Sends a JSON request and returns the status with the parsed body
    pub async fn json(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.send(request).await;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        (status, body)
    }

    /// Registers a user in `company_id` and returns the token response
    pub async fn register(&self, company_id: i64, email: &str) -> Value {
        let (status, body) = self
            .json(
                "POST",
                "/api/auth/register",
                None,
                Some(serde_json::json!({
                    "company_id": company_id,
                    "name": "Yamada Taro",
                    "email": email,
                    "password": PASSWORD,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        body
    }

    /// Registers a user and returns their access token
    pub async fn access_token(&self, company_id: i64, email: &str) -> String {
        let body = self.register(company_id, email).await;
        body["access_token"].as_str().unwrap().to_string()
    }
}
