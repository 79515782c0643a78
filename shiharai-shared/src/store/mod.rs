//! Storage traits and backends
//!
//! Flows talk to storage only through the traits in this module. Two
//! backends implement every trait:
//!
//! - [`postgres`]: sqlx over a `PgPool`, used by the server
//! - [`memory`]: `RwLock`-guarded maps, used in development and tests
//!
//! Tenant scoping is part of the query shape: lookups that take a
//! `company_id` never return rows owned by another company.
//!
//! # Example
//!
//! ```
//! use shiharai_shared::models::CreateCompany;
//! use shiharai_shared::store::Stores;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let stores = Stores::in_memory();
//! let company = stores
//!     .companies
//!     .create(CreateCompany {
//!         name: "Acme".to_string(),
//!         representative_name: "Jane Roe".to_string(),
//!         phone_number: "03-0000-0000".to_string(),
//!         zip_code: "100-0001".to_string(),
//!         address: "Tokyo".to_string(),
//!     })
//!     .await?;
//! assert!(stores.companies.find_by_id(company.id).await?.is_some());
//! # Ok(())
//! # }
//! ```

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use std::sync::Arc;

use crate::models::{
    Company, CreateBankAccount, CreateCompany, CreateInvoice, CreateUser, CreateVendor, Invoice,
    InvoiceStatus, User, Vendor, VendorBankAccount,
};

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;

/// Result alias for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// A foreign key constraint rejected the write
    #[error("foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    /// Any other database failure
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl StoreError {
    /// Checks whether this is a unique violation on the named constraint
    pub fn is_unique_violation_of(&self, constraint: &str) -> bool {
        matches!(self, StoreError::UniqueViolation(name) if name == constraint)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let constraint = db_err.constraint().unwrap_or_default().to_string();

            if db_err.is_unique_violation() {
                return StoreError::UniqueViolation(constraint);
            }
            if db_err.is_foreign_key_violation() {
                return StoreError::ForeignKeyViolation(constraint);
            }
        }

        StoreError::Database(err)
    }
}

/// Company persistence
#[async_trait]
pub trait CompanyStore: Send + Sync {
    /// Finds a company by ID
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Company>>;

    /// Creates a company
    async fn create(&self, data: CreateCompany) -> StoreResult<Company>;
}

/// User persistence
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Finds a user by ID
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>>;

    /// Finds a user by email (exact match)
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Checks whether any user holds this email
    async fn exists_by_email(&self, email: &str) -> StoreResult<bool>;

    /// Creates a user
    ///
    /// # Errors
    ///
    /// `StoreError::UniqueViolation("users_email_key")` if the email is taken
    async fn create(&self, data: CreateUser) -> StoreResult<User>;

    /// Replaces a user's password hash, returning the updated user
    async fn update_password(&self, id: i64, password_hash: &str) -> StoreResult<Option<User>>;
}

/// Vendor persistence
#[async_trait]
pub trait VendorStore: Send + Sync {
    /// Finds a vendor owned by `company_id`
    async fn find_by_id_and_company(&self, id: i64, company_id: i64) -> StoreResult<Option<Vendor>>;

    /// Lists a company's vendors ordered by ID
    async fn list_by_company(&self, company_id: i64) -> StoreResult<Vec<Vendor>>;

    /// Creates a vendor
    async fn create(&self, data: CreateVendor) -> StoreResult<Vendor>;
}

/// Vendor bank account persistence
#[async_trait]
pub trait BankAccountStore: Send + Sync {
    /// Finds a bank account owned by `vendor_id`
    async fn find_by_id_and_vendor(
        &self,
        id: i64,
        vendor_id: i64,
    ) -> StoreResult<Option<VendorBankAccount>>;

    /// Lists a vendor's bank accounts ordered by ID
    async fn list_by_vendor(&self, vendor_id: i64) -> StoreResult<Vec<VendorBankAccount>>;

    /// Creates a bank account
    async fn create(&self, data: CreateBankAccount) -> StoreResult<VendorBankAccount>;
}

/// Invoice persistence
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Persists a fully computed invoice
    async fn create(&self, data: CreateInvoice) -> StoreResult<Invoice>;

    /// Finds an invoice owned by `company_id`
    async fn find_by_id_and_company(&self, id: i64, company_id: i64) -> StoreResult<Option<Invoice>>;

    /// Lists a company's invoices ordered by due date, then ID
    async fn list_by_company(&self, company_id: i64) -> StoreResult<Vec<Invoice>>;

    /// Lists a company's invoices due within `[start, end]` (inclusive),
    /// ordered by due date, then ID
    async fn list_by_company_and_due_range(
        &self,
        company_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<Invoice>>;

    /// Sets an invoice's status, returning the updated invoice
    async fn update_status(&self, id: i64, status: InvoiceStatus) -> StoreResult<Option<Invoice>>;
}

/// Every store the flows need, behind trait objects
#[derive(Clone)]
pub struct Stores {
    pub companies: Arc<dyn CompanyStore>,
    pub users: Arc<dyn UserStore>,
    pub vendors: Arc<dyn VendorStore>,
    pub bank_accounts: Arc<dyn BankAccountStore>,
    pub invoices: Arc<dyn InvoiceStore>,
}

impl Stores {
    /// Stores backed by PostgreSQL
    pub fn postgres(pool: PgPool) -> Self {
        Self::from_backend(Arc::new(PostgresStore::new(pool)))
    }

    /// Stores backed by a fresh in-memory database
    pub fn in_memory() -> Self {
        Self::from_backend(Arc::new(InMemoryStore::new()))
    }

    /// Stores sharing one backend that implements every trait
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: CompanyStore + UserStore + VendorStore + BankAccountStore + InvoiceStore + 'static,
    {
        Self {
            companies: backend.clone(),
            users: backend.clone(),
            vendors: backend.clone(),
            bank_accounts: backend.clone(),
            invoices: backend,
        }
    }
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_matching() {
        let err = StoreError::UniqueViolation("users_email_key".to_string());
        assert!(err.is_unique_violation_of("users_email_key"));
        assert!(!err.is_unique_violation_of("other_key"));
        assert!(!StoreError::Database(sqlx::Error::RowNotFound).is_unique_violation_of("users_email_key"));
    }

    #[test]
    fn test_non_database_errors_pass_through() {
        let err = StoreError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StoreError::Database(sqlx::Error::PoolTimedOut)));
    }
}
