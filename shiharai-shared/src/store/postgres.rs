//! PostgreSQL store implementation
//!
//! Queries use `sqlx::query_as` with runtime-checked SQL so the crate builds
//! without a live database. Constraint violations surface as
//! [`StoreError::UniqueViolation`] / [`StoreError::ForeignKeyViolation`]
//! carrying the schema's constraint name.
//!
//! # Example
//!
//! ```no_run
//! use shiharai_shared::db::pool::{create_pool, DatabaseConfig};
//! use shiharai_shared::store::{PostgresStore, UserStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool(DatabaseConfig {
//!     url: std::env::var("DATABASE_URL")?,
//!     ..Default::default()
//! })
//! .await?;
//!
//! let store = PostgresStore::new(pool);
//! let user = store.find_by_email("user@example.com").await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::debug;

use super::{
    BankAccountStore, CompanyStore, InvoiceStore, StoreResult, UserStore, VendorStore,
};
use crate::models::{
    Company, CreateBankAccount, CreateCompany, CreateInvoice, CreateUser, CreateVendor, Invoice,
    InvoiceStatus, User, Vendor, VendorBankAccount,
};

const COMPANY_COLUMNS: &str =
    "id, name, representative_name, phone_number, zip_code, address, created_at, updated_at";

const USER_COLUMNS: &str = "id, company_id, name, email, password_hash, created_at, updated_at";

const VENDOR_COLUMNS: &str = "id, company_id, name, representative_name, phone_number, zip_code, \
     address, created_at, updated_at";

const BANK_ACCOUNT_COLUMNS: &str = "id, vendor_id, bank_name, branch_name, account_number, \
     account_holder_name, created_at, updated_at";

const INVOICE_COLUMNS: &str = "id, company_id, vendor_id, vendor_bank_account_id, issue_date, \
     payment_amount, fee, fee_rate, tax, tax_rate, total_amount, due_date, status, \
     created_at, updated_at";

/// Store backed by a PostgreSQL connection pool
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CompanyStore for PostgresStore {
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Company>> {
        let company = sqlx::query_as::<_, Company>(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(company)
    }

    async fn create(&self, data: CreateCompany) -> StoreResult<Company> {
        let company = sqlx::query_as::<_, Company>(&format!(
            r#"
            INSERT INTO companies (name, representative_name, phone_number, zip_code, address)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {COMPANY_COLUMNS}
            "#
        ))
        .bind(data.name)
        .bind(data.representative_name)
        .bind(data.phone_number)
        .bind(data.zip_code)
        .bind(data.address)
        .fetch_one(&self.pool)
        .await?;

        debug!(company_id = company.id, "Created company");
        Ok(company)
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn exists_by_email(&self, email: &str) -> StoreResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn create(&self, data: CreateUser) -> StoreResult<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (company_id, name, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(data.company_id)
        .bind(data.name)
        .bind(data.email)
        .bind(data.password_hash)
        .fetch_one(&self.pool)
        .await?;

        debug!(user_id = user.id, company_id = user.company_id, "Created user");
        Ok(user)
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET password_hash = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}

#[async_trait]
impl VendorStore for PostgresStore {
    async fn find_by_id_and_company(&self, id: i64, company_id: i64) -> StoreResult<Option<Vendor>> {
        let vendor = sqlx::query_as::<_, Vendor>(&format!(
            "SELECT {VENDOR_COLUMNS} FROM vendors WHERE id = $1 AND company_id = $2"
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(vendor)
    }

    async fn list_by_company(&self, company_id: i64) -> StoreResult<Vec<Vendor>> {
        let vendors = sqlx::query_as::<_, Vendor>(&format!(
            "SELECT {VENDOR_COLUMNS} FROM vendors WHERE company_id = $1 ORDER BY id"
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(vendors)
    }

    async fn create(&self, data: CreateVendor) -> StoreResult<Vendor> {
        let vendor = sqlx::query_as::<_, Vendor>(&format!(
            r#"
            INSERT INTO vendors (company_id, name, representative_name, phone_number, zip_code, address)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {VENDOR_COLUMNS}
            "#
        ))
        .bind(data.company_id)
        .bind(data.name)
        .bind(data.representative_name)
        .bind(data.phone_number)
        .bind(data.zip_code)
        .bind(data.address)
        .fetch_one(&self.pool)
        .await?;

        Ok(vendor)
    }
}

#[async_trait]
impl BankAccountStore for PostgresStore {
    async fn find_by_id_and_vendor(
        &self,
        id: i64,
        vendor_id: i64,
    ) -> StoreResult<Option<VendorBankAccount>> {
        let account = sqlx::query_as::<_, VendorBankAccount>(&format!(
            "SELECT {BANK_ACCOUNT_COLUMNS} FROM vendor_bank_accounts WHERE id = $1 AND vendor_id = $2"
        ))
        .bind(id)
        .bind(vendor_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn list_by_vendor(&self, vendor_id: i64) -> StoreResult<Vec<VendorBankAccount>> {
        let accounts = sqlx::query_as::<_, VendorBankAccount>(&format!(
            "SELECT {BANK_ACCOUNT_COLUMNS} FROM vendor_bank_accounts WHERE vendor_id = $1 ORDER BY id"
        ))
        .bind(vendor_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(accounts)
    }

    async fn create(&self, data: CreateBankAccount) -> StoreResult<VendorBankAccount> {
        let account = sqlx::query_as::<_, VendorBankAccount>(&format!(
            r#"
            INSERT INTO vendor_bank_accounts
                (vendor_id, bank_name, branch_name, account_number, account_holder_name)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {BANK_ACCOUNT_COLUMNS}
            "#
        ))
        .bind(data.vendor_id)
        .bind(data.bank_name)
        .bind(data.branch_name)
        .bind(data.account_number)
        .bind(data.account_holder_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(account)
    }
}

#[async_trait]
impl InvoiceStore for PostgresStore {
    async fn create(&self, data: CreateInvoice) -> StoreResult<Invoice> {
        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            INSERT INTO invoices (
                company_id, vendor_id, vendor_bank_account_id, issue_date,
                payment_amount, fee, fee_rate, tax, tax_rate, total_amount,
                due_date, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {INVOICE_COLUMNS}
            "#
        ))
        .bind(data.company_id)
        .bind(data.vendor_id)
        .bind(data.vendor_bank_account_id)
        .bind(data.issue_date)
        .bind(data.payment_amount)
        .bind(data.fee)
        .bind(data.fee_rate)
        .bind(data.tax)
        .bind(data.tax_rate)
        .bind(data.total_amount)
        .bind(data.due_date)
        .bind(data.status.as_str())
        .fetch_one(&self.pool)
        .await?;

        debug!(invoice_id = invoice.id, company_id = invoice.company_id, "Created invoice");
        Ok(invoice)
    }

    async fn find_by_id_and_company(&self, id: i64, company_id: i64) -> StoreResult<Option<Invoice>> {
        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = $1 AND company_id = $2"
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invoice)
    }

    async fn list_by_company(&self, company_id: i64) -> StoreResult<Vec<Invoice>> {
        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE company_id = $1 ORDER BY due_date, id"
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(invoices)
    }

    async fn list_by_company_and_due_range(
        &self,
        company_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<Invoice>> {
        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            SELECT {INVOICE_COLUMNS}
            FROM invoices
            WHERE company_id = $1 AND due_date BETWEEN $2 AND $3
            ORDER BY due_date, id
            "#
        ))
        .bind(company_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(invoices)
    }

    async fn update_status(&self, id: i64, status: InvoiceStatus) -> StoreResult<Option<Invoice>> {
        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            UPDATE invoices
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {INVOICE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(invoice)
    }
}
