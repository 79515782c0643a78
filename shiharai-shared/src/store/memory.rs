//! In-memory store implementation
//!
//! Backs development runs and tests. Ids come from one shared counter and
//! timestamps from the injected [`Clock`]. Unique and foreign-key checks
//! report the same constraint names as the PostgreSQL schema.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{
    BankAccountStore, CompanyStore, InvoiceStore, StoreError, StoreResult, UserStore, VendorStore,
};
use crate::clock::{Clock, SystemClock};
use crate::models::user::EMAIL_UNIQUE_CONSTRAINT;
use crate::models::{
    Company, CreateBankAccount, CreateCompany, CreateInvoice, CreateUser, CreateVendor, Invoice,
    InvoiceStatus, User, Vendor, VendorBankAccount,
};

#[derive(Debug, Default)]
struct Tables {
    companies: BTreeMap<i64, Company>,
    users: BTreeMap<i64, User>,
    vendors: BTreeMap<i64, Vendor>,
    bank_accounts: BTreeMap<i64, VendorBankAccount>,
    invoices: BTreeMap<i64, Invoice>,
    last_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

/// In-memory implementation of every store trait.
///
/// Intended for tests/dev. Enforces the same uniqueness and reference
/// constraints as the PostgreSQL schema, reporting them under the same
/// constraint names.
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    clock: Arc<dyn Clock>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Store whose `created_at`/`updated_at` stamps come from `clock`
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            clock,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore").field("tables", &self.tables).finish()
    }
}

fn sort_by_due_date(invoices: &mut [Invoice]) {
    invoices.sort_by(|a, b| a.due_date.cmp(&b.due_date).then(a.id.cmp(&b.id)));
}

#[async_trait]
impl CompanyStore for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Company>> {
        Ok(self.read().companies.get(&id).cloned())
    }

    async fn create(&self, data: CreateCompany) -> StoreResult<Company> {
        let now = self.clock.now();
        let mut tables = self.write();
        let id = tables.next_id();

        let company = Company {
            id,
            name: data.name,
            representative_name: data.representative_name,
            phone_number: data.phone_number,
            zip_code: data.zip_code,
            address: data.address,
            created_at: now,
            updated_at: now,
        };
        tables.companies.insert(id, company.clone());

        Ok(company)
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.read().users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.read().users.values().find(|u| u.email == email).cloned())
    }

    async fn exists_by_email(&self, email: &str) -> StoreResult<bool> {
        Ok(self.read().users.values().any(|u| u.email == email))
    }

    async fn create(&self, data: CreateUser) -> StoreResult<User> {
        let now = self.clock.now();
        let mut tables = self.write();

        if tables.users.values().any(|u| u.email == data.email) {
            return Err(StoreError::UniqueViolation(EMAIL_UNIQUE_CONSTRAINT.to_string()));
        }
        if !tables.companies.contains_key(&data.company_id) {
            return Err(StoreError::ForeignKeyViolation("users_company_id_fkey".to_string()));
        }

        let id = tables.next_id();
        let user = User {
            id,
            company_id: data.company_id,
            name: data.name,
            email: data.email,
            password_hash: data.password_hash,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(id, user.clone());

        Ok(user)
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> StoreResult<Option<User>> {
        let now = self.clock.now();
        let mut tables = self.write();

        Ok(tables.users.get_mut(&id).map(|user| {
            user.password_hash = password_hash.to_string();
            user.updated_at = now;
            user.clone()
        }))
    }
}

#[async_trait]
impl VendorStore for InMemoryStore {
    async fn find_by_id_and_company(&self, id: i64, company_id: i64) -> StoreResult<Option<Vendor>> {
        Ok(self
            .read()
            .vendors
            .get(&id)
            .filter(|v| v.company_id == company_id)
            .cloned())
    }

    async fn list_by_company(&self, company_id: i64) -> StoreResult<Vec<Vendor>> {
        Ok(self
            .read()
            .vendors
            .values()
            .filter(|v| v.company_id == company_id)
            .cloned()
            .collect())
    }

    async fn create(&self, data: CreateVendor) -> StoreResult<Vendor> {
        let now = self.clock.now();
        let mut tables = self.write();

        if !tables.companies.contains_key(&data.company_id) {
            return Err(StoreError::ForeignKeyViolation("vendors_company_id_fkey".to_string()));
        }

        let id = tables.next_id();
        let vendor = Vendor {
            id,
            company_id: data.company_id,
            name: data.name,
            representative_name: data.representative_name,
            phone_number: data.phone_number,
            zip_code: data.zip_code,
            address: data.address,
            created_at: now,
            updated_at: now,
        };
        tables.vendors.insert(id, vendor.clone());

        Ok(vendor)
    }
}

#[async_trait]
impl BankAccountStore for InMemoryStore {
    async fn find_by_id_and_vendor(
        &self,
        id: i64,
        vendor_id: i64,
    ) -> StoreResult<Option<VendorBankAccount>> {
        Ok(self
            .read()
            .bank_accounts
            .get(&id)
            .filter(|a| a.vendor_id == vendor_id)
            .cloned())
    }

    async fn list_by_vendor(&self, vendor_id: i64) -> StoreResult<Vec<VendorBankAccount>> {
        Ok(self
            .read()
            .bank_accounts
            .values()
            .filter(|a| a.vendor_id == vendor_id)
            .cloned()
            .collect())
    }

    async fn create(&self, data: CreateBankAccount) -> StoreResult<VendorBankAccount> {
        let now = self.clock.now();
        let mut tables = self.write();

        if !tables.vendors.contains_key(&data.vendor_id) {
            return Err(StoreError::ForeignKeyViolation(
                "vendor_bank_accounts_vendor_id_fkey".to_string(),
            ));
        }

        let id = tables.next_id();
        let account = VendorBankAccount {
            id,
            vendor_id: data.vendor_id,
            bank_name: data.bank_name,
            branch_name: data.branch_name,
            account_number: data.account_number,
            account_holder_name: data.account_holder_name,
            created_at: now,
            updated_at: now,
        };
        tables.bank_accounts.insert(id, account.clone());

        Ok(account)
    }
}

#[async_trait]
impl InvoiceStore for InMemoryStore {
    async fn create(&self, data: CreateInvoice) -> StoreResult<Invoice> {
        let now = self.clock.now();
        let mut tables = self.write();

        if !tables.companies.contains_key(&data.company_id) {
            return Err(StoreError::ForeignKeyViolation("invoices_company_id_fkey".to_string()));
        }
        if !tables.vendors.contains_key(&data.vendor_id) {
            return Err(StoreError::ForeignKeyViolation("invoices_vendor_id_fkey".to_string()));
        }
        if !tables.bank_accounts.contains_key(&data.vendor_bank_account_id) {
            return Err(StoreError::ForeignKeyViolation(
                "invoices_vendor_bank_account_id_fkey".to_string(),
            ));
        }

        let id = tables.next_id();
        let invoice = Invoice {
            id,
            company_id: data.company_id,
            vendor_id: data.vendor_id,
            vendor_bank_account_id: data.vendor_bank_account_id,
            issue_date: data.issue_date,
            payment_amount: data.payment_amount,
            fee: data.fee,
            fee_rate: data.fee_rate,
            tax: data.tax,
            tax_rate: data.tax_rate,
            total_amount: data.total_amount,
            due_date: data.due_date,
            status: data.status,
            created_at: now,
            updated_at: now,
        };
        tables.invoices.insert(id, invoice.clone());

        Ok(invoice)
    }

    async fn find_by_id_and_company(&self, id: i64, company_id: i64) -> StoreResult<Option<Invoice>> {
        Ok(self
            .read()
            .invoices
            .get(&id)
            .filter(|i| i.company_id == company_id)
            .cloned())
    }

    async fn list_by_company(&self, company_id: i64) -> StoreResult<Vec<Invoice>> {
        let mut invoices: Vec<Invoice> = self
            .read()
            .invoices
            .values()
            .filter(|i| i.company_id == company_id)
            .cloned()
            .collect();
        sort_by_due_date(&mut invoices);

        Ok(invoices)
    }

    async fn list_by_company_and_due_range(
        &self,
        company_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<Invoice>> {
        let mut invoices: Vec<Invoice> = self
            .read()
            .invoices
            .values()
            .filter(|i| i.company_id == company_id && i.due_date >= start && i.due_date <= end)
            .cloned()
            .collect();
        sort_by_due_date(&mut invoices);

        Ok(invoices)
    }

    async fn update_status(&self, id: i64, status: InvoiceStatus) -> StoreResult<Option<Invoice>> {
        let now = self.clock.now();
        let mut tables = self.write();

        Ok(tables.invoices.get_mut(&id).map(|invoice| {
            invoice.status = status;
            invoice.updated_at = now;
            invoice.clone()
        }))
    }
}
