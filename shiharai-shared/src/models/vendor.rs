//! Vendor and vendor bank account models
//!
//! A vendor is a payment recipient registered by a company. Invoices pay
//! into one of the vendor's bank accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Payment recipient belonging to a company
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Vendor {
    pub id: i64,
    pub company_id: i64,
    pub name: String,
    pub representative_name: String,
    pub phone_number: String,
    pub zip_code: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a vendor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVendor {
    pub company_id: i64,
    pub name: String,
    pub representative_name: String,
    pub phone_number: String,
    pub zip_code: String,
    pub address: String,
}

/// Bank account belonging to a vendor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct VendorBankAccount {
    pub id: i64,
    pub vendor_id: i64,
    pub bank_name: String,
    pub branch_name: String,
    pub account_number: String,
    pub account_holder_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a vendor bank account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBankAccount {
    pub vendor_id: i64,
    pub bank_name: String,
    pub branch_name: String,
    pub account_number: String,
    pub account_holder_name: String,
}
