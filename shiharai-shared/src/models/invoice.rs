//! Invoice model
//!
//! An invoice records what a company owes a vendor together with the fee and
//! tax figures computed at creation time. Rates are frozen on the row, so a
//! later change to the configured rates never alters an existing invoice.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE invoices (
//!     id BIGSERIAL PRIMARY KEY,
//!     company_id BIGINT NOT NULL REFERENCES companies(id),
//!     vendor_id BIGINT NOT NULL REFERENCES vendors(id),
//!     vendor_bank_account_id BIGINT NOT NULL REFERENCES vendor_bank_accounts(id),
//!     issue_date DATE NOT NULL,
//!     payment_amount BIGINT NOT NULL,
//!     fee BIGINT NOT NULL,
//!     fee_rate NUMERIC(5,4) NOT NULL,
//!     tax BIGINT NOT NULL,
//!     tax_rate NUMERIC(5,4) NOT NULL,
//!     total_amount BIGINT NOT NULL,
//!     due_date DATE NOT NULL,
//!     status TEXT NOT NULL DEFAULT 'pending',
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Invoice processing status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// Registered, awaiting processing
    Pending,

    /// Payment in progress
    Processing,

    /// Paid out to the vendor
    Paid,

    /// Processing failed
    Error,
}

/// Error returned when a stored status string is not recognized
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown invoice status: {0}")]
pub struct UnknownStatus(pub String);

impl InvoiceStatus {
    /// Converts status to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Processing => "processing",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Error => "error",
        }
    }
}

impl FromStr for InvoiceStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InvoiceStatus::Pending),
            "processing" => Ok(InvoiceStatus::Processing),
            "paid" => Ok(InvoiceStatus::Paid),
            "error" => Ok(InvoiceStatus::Error),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for InvoiceStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, UnknownStatus> {
        value.parse()
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Invoice row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Invoice {
    /// Unique invoice ID
    pub id: i64,

    /// Owning company
    pub company_id: i64,

    /// Vendor being paid
    pub vendor_id: i64,

    /// Destination account (belongs to `vendor_id`)
    pub vendor_bank_account_id: i64,

    /// Date the invoice was issued
    pub issue_date: NaiveDate,

    /// Amount owed to the vendor
    pub payment_amount: i64,

    /// Service fee
    pub fee: i64,

    /// Fee rate frozen at creation
    pub fee_rate: Decimal,

    /// Consumption tax on the fee
    pub tax: i64,

    /// Tax rate frozen at creation
    pub tax_rate: Decimal,

    /// `payment_amount + fee + tax`
    pub total_amount: i64,

    /// Payment due date
    pub due_date: NaiveDate,

    /// Processing status
    #[sqlx(try_from = "String")]
    pub status: InvoiceStatus,

    /// When the invoice was created
    pub created_at: DateTime<Utc>,

    /// When the invoice was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for persisting a new invoice
///
/// Figures are already computed; the store writes them verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateInvoice {
    pub company_id: i64,
    pub vendor_id: i64,
    pub vendor_bank_account_id: i64,
    pub issue_date: NaiveDate,
    pub payment_amount: i64,
    pub fee: i64,
    pub fee_rate: Decimal,
    pub tax: i64,
    pub tax_rate: Decimal,
    pub total_amount: i64,
    pub due_date: NaiveDate,
    pub status: InvoiceStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            InvoiceStatus::Pending,
            InvoiceStatus::Processing,
            InvoiceStatus::Paid,
            InvoiceStatus::Error,
        ] {
            assert_eq!(status.as_str().parse::<InvoiceStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_unknown_status() {
        assert_eq!(
            InvoiceStatus::try_from("void".to_string()),
            Err(UnknownStatus("void".to_string()))
        );
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&InvoiceStatus::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
    }
}
