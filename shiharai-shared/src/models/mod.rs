//! Persisted entities
//!
//! # Models
//!
//! - `company`: Tenant root
//! - `user`: User accounts belonging to one company
//! - `vendor`: Payment recipients and their bank accounts
//! - `invoice`: Invoices with frozen fee/tax figures
//!
//! Models are plain rows (`sqlx::FromRow`); reads and writes go through the
//! traits in [`crate::store`].

pub mod company;
pub mod invoice;
pub mod user;
pub mod vendor;

pub use company::{Company, CreateCompany};
pub use invoice::{CreateInvoice, Invoice, InvoiceStatus};
pub use user::{CreateUser, User};
pub use vendor::{CreateBankAccount, CreateVendor, Vendor, VendorBankAccount};
