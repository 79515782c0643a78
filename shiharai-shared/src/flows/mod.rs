//! Request-scoped orchestration over the auth primitives, the fee engine
//! and the stores
//!
//! - [`auth`]: Registration, login and token refresh
//! - [`invoice`]: Tenant-scoped invoice creation and lookup
//!
//! Flows hold only immutable collaborators behind `Arc`, so one instance is
//! shared by every request.

pub mod auth;
pub mod invoice;

pub use auth::{AuthFlow, LoginInput, RegisterInput};
pub use invoice::{CreateInvoiceInput, InvoiceFlow, ListInvoicesInput};
