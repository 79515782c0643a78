//! Tenant-scoped invoice creation and lookup
//!
//! Every operation takes the caller's `company_id`. Rows owned by another
//! company are reported as [`DomainError::NotFound`], never as forbidden, so
//! their existence is not disclosed.

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::billing::FeeCalculator;
use crate::error::{DomainError, DomainResult};
use crate::models::{CreateInvoice, Invoice, InvoiceStatus};
use crate::store::{BankAccountStore, InvoiceStore, Stores, VendorStore};

/// Input for creating an invoice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateInvoiceInput {
    pub company_id: i64,
    pub vendor_id: i64,
    pub bank_account_id: i64,
    pub issue_date: NaiveDate,
    pub payment_amount: i64,
    pub due_date: NaiveDate,
}

/// Input for listing invoices
///
/// The due-date filter applies only when both bounds are present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListInvoicesInput {
    pub company_id: i64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Invoice orchestration
#[derive(Clone)]
pub struct InvoiceFlow {
    calculator: FeeCalculator,
    vendors: Arc<dyn VendorStore>,
    bank_accounts: Arc<dyn BankAccountStore>,
    invoices: Arc<dyn InvoiceStore>,
}

impl InvoiceFlow {
    pub fn new(
        calculator: FeeCalculator,
        vendors: Arc<dyn VendorStore>,
        bank_accounts: Arc<dyn BankAccountStore>,
        invoices: Arc<dyn InvoiceStore>,
    ) -> Self {
        Self {
            calculator,
            vendors,
            bank_accounts,
            invoices,
        }
    }

    /// Builds the flow from a store bundle
    pub fn from_stores(calculator: FeeCalculator, stores: &Stores) -> Self {
        Self::new(
            calculator,
            stores.vendors.clone(),
            stores.bank_accounts.clone(),
            stores.invoices.clone(),
        )
    }

    /// Creates a pending invoice with frozen fee/tax figures
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if `payment_amount` is not positive
    /// - `NotFound` if the vendor is not the company's, or the bank account
    ///   is not the vendor's; nothing is persisted in either case
    #[instrument(skip(self), fields(company_id = input.company_id))]
    pub async fn create(&self, input: CreateInvoiceInput) -> DomainResult<Invoice> {
        if input.payment_amount <= 0 {
            return Err(DomainError::InvalidInput(
                "payment amount must be positive".to_string(),
            ));
        }

        if self
            .vendors
            .find_by_id_and_company(input.vendor_id, input.company_id)
            .await?
            .is_none()
        {
            debug!(vendor_id = input.vendor_id, "Vendor not found for company");
            return Err(DomainError::NotFound);
        }

        if self
            .bank_accounts
            .find_by_id_and_vendor(input.bank_account_id, input.vendor_id)
            .await?
            .is_none()
        {
            debug!(
                bank_account_id = input.bank_account_id,
                vendor_id = input.vendor_id,
                "Bank account not found for vendor"
            );
            return Err(DomainError::NotFound);
        }

        let figures = self.calculator.calculate(input.payment_amount)?;

        let invoice = self
            .invoices
            .create(CreateInvoice {
                company_id: input.company_id,
                vendor_id: input.vendor_id,
                vendor_bank_account_id: input.bank_account_id,
                issue_date: input.issue_date,
                payment_amount: figures.payment_amount,
                fee: figures.fee,
                fee_rate: figures.fee_rate,
                tax: figures.tax,
                tax_rate: figures.tax_rate,
                total_amount: figures.total_amount,
                due_date: input.due_date,
                status: InvoiceStatus::Pending,
            })
            .await?;

        info!(
            invoice_id = invoice.id,
            total_amount = invoice.total_amount,
            "Invoice created"
        );
        Ok(invoice)
    }

    /// Lists the company's invoices, filtered by due date when both bounds
    /// are given
    #[instrument(skip(self))]
    pub async fn list(&self, input: ListInvoicesInput) -> DomainResult<Vec<Invoice>> {
        let invoices = match (input.start_date, input.end_date) {
            (Some(start), Some(end)) => {
                self.invoices
                    .list_by_company_and_due_range(input.company_id, start, end)
                    .await?
            }
            _ => self.invoices.list_by_company(input.company_id).await?,
        };

        debug!(count = invoices.len(), "Invoices listed");
        Ok(invoices)
    }

    /// Fetches one of the company's invoices
    #[instrument(skip(self))]
    pub async fn get_by_id(&self, company_id: i64, invoice_id: i64) -> DomainResult<Invoice> {
        self.invoices
            .find_by_id_and_company(invoice_id, company_id)
            .await?
            .ok_or(DomainError::NotFound)
    }
}

impl std::fmt::Debug for InvoiceFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvoiceFlow")
            .field("calculator", &self.calculator)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateBankAccount, CreateCompany, CreateVendor, Vendor, VendorBankAccount};
    use crate::store::CompanyStore;
    use rust_decimal::Decimal;

    struct Fixture {
        flow: InvoiceFlow,
        stores: Stores,
        company_id: i64,
        vendor: Vendor,
        account: VendorBankAccount,
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn create_company(companies: &dyn CompanyStore, name: &str) -> i64 {
        companies
            .create(CreateCompany {
                name: name.to_string(),
                representative_name: "Rep".to_string(),
                phone_number: "03-0000-0000".to_string(),
                zip_code: "100-0001".to_string(),
                address: "Tokyo".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    async fn create_vendor(stores: &Stores, company_id: i64) -> (Vendor, VendorBankAccount) {
        let vendor = stores
            .vendors
            .create(CreateVendor {
                company_id,
                name: "Vendor".to_string(),
                representative_name: "Rep".to_string(),
                phone_number: "03-1111-1111".to_string(),
                zip_code: "100-0002".to_string(),
                address: "Osaka".to_string(),
            })
            .await
            .unwrap();
        let account = stores
            .bank_accounts
            .create(CreateBankAccount {
                vendor_id: vendor.id,
                bank_name: "Bank".to_string(),
                branch_name: "Main".to_string(),
                account_number: "1234567".to_string(),
                account_holder_name: "Vendor".to_string(),
            })
            .await
            .unwrap();
        (vendor, account)
    }

    async fn fixture() -> Fixture {
        let stores = Stores::in_memory();
        let company_id = create_company(stores.companies.as_ref(), "Acme").await;
        let (vendor, account) = create_vendor(&stores, company_id).await;
        let flow = InvoiceFlow::from_stores(FeeCalculator::new(), &stores);

        Fixture {
            flow,
            stores,
            company_id,
            vendor,
            account,
        }
    }

    fn input(fx: &Fixture, payment_amount: i64, due_date: NaiveDate) -> CreateInvoiceInput {
        CreateInvoiceInput {
            company_id: fx.company_id,
            vendor_id: fx.vendor.id,
            bank_account_id: fx.account.id,
            issue_date: date(2024, 1, 1),
            payment_amount,
            due_date,
        }
    }

    #[tokio::test]
    async fn test_create_freezes_figures() {
        let fx = fixture().await;

        let invoice = fx.flow.create(input(&fx, 10_000, date(2024, 1, 31))).await.unwrap();

        assert_eq!(invoice.company_id, fx.company_id);
        assert_eq!(invoice.fee, 400);
        assert_eq!(invoice.tax, 40);
        assert_eq!(invoice.total_amount, 10_440);
        assert_eq!(invoice.fee_rate, Decimal::new(4, 2));
        assert_eq!(invoice.tax_rate, Decimal::new(10, 2));
        assert_eq!(invoice.status, InvoiceStatus::Pending);
        assert_eq!(
            invoice.total_amount,
            invoice.payment_amount + invoice.fee + invoice.tax
        );
    }

    #[tokio::test]
    async fn test_create_with_configured_rates() {
        let fx = fixture().await;
        let flow = InvoiceFlow::from_stores(
            FeeCalculator::with_rates(Decimal::new(5, 2), Decimal::new(8, 2)),
            &fx.stores,
        );

        let invoice = flow.create(input(&fx, 10_000, date(2024, 1, 31))).await.unwrap();
        assert_eq!(invoice.fee, 500);
        assert_eq!(invoice.tax, 40);
        assert_eq!(invoice.fee_rate, Decimal::new(5, 2));
    }

    #[tokio::test]
    async fn test_create_rejects_non_positive_amount() {
        let fx = fixture().await;

        for amount in [0, -1] {
            let err = fx.flow.create(input(&fx, amount, date(2024, 1, 31))).await.unwrap_err();
            assert!(matches!(err, DomainError::InvalidInput(_)));
        }
    }

    #[tokio::test]
    async fn test_create_with_foreign_vendor() {
        let fx = fixture().await;
        let other_company = create_company(fx.stores.companies.as_ref(), "Other").await;
        let (other_vendor, other_account) = create_vendor(&fx.stores, other_company).await;

        let mut request = input(&fx, 10_000, date(2024, 1, 31));
        request.vendor_id = other_vendor.id;
        request.bank_account_id = other_account.id;

        let err = fx.flow.create(request).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound));
    }

    #[tokio::test]
    async fn test_create_with_other_vendors_account_persists_nothing() {
        let fx = fixture().await;
        let (_, second_account) = create_vendor(&fx.stores, fx.company_id).await;

        let mut request = input(&fx, 10_000, date(2024, 1, 31));
        request.bank_account_id = second_account.id;

        let err = fx.flow.create(request).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound));

        let listed = fx
            .flow
            .list(ListInvoicesInput {
                company_id: fx.company_id,
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_list_with_and_without_range() {
        let fx = fixture().await;
        let jan = fx.flow.create(input(&fx, 1_000, date(2024, 1, 31))).await.unwrap();
        let mar = fx.flow.create(input(&fx, 3_000, date(2024, 3, 31))).await.unwrap();
        let feb = fx.flow.create(input(&fx, 2_000, date(2024, 2, 29))).await.unwrap();

        let all = fx
            .flow
            .list(ListInvoicesInput {
                company_id: fx.company_id,
                ..Default::default()
            })
            .await
            .unwrap();
        let ids: Vec<i64> = all.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![jan.id, feb.id, mar.id]);

        let ranged = fx
            .flow
            .list(ListInvoicesInput {
                company_id: fx.company_id,
                start_date: Some(date(2024, 2, 1)),
                end_date: Some(date(2024, 3, 31)),
            })
            .await
            .unwrap();
        let ids: Vec<i64> = ranged.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![feb.id, mar.id]);

        // A single bound is ignored
        let half_open = fx
            .flow
            .list(ListInvoicesInput {
                company_id: fx.company_id,
                start_date: Some(date(2024, 3, 1)),
                end_date: None,
            })
            .await
            .unwrap();
        assert_eq!(half_open.len(), 3);
    }

    #[tokio::test]
    async fn test_list_never_crosses_tenants() {
        let fx = fixture().await;
        fx.flow.create(input(&fx, 1_000, date(2024, 1, 31))).await.unwrap();
        let other_company = create_company(fx.stores.companies.as_ref(), "Other").await;

        let listed = fx
            .flow
            .list(ListInvoicesInput {
                company_id: other_company,
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_get_by_id_is_tenant_scoped() {
        let fx = fixture().await;
        let invoice = fx.flow.create(input(&fx, 1_000, date(2024, 1, 31))).await.unwrap();
        let other_company = create_company(fx.stores.companies.as_ref(), "Other").await;

        let found = fx.flow.get_by_id(fx.company_id, invoice.id).await.unwrap();
        assert_eq!(found, invoice);

        let err = fx.flow.get_by_id(other_company, invoice.id).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound));

        let err = fx.flow.get_by_id(fx.company_id, invoice.id + 1000).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound));
    }
}
