//! Invoice endpoints
//!
//! All routes sit behind the bearer middleware and operate on the caller's
//! company only. Another company's invoice answers `404`, exactly like a
//! missing one.
//!
//! - `POST /api/invoices` - Create an invoice, computing fee and tax
//! - `GET /api/invoices?start_date=YYYY-MM-DD&end_date=YYYY-MM-DD` - List
//! - `GET /api/invoices/:id` - Fetch one

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::auth::AuthContext,
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shiharai_shared::{
    flows::{CreateInvoiceInput, ListInvoicesInput},
    models::Invoice,
};
use validator::Validate;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Create invoice request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvoiceRequest {
    /// Vendor being paid
    #[validate(range(min = 1, message = "vendor_id must be positive"))]
    pub vendor_id: i64,

    /// Destination account of the vendor
    #[validate(range(min = 1, message = "vendor_bank_account_id must be positive"))]
    pub vendor_bank_account_id: i64,

    /// Issue date (`YYYY-MM-DD`)
    pub issue_date: String,

    /// Amount owed to the vendor
    #[validate(range(min = 1, message = "payment_amount must be positive"))]
    pub payment_amount: i64,

    /// Due date (`YYYY-MM-DD`)
    pub due_date: String,
}

/// List query parameters
///
/// The due-date filter applies only when both bounds are given.
#[derive(Debug, Default, Deserialize)]
pub struct ListInvoicesQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Invoice as returned to clients
#[derive(Debug, Serialize, Deserialize)]
pub struct InvoiceResponse {
    pub id: i64,
    pub company_id: i64,
    pub vendor_id: i64,
    pub vendor_bank_account_id: i64,
    pub issue_date: String,
    pub payment_amount: i64,
    pub fee: i64,
    pub fee_rate: String,
    pub tax: i64,
    pub tax_rate: String,
    pub total_amount: i64,
    pub due_date: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Invoice> for InvoiceResponse {
    fn from(invoice: Invoice) -> Self {
        Self {
            id: invoice.id,
            company_id: invoice.company_id,
            vendor_id: invoice.vendor_id,
            vendor_bank_account_id: invoice.vendor_bank_account_id,
            issue_date: invoice.issue_date.format(DATE_FORMAT).to_string(),
            payment_amount: invoice.payment_amount,
            fee: invoice.fee,
            fee_rate: invoice.fee_rate.to_string(),
            tax: invoice.tax,
            tax_rate: invoice.tax_rate.to_string(),
            total_amount: invoice.total_amount,
            due_date: invoice.due_date.format(DATE_FORMAT).to_string(),
            status: invoice.status.to_string(),
            created_at: invoice.created_at,
            updated_at: invoice.updated_at,
        }
    }
}

fn parse_date(field: &str, value: &str) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        ApiError::BadRequest(format!("{} must be a date in YYYY-MM-DD format", field))
    })
}

fn parse_optional_date(field: &str, value: Option<&str>) -> ApiResult<Option<NaiveDate>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_date(field, value).map(Some),
    }
}

/// Create an invoice
///
/// # Endpoint
///
/// ```text
/// POST /api/invoices
/// Authorization: Bearer <access token>
///
/// {
///   "vendor_id": 1,
///   "vendor_bank_account_id": 1,
///   "issue_date": "2024-01-01",
///   "payment_amount": 10000,
///   "due_date": "2024-01-31"
/// }
/// ```
///
/// # Response
///
/// `201 Created` with the stored invoice, `fee` 400, `tax` 40 and
/// `total_amount` 10440 at the default rates.
///
/// # Errors
///
/// - `400 Bad Request`: Malformed body or date
/// - `404 Not Found`: Vendor or bank account not visible to the caller
/// - `422 Unprocessable Entity`: Validation failed
pub async fn create_invoice(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<CreateInvoiceRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<InvoiceResponse>)> {
    let Json(req) = payload?;
    req.validate()?;

    let issue_date = parse_date("issue_date", &req.issue_date)?;
    let due_date = parse_date("due_date", &req.due_date)?;

    let invoice = state
        .invoices
        .create(CreateInvoiceInput {
            company_id: auth.company_id,
            vendor_id: req.vendor_id,
            bank_account_id: req.vendor_bank_account_id,
            issue_date,
            payment_amount: req.payment_amount,
            due_date,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(invoice.into())))
}

/// List the caller's invoices, ordered by due date
///
/// # Errors
///
/// - `400 Bad Request`: A date parameter is not `YYYY-MM-DD`
pub async fn list_invoices(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    query: Result<Query<ListInvoicesQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<InvoiceResponse>>> {
    let Query(query) = query?;

    let start_date = parse_optional_date("start_date", query.start_date.as_deref())?;
    let end_date = parse_optional_date("end_date", query.end_date.as_deref())?;

    let invoices = state
        .invoices
        .list(ListInvoicesInput {
            company_id: auth.company_id,
            start_date,
            end_date,
        })
        .await?;

    Ok(Json(invoices.into_iter().map(InvoiceResponse::from).collect()))
}

/// Fetch one invoice
///
/// # Errors
///
/// - `400 Bad Request`: The id is not a positive integer
/// - `404 Not Found`: Missing or owned by another company
pub async fn get_invoice(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<InvoiceResponse>> {
    let Path(id) = id?;

    if id <= 0 {
        return Err(ApiError::BadRequest("invoice id must be positive".to_string()));
    }

    let invoice = state.invoices.get_by_id(auth.company_id, id).await?;

    Ok(Json(invoice.into()))
}
