//! # Sale Commands
//!
//! Checkout, the receipt, its PDF printout and the sales history.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Checkout                                             │
//! │                                                                         │
//! │  1. Claim the busy flag ──── taken? ──► CHECKOUT_IN_PROGRESS            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  2. plan_checkout(cart, payment, customer, notes)      (under lock)     │
//! │           │  EmptyCart / PaymentValidationFailed ──► error, no request  │
//! │           ▼                                                             │
//! │  3. POST api/sale/process                              (lock released)  │
//! │           │  Server / Network ──► error, sale left as it was            │
//! │           ▼                                                             │
//! │  4. Receipt::new(plan, confirmation, store)                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  5. finish_sale: new empty sale, receipt kept as last_receipt           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  6. Busy flag released (guard dropped, on every path)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The request is sent once. A timeout does not prove the sale failed, so the
//! cashier checks the history before trying again.

use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use tracing::{debug, info};

use till_client::{ClientError, HistoryRange, PosApi, SaleSummary};
use till_core::validation::validate_date_range;
use till_core::{plan_checkout, Receipt};

use crate::error::ApiError;
use crate::state::{ConfigState, SessionState};

/// A completed sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub receipt: Receipt,
    /// The receipt rendered at the configured paper width.
    pub printed: String,
}

/// Submits the sale in progress.
pub async fn checkout(
    api: &dyn PosApi,
    session: &SessionState,
    config: &ConfigState,
) -> Result<CheckoutResponse, ApiError> {
    debug!("checkout command");

    let _busy = session
        .begin_checkout()
        .ok_or_else(ApiError::checkout_in_progress)?;

    let plan = session.with_session(|s| {
        plan_checkout(
            &s.cart,
            &s.payment,
            s.customer.as_ref(),
            &s.notes,
            session.split_policy(),
        )
    })?;

    let confirmation = api.process_sale(&plan).await?;

    let receipt = Receipt::new(
        &plan,
        &confirmation,
        config.store_info().clone(),
        Local::now().naive_local(),
    );
    info!(
        receipt_number = %receipt.receipt_number,
        total = %receipt.total,
        method = %receipt.payment_method(),
        items = receipt.lines.len(),
        "Sale completed"
    );

    let printed = receipt.render(config.paper_width());
    session.with_session_mut(|s| s.finish_sale(receipt.clone()));

    Ok(CheckoutResponse { receipt, printed })
}

/// Renders the last completed receipt.
pub fn last_receipt(session: &SessionState, config: &ConfigState) -> Result<String, ApiError> {
    debug!("last_receipt command");

    session
        .with_session(|s| {
            s.last_receipt
                .as_ref()
                .map(|r| r.render(config.paper_width()))
        })
        .ok_or_else(|| ApiError::not_found("Receipt", "no sale completed yet"))
}

/// Downloads the PDF receipt and saves it as `receipt-<number>.pdf` in `dir`.
///
/// Without a receipt number the last completed sale is printed.
pub async fn print_receipt(
    api: &dyn PosApi,
    session: &SessionState,
    receipt_number: Option<&str>,
    dir: &Path,
) -> Result<PathBuf, ApiError> {
    debug!(receipt_number = ?receipt_number, "print_receipt command");

    let number = match receipt_number.map(str::trim).filter(|n| !n.is_empty()) {
        Some(number) => number.to_string(),
        None => session
            .with_session(|s| s.last_receipt.as_ref().map(|r| r.receipt_number.clone()))
            .ok_or_else(|| ApiError::not_found("Receipt", "no sale completed yet"))?,
    };

    let bytes = api.receipt_pdf(&number).await?;

    let path = dir.join(receipt_file_name(&number));
    tokio::fs::write(&path, &bytes).await.map_err(ClientError::from)?;

    info!(receipt_number = %number, path = ?path, bytes = bytes.len(), "Receipt PDF saved");
    Ok(path)
}

fn receipt_file_name(receipt_number: &str) -> String {
    let safe: String = receipt_number
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("receipt-{}.pdf", safe)
}

/// Lists past sales, optionally limited to an inclusive date range.
pub async fn history(
    api: &dyn PosApi,
    range: HistoryRange,
) -> Result<Vec<SaleSummary>, ApiError> {
    debug!(start = ?range.start, end = ?range.end, "history command");

    if let (Some(start), Some(end)) = (range.start, range.end) {
        validate_date_range(start, end)?;
    }

    Ok(api.sales_history(range).await?)
}
