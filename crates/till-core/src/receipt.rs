//! # Receipt
//!
//! Builds the customer receipt from a submitted [`CheckoutPlan`] and the
//! backend's confirmation, and lays it out as fixed-width text.
//!
//! ## Layout (42 columns)
//! ```text
//!                 Corner Shop
//!               12 High Street
//! ==========================================
//! Receipt #: R-20240131-0042
//! Date: 2024-01-31 14:05
//! Customer: Walk-in
//! ------------------------------------------
//! Notebook                            $20.00
//!   2 x $10.00
//! ------------------------------------------
//! Subtotal:                           $20.00
//! Discount (50%):                    -$10.00
//! Tax:                                 $2.00
//! ------------------------------------------
//! TOTAL:                              $12.00
//!
//! Payment Method:                       CASH
//! Amount Tendered:                    $15.00
//! Change:                              $3.00
//! ==========================================
//!         Thank you for your business!
//!     Return Policy: 30 days with receipt
//! ```
//!
//! The total printed is the backend's, not the locally computed one.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::LineItem;
use crate::checkout::CheckoutPlan;
use crate::money::Money;
use crate::payment::{PaymentMethod, PaymentSelection, SubPayment};

/// Narrowest paper the layout supports.
pub const MIN_PAPER_WIDTH: usize = 32;

/// Default paper width in columns.
pub const DEFAULT_PAPER_WIDTH: usize = 42;

// =============================================================================
// Inputs
// =============================================================================

/// Store header and footer printed on every receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StoreInfo {
    pub name: String,
    pub address: Vec<String>,
    pub phone: Option<String>,
    pub currency_symbol: String,
    pub footer: Vec<String>,
}

impl Default for StoreInfo {
    fn default() -> Self {
        StoreInfo {
            name: "Till POS".to_string(),
            address: Vec::new(),
            phone: None,
            currency_symbol: "$".to_string(),
            footer: vec![
                "Thank you for your business!".to_string(),
                "Return Policy: 30 days with receipt".to_string(),
            ],
        }
    }
}

/// What the backend reported after processing the sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleConfirmation {
    /// Not every backend version reports the id.
    pub sale_id: Option<i64>,
    pub receipt_number: String,
    pub total: Money,
    pub change: Option<Money>,
    pub loyalty_points: Option<i64>,
}

// =============================================================================
// Receipt
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Receipt {
    pub store: StoreInfo,
    pub sale_id: Option<i64>,
    pub receipt_number: String,
    #[ts(as = "String")]
    pub issued_at: NaiveDateTime,
    pub customer_name: Option<String>,
    pub lines: Vec<LineItem>,
    pub subtotal: Money,
    pub discount_label: String,
    pub discount: Money,
    pub tax: Money,
    pub total: Money,
    pub payment: PaymentSelection,
    pub change: Option<Money>,
    pub loyalty_points: Option<i64>,
    pub notes: Option<String>,
}

impl Receipt {
    /// Assembles a receipt. `issued_at` is the register's local time.
    pub fn new(
        plan: &CheckoutPlan,
        confirmation: &SaleConfirmation,
        store: StoreInfo,
        issued_at: NaiveDateTime,
    ) -> Self {
        Receipt {
            store,
            sale_id: confirmation.sale_id,
            receipt_number: confirmation.receipt_number.clone(),
            issued_at,
            customer_name: plan.customer.as_ref().map(|c| c.name.clone()),
            lines: plan.lines.clone(),
            subtotal: plan.totals.subtotal,
            discount_label: plan.discount.to_string(),
            discount: plan.totals.discount,
            tax: plan.totals.tax,
            total: confirmation.total,
            payment: plan.payment.clone(),
            change: confirmation.change.or(plan.change),
            loyalty_points: confirmation.loyalty_points.filter(|p| *p > 0),
            notes: plan.notes.clone(),
        }
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment.method()
    }

    /// Renders the receipt as plain text, `width` columns wide.
    ///
    /// Widths below [`MIN_PAPER_WIDTH`] are raised to it. No output line is
    /// wider than the paper.
    pub fn render(&self, width: usize) -> String {
        let width = width.max(MIN_PAPER_WIDTH);
        let mut out = Layout::new(width, &self.store.currency_symbol);

        out.center(&self.store.name);
        for line in &self.store.address {
            out.center(line);
        }
        if let Some(phone) = &self.store.phone {
            out.center(phone);
        }
        out.rule('=');

        out.text(&format!("Receipt #: {}", self.receipt_number));
        out.text(&format!("Date: {}", self.issued_at.format("%Y-%m-%d %H:%M")));
        out.text(&format!(
            "Customer: {}",
            self.customer_name.as_deref().unwrap_or("Walk-in")
        ));
        out.rule('-');

        for line in &self.lines {
            out.amount(&line.name, line.line_total());
            out.text(&format!(
                "  {} x {}",
                line.quantity,
                line.unit_price.format_with(&self.store.currency_symbol)
            ));
        }
        out.rule('-');

        out.amount("Subtotal:", self.subtotal);
        if self.discount.is_positive() {
            out.amount(&format!("{}:", self.discount_label), Money::zero() - self.discount);
        }
        out.amount("Tax:", self.tax);
        out.rule('-');
        out.amount("TOTAL:", self.total);
        out.blank();

        out.columns("Payment Method:", &self.payment_method().as_str().to_uppercase());
        match &self.payment {
            PaymentSelection::Cash { tendered } => {
                out.amount("Amount Tendered:", *tendered);
                out.amount("Change:", self.change.unwrap_or_default());
            }
            PaymentSelection::Card { reference } | PaymentSelection::Digital { reference } => {
                out.columns("Reference:", reference);
            }
            PaymentSelection::Split { payments } => {
                for SubPayment { method, amount, .. } in payments {
                    out.amount(&format!("  {}", method.as_str().to_uppercase()), *amount);
                }
            }
        }
        if let Some(points) = self.loyalty_points {
            out.columns("Loyalty Points Earned:", &points.to_string());
        }
        if let Some(notes) = &self.notes {
            out.blank();
            out.text(&format!("Notes: {}", notes));
        }
        out.rule('=');

        for line in &self.store.footer {
            out.center(line);
        }

        out.finish()
    }
}

// =============================================================================
// Layout Helper
// =============================================================================

/// Accumulates fixed-width lines. Widths are counted in chars.
struct Layout<'a> {
    width: usize,
    symbol: &'a str,
    lines: Vec<String>,
}

impl<'a> Layout<'a> {
    fn new(width: usize, symbol: &'a str) -> Self {
        Layout {
            width,
            symbol,
            lines: Vec::new(),
        }
    }

    fn blank(&mut self) {
        self.lines.push(String::new());
    }

    fn rule(&mut self, ch: char) {
        self.lines.push(std::iter::repeat(ch).take(self.width).collect());
    }

    /// Left-aligned text, wrapped onto further lines when too long.
    fn text(&mut self, text: &str) {
        let chars: Vec<char> = text.chars().collect();
        if chars.is_empty() {
            self.blank();
            return;
        }
        for chunk in chars.chunks(self.width) {
            self.lines.push(chunk.iter().collect());
        }
    }

    fn center(&mut self, text: &str) {
        let text = truncate(text.trim(), self.width);
        let pad = (self.width - text.chars().count()) / 2;
        self.lines.push(format!("{}{}", " ".repeat(pad), text));
    }

    /// Label on the left, value flush right. The label is cut to make room.
    fn columns(&mut self, left: &str, right: &str) {
        let right = truncate(right, self.width);
        let right_len = right.chars().count();
        let room = self.width.saturating_sub(right_len + 1);
        let left = truncate(left, room);
        let gap = self.width - left.chars().count() - right_len;
        self.lines.push(format!("{}{}{}", left, " ".repeat(gap), right));
    }

    fn amount(&mut self, label: &str, amount: Money) {
        let value = amount.format_with(self.symbol);
        self.columns(label, &value);
    }

    fn finish(self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }
}

fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::Cart;
    use crate::checkout::plan_checkout;
    use crate::discount::Discount;
    use crate::payment::{ExactSumSettlement, PaymentState};
    use crate::types::{Customer, Percentage, Product, TaxRate};
    use chrono::NaiveDate;

    fn issued_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 31)
            .and_then(|d| d.and_hms_opt(14, 5, 0))
            .unwrap()
    }

    fn store() -> StoreInfo {
        StoreInfo {
            name: "Corner Shop".to_string(),
            address: vec!["12 High Street".to_string()],
            ..StoreInfo::default()
        }
    }

    fn cash_plan(discount: Discount, tendered: i64) -> CheckoutPlan {
        let product = Product::new(1, "Notebook", Money::from_cents(1000), 10, TaxRate::from_bps(1000));
        let mut cart = Cart::new();
        cart.add_item(&product, 2).unwrap();
        cart.apply_discount(discount).unwrap();
        let mut payment = PaymentState::new();
        payment.set_tendered(Money::from_cents(tendered));
        plan_checkout(&cart, &payment, None, "", &ExactSumSettlement).unwrap()
    }

    fn confirmation(total: i64, change: Option<i64>) -> SaleConfirmation {
        SaleConfirmation {
            sale_id: Some(42),
            receipt_number: "R-20240131-0042".to_string(),
            total: Money::from_cents(total),
            change: change.map(Money::from_cents),
            loyalty_points: None,
        }
    }

    #[test]
    fn test_cash_receipt_layout() {
        let plan = cash_plan(Discount::Percentage(Percentage::from_bps(5000)), 1500);
        let receipt = Receipt::new(&plan, &confirmation(1200, Some(300)), store(), issued_at());
        let text = receipt.render(DEFAULT_PAPER_WIDTH);

        assert!(text.contains("Corner Shop"));
        assert!(text.contains("Receipt #: R-20240131-0042"));
        assert!(text.contains("Date: 2024-01-31 14:05"));
        assert!(text.contains("Customer: Walk-in"));
        assert!(text.contains("  2 x $10.00"));
        assert!(text.contains("Discount (50%):"));
        assert!(text.contains("-$10.00"));
        assert!(text.contains("CASH"));
        assert!(text.contains("Amount Tendered:"));
        assert!(text.contains("Thank you for your business!"));

        let total_line = text.lines().find(|l| l.starts_with("TOTAL:")).unwrap();
        assert!(total_line.ends_with("$12.00"));
        let change_line = text.lines().find(|l| l.starts_with("Change:")).unwrap();
        assert!(change_line.ends_with("$3.00"));
    }

    #[test]
    fn test_no_discount_line_when_zero() {
        let plan = cash_plan(Discount::None, 2200);
        let receipt = Receipt::new(&plan, &confirmation(2200, None), store(), issued_at());
        let text = receipt.render(DEFAULT_PAPER_WIDTH);
        assert!(!text.contains("Discount"));
        // falls back to the locally computed change
        let change_line = text.lines().find(|l| l.starts_with("Change:")).unwrap();
        assert!(change_line.ends_with("$0.00"));
    }

    #[test]
    fn test_server_total_wins() {
        let plan = cash_plan(Discount::None, 2500);
        let receipt = Receipt::new(&plan, &confirmation(2150, Some(350)), store(), issued_at());
        assert_eq!(receipt.total.cents(), 2150);
        assert!(receipt.render(40).contains("$21.50"));
    }

    #[test]
    fn test_lines_fit_paper_and_minimum_width() {
        let product = Product::new(
            2,
            "An Extremely Long Product Name That Will Not Fit On Paper",
            Money::from_cents(123_456),
            10,
            TaxRate::from_bps(825),
        );
        let mut cart = Cart::new();
        cart.add_item(&product, 3).unwrap();
        let mut payment = PaymentState::new();
        payment.set_tendered(Money::from_cents(10_000_000));
        let customer = Customer {
            id: 1,
            name: "Grace".to_string(),
        };
        let plan = plan_checkout(&cart, &payment, Some(&customer), "deliver to the back door please", &ExactSumSettlement).unwrap();
        let receipt = Receipt::new(&plan, &confirmation(plan.totals.total.cents(), None), store(), issued_at());

        let text = receipt.render(10);
        for line in text.lines() {
            assert!(line.chars().count() <= MIN_PAPER_WIDTH, "too wide: {:?}", line);
        }
        assert!(text.contains("Customer: Grace"));
        assert!(text.contains("Notes:"));
    }

    #[test]
    fn test_card_receipt_shows_reference_and_points() {
        let product = Product::new(1, "Pen", Money::from_cents(150), 10, TaxRate::zero());
        let mut cart = Cart::new();
        cart.add_item(&product, 1).unwrap();
        let mut payment = PaymentState::new();
        payment.select(PaymentMethod::Card);
        payment.set_reference("AUTH-9").unwrap();
        let plan = plan_checkout(&cart, &payment, None, "", &ExactSumSettlement).unwrap();

        let mut confirmation = confirmation(150, None);
        confirmation.loyalty_points = Some(1);
        let text = Receipt::new(&plan, &confirmation, store(), issued_at()).render(42);

        assert!(text.contains("CARD"));
        assert!(text.contains("AUTH-9"));
        assert!(text.contains("Loyalty Points Earned:"));
        assert!(!text.contains("Amount Tendered:"));
    }
}
