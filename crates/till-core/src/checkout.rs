//! # Checkout Planning
//!
//! The last pure step before a sale is submitted: check the cart and the
//! payment panel, and freeze everything the submission and the receipt need.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Cart ─────────┐                                                       │
//! │   PaymentState ─┼──► plan_checkout() ──► CheckoutPlan ──► POST sale    │
//! │   Customer ─────┤         │                                   │         │
//! │   Notes ────────┘         │                                   ▼         │
//! │                           ▼                          SaleConfirmation   │
//! │                 EmptyCart /                                   │         │
//! │                 PaymentValidationFailed                       ▼         │
//! │                 (nothing submitted)               Receipt::new(plan, ..)│
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::{Cart, CartTotals, LineItem};
use crate::discount::Discount;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::payment::{compute_change, ChangeDue, PaymentSelection, PaymentState, SplitSettlement};
use crate::types::Customer;
use crate::validation::validate_notes;

/// A validated sale, ready for submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutPlan {
    pub lines: Vec<LineItem>,
    pub totals: CartTotals,
    pub discount: Discount,
    pub payment: PaymentSelection,
    pub customer: Option<Customer>,
    pub notes: Option<String>,
    /// Change to hand back; only set for cash.
    pub change: Option<Money>,
}

impl CheckoutPlan {
    /// Cash tendered, if paying cash.
    pub fn tendered(&self) -> Option<Money> {
        match &self.payment {
            PaymentSelection::Cash { tendered } => Some(*tendered),
            _ => None,
        }
    }
}

/// Checks the sale and freezes it into a [`CheckoutPlan`].
///
/// ## Rules (first failure wins)
/// 1. Cart must not be empty → `EmptyCart`
/// 2. Notes must fit → `Validation`
/// 3. Payment must validate against the cart total → `PaymentValidationFailed`
pub fn plan_checkout(
    cart: &Cart,
    payment: &PaymentState,
    customer: Option<&Customer>,
    notes: &str,
    split_policy: &dyn SplitSettlement,
) -> CoreResult<CheckoutPlan> {
    if cart.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    let notes = validate_notes(notes)?;
    let totals = cart.totals();
    let payment = payment.validate(totals.total, split_policy)?;

    let change = match &payment {
        PaymentSelection::Cash { tendered } => match compute_change(*tendered, totals.total) {
            ChangeDue::Change(change) => Some(change),
            ChangeDue::Shortfall(_) => None,
        },
        _ => None,
    };

    Ok(CheckoutPlan {
        lines: cart.items().to_vec(),
        totals,
        discount: cart.discount().clone(),
        payment,
        customer: customer.cloned(),
        notes,
        change,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::{ExactSumSettlement, PaymentMethod};
    use crate::types::{Percentage, Product, TaxRate};

    fn cart_of_twenty_two() -> Cart {
        let product = Product::new(1, "Notebook", Money::from_cents(1000), 10, TaxRate::from_bps(1000));
        let mut cart = Cart::new();
        cart.add_item(&product, 2).unwrap();
        cart
    }

    #[test]
    fn test_empty_cart_rejected() {
        let err = plan_checkout(
            &Cart::new(),
            &PaymentState::new(),
            None,
            "",
            &ExactSumSettlement,
        )
        .unwrap_err();
        assert_eq!(err, CoreError::EmptyCart);
    }

    #[test]
    fn test_cash_plan_carries_change() {
        let cart = cart_of_twenty_two();
        let mut payment = PaymentState::new();
        payment.set_tendered(Money::from_cents(2500));

        let plan = plan_checkout(&cart, &payment, None, " thanks ", &ExactSumSettlement).unwrap();
        assert_eq!(plan.totals.total.cents(), 2200);
        assert_eq!(plan.change, Some(Money::from_cents(300)));
        assert_eq!(plan.tendered(), Some(Money::from_cents(2500)));
        assert_eq!(plan.notes.as_deref(), Some("thanks"));
        assert_eq!(plan.lines.len(), 1);
    }

    #[test]
    fn test_insufficient_cash_rejected() {
        let cart = cart_of_twenty_two();
        let mut payment = PaymentState::new();
        payment.set_tendered(Money::from_cents(500));

        let err = plan_checkout(&cart, &payment, None, "", &ExactSumSettlement).unwrap_err();
        assert!(matches!(err, CoreError::PaymentValidationFailed { .. }));
    }

    #[test]
    fn test_card_plan_has_no_change() {
        let mut cart = cart_of_twenty_two();
        cart.apply_discount(Discount::Percentage(Percentage::from_bps(5000)))
            .unwrap();
        let mut payment = PaymentState::new();
        payment.select(PaymentMethod::Card);
        payment.set_reference("AUTH-1").unwrap();
        let customer = Customer {
            id: 9,
            name: "Ada".to_string(),
        };

        let plan = plan_checkout(&cart, &payment, Some(&customer), "", &ExactSumSettlement).unwrap();
        assert_eq!(plan.totals.total.cents(), 1200);
        assert_eq!(plan.change, None);
        assert_eq!(plan.notes, None);
        assert_eq!(plan.customer.map(|c| c.id), Some(9));
        assert_eq!(plan.discount.kind(), "percentage");
    }
}
