//! # Payment Commands
//!
//! The payment panel: which method is selected and what has been entered for
//! it. Nothing here talks to the backend; `checkout` validates the panel.
//!
//! ## Method Transitions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │        select_payment(..)  (any method → any method)                    │
//! │                                                                         │
//! │   ┌────────┐   ┌────────┐   ┌─────────┐   ┌─────────┐                   │
//! │   │  Cash  │◄─►│  Card  │◄─►│ Digital │◄─►│  Split  │                   │
//! │   └────────┘   └────────┘   └─────────┘   └─────────┘                   │
//! │   tendered     reference    reference     add_split_payment             │
//! │                                                                         │
//! │   Every selection empties the split list, so entering Split starts     │
//! │   from nothing and leaving it discards the legs.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tracing::debug;

use till_core::validation::validate_reference;
use till_core::{
    compute_change, ChangeDue, Money, PaymentMethod, PaymentState, SubPayment, ValidationError,
};

use crate::error::{ApiError, ErrorCode};
use crate::state::{PosSession, SessionState};

/// Payment panel as the view shows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub method: PaymentMethod,
    pub total: Money,
    pub tendered: Option<Money>,
    /// Change or shortfall against the tendered amount (cash only).
    pub change: Option<ChangeDue>,
    pub split_payments: Vec<SubPayment>,
    pub split_paid: Money,
    /// What is still owed across split legs; zero once covered.
    pub split_remaining: Money,
}

impl From<&PosSession> for PaymentResponse {
    fn from(session: &PosSession) -> Self {
        let payment: &PaymentState = &session.payment;
        let total = session.cart.total();
        let change = match (payment.method(), payment.tendered()) {
            (PaymentMethod::Cash, Some(tendered)) => Some(compute_change(tendered, total)),
            _ => None,
        };
        PaymentResponse {
            method: payment.method(),
            total,
            tendered: payment.tendered(),
            change,
            split_payments: payment.split_payments().to_vec(),
            split_paid: payment.split_paid(),
            split_remaining: (total - payment.split_paid()).clamp_non_negative(),
        }
    }
}

/// Cash change for the current cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeResponse {
    pub total: Money,
    pub tendered: Money,
    pub due: ChangeDue,
}

/// Gets the payment panel.
pub fn get_payment(session: &SessionState) -> PaymentResponse {
    debug!("get_payment command");
    session.with_session(|s| PaymentResponse::from(s))
}

/// Switches the payment method.
pub fn select_payment(session: &SessionState, method: PaymentMethod) -> PaymentResponse {
    debug!(method = %method, "select_payment command");

    session.with_session_mut(|s| {
        s.payment.select(method);
        PaymentResponse::from(&*s)
    })
}

/// Records the cash handed over.
pub fn set_tendered(session: &SessionState, tendered: Money) -> Result<PaymentResponse, ApiError> {
    debug!(tendered = %tendered, "set_tendered command");

    if tendered.is_negative() {
        return Err(ValidationError::MustBePositive {
            field: "amount tendered".to_string(),
        }
        .into());
    }

    Ok(session.with_session_mut(|s| {
        s.payment.set_tendered(tendered);
        PaymentResponse::from(&*s)
    }))
}

/// Sets the transaction reference for the selected card or digital wallet.
pub fn set_reference(session: &SessionState, reference: &str) -> Result<PaymentResponse, ApiError> {
    debug!("set_reference command");

    let reference = validate_reference(reference)?;
    session.with_session_mut(|s| {
        s.payment.set_reference(reference)?;
        Ok(PaymentResponse::from(&*s))
    })
}

/// Adds a leg to a split payment. Split must be selected.
pub fn add_split_payment(
    session: &SessionState,
    method: PaymentMethod,
    amount: Money,
    reference: Option<&str>,
) -> Result<PaymentResponse, ApiError> {
    debug!(method = %method, amount = %amount, "add_split_payment command");

    let reference = reference.map(validate_reference).transpose()?;
    session.with_session_mut(|s| {
        s.payment.add_split_payment(SubPayment {
            method,
            amount,
            reference,
        })?;
        Ok(PaymentResponse::from(&*s))
    })
}

/// Removes a split leg by its position (0-based).
pub fn remove_split_payment(
    session: &SessionState,
    index: usize,
) -> Result<PaymentResponse, ApiError> {
    debug!(index, "remove_split_payment command");

    session.with_session_mut(|s| {
        s.payment
            .remove_split_payment(index)
            .ok_or_else(|| ApiError::not_found("Split payment", &(index + 1).to_string()))?;
        Ok(PaymentResponse::from(&*s))
    })
}

/// Change owed (or shortfall) for the tendered cash against the cart total.
pub fn change(session: &SessionState) -> Result<ChangeResponse, ApiError> {
    debug!("change command");

    session.with_session(|s| {
        if s.payment.method() != PaymentMethod::Cash {
            return Err(ApiError::new(
                ErrorCode::PaymentError,
                format!("Change only applies to cash, not {}", s.payment.method()),
            ));
        }
        let tendered = s.payment.tendered().ok_or_else(|| ValidationError::Required {
            field: "amount tendered".to_string(),
        })?;
        let total = s.cart.total();
        Ok(ChangeResponse {
            total,
            tendered,
            due: compute_change(tendered, total),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::product;
    use till_core::{Discount, Percentage};

    /// Total $12.00: $10.00 × 2 at 10% tax, 50% off.
    fn session() -> SessionState {
        let session = SessionState::new();
        session.with_session_mut(|s| {
            s.cart.add_item(&product(1, 1000, 10, 1000), 2).unwrap();
            s.cart
                .apply_discount(Discount::Percentage(Percentage::from_bps(5000)))
                .unwrap();
        });
        session
    }

    #[test]
    fn test_change_and_shortfall() {
        let session = session();

        set_tendered(&session, Money::from_cents(1500)).unwrap();
        let change_due = change(&session).unwrap();
        assert_eq!(change_due.total, Money::from_cents(1200));
        assert_eq!(change_due.due, ChangeDue::Change(Money::from_cents(300)));

        let panel = set_tendered(&session, Money::from_cents(500)).unwrap();
        assert_eq!(panel.change, Some(ChangeDue::Shortfall(Money::from_cents(700))));
    }

    #[test]
    fn test_change_needs_tendered_cash() {
        let session = session();
        assert_eq!(change(&session).unwrap_err().code, ErrorCode::ValidationError);

        select_payment(&session, PaymentMethod::Card);
        assert_eq!(change(&session).unwrap_err().code, ErrorCode::PaymentError);
    }

    #[test]
    fn test_reference_for_card_only() {
        let session = session();

        let err = set_reference(&session, "AUTH-1").unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentError);

        select_payment(&session, PaymentMethod::Card);
        assert_eq!(
            set_reference(&session, "   ").unwrap_err().code,
            ErrorCode::ValidationError
        );
        set_reference(&session, " AUTH-1 ").unwrap();
    }

    #[test]
    fn test_split_list_resets_on_every_selection() {
        let session = session();
        select_payment(&session, PaymentMethod::Split);

        add_split_payment(&session, PaymentMethod::Cash, Money::from_cents(500), None).unwrap();
        let panel = add_split_payment(
            &session,
            PaymentMethod::Card,
            Money::from_cents(300),
            Some("AUTH-9"),
        )
        .unwrap();
        assert_eq!(panel.split_payments.len(), 2);
        assert_eq!(panel.split_paid, Money::from_cents(800));
        assert_eq!(panel.split_remaining, Money::from_cents(400));

        let panel = select_payment(&session, PaymentMethod::Split);
        assert!(panel.split_payments.is_empty());

        add_split_payment(&session, PaymentMethod::Cash, Money::from_cents(500), None).unwrap();
        let panel = select_payment(&session, PaymentMethod::Cash);
        assert!(panel.split_payments.is_empty());
    }

    #[test]
    fn test_split_leg_rules() {
        let session = session();

        let err = add_split_payment(&session, PaymentMethod::Cash, Money::from_cents(100), None)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentError);

        select_payment(&session, PaymentMethod::Split);
        let err = add_split_payment(&session, PaymentMethod::Card, Money::from_cents(100), None)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentError);

        let err =
            add_split_payment(&session, PaymentMethod::Cash, Money::zero(), None).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        add_split_payment(&session, PaymentMethod::Cash, Money::from_cents(100), None).unwrap();
        assert!(remove_split_payment(&session, 0).unwrap().split_payments.is_empty());
        assert_eq!(
            remove_split_payment(&session, 0).unwrap_err().code,
            ErrorCode::NotFound
        );
    }
}
