//! # Payment
//!
//! Payment method selection, per-method validation and cash change.
//!
//! ## Payment Method State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │        select(Card)              select(Digital)                        │
//! │   ┌──────┐ ───────────► ┌──────┐ ─────────────► ┌─────────┐            │
//! │   │ Cash │              │ Card │                │ Digital │            │
//! │   └──────┘ ◄─────────── └──────┘ ◄───────────── └─────────┘            │
//! │      ▲  │  select(Cash)    ▲                        │                   │
//! │      │  │                  │ select(..)             │ select(Split)     │
//! │      │  ▼                  │                        ▼                   │
//! │      │ ┌───────┐ ──────────┘                   ┌───────┐              │
//! │      └─┤ Split │ ◄──────────────────────────── │ Split │              │
//! │        └───────┘                               └───────┘              │
//! │                                                                         │
//! │  Every selection empties the split list: entering Split starts a fresh │
//! │  one, leaving Split discards it.                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cash tendered and card/digital references are kept per method, so
//! flipping between methods does not lose what the cashier typed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PaymentMethod {
    /// Physical cash; change is given back.
    #[default]
    Cash,
    /// Card on an external terminal; needs the terminal's reference.
    Card,
    /// Digital wallet; needs the wallet transaction reference.
    Digital,
    /// Several sub-payments adding up to the total.
    Split,
}

impl PaymentMethod {
    /// Wire name, also used on receipts (upper-cased).
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Digital => "digital",
            PaymentMethod::Split => "split",
        }
    }

    /// Whether this method needs a transaction reference.
    pub fn needs_reference(&self) -> bool {
        matches!(self, PaymentMethod::Card | PaymentMethod::Digital)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" | "credit" | "debit" => Ok(PaymentMethod::Card),
            "digital" | "wallet" => Ok(PaymentMethod::Digital),
            "split" => Ok(PaymentMethod::Split),
            other => Err(ValidationError::InvalidFormat {
                field: "payment method".to_string(),
                reason: format!("unknown method '{}', expected cash, card, digital or split", other),
            }),
        }
    }
}

// =============================================================================
// Selections
// =============================================================================

/// One leg of a split payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SubPayment {
    pub method: PaymentMethod,
    pub amount: Money,
    pub reference: Option<String>,
}

/// The payment details submitted with a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "method", rename_all = "snake_case")]
#[ts(export)]
pub enum PaymentSelection {
    Cash { tendered: Money },
    Card { reference: String },
    Digital { reference: String },
    Split { payments: Vec<SubPayment> },
}

impl PaymentSelection {
    pub fn method(&self) -> PaymentMethod {
        match self {
            PaymentSelection::Cash { .. } => PaymentMethod::Cash,
            PaymentSelection::Card { .. } => PaymentMethod::Card,
            PaymentSelection::Digital { .. } => PaymentMethod::Digital,
            PaymentSelection::Split { .. } => PaymentMethod::Split,
        }
    }
}

// =============================================================================
// Change
// =============================================================================

/// Result of comparing cash tendered against the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", content = "amount", rename_all = "snake_case")]
#[ts(export)]
pub enum ChangeDue {
    /// Tendered covers the total; this much goes back to the customer.
    Change(Money),
    /// Tendered falls short by this much.
    Shortfall(Money),
}

/// Change owed for a cash payment, or the shortfall. Never a negative change.
///
/// ## Example
/// ```rust
/// use till_core::{compute_change, ChangeDue, Money};
///
/// let total = Money::from_cents(1200);
/// assert_eq!(compute_change(Money::from_cents(1500), total), ChangeDue::Change(Money::from_cents(300)));
/// assert_eq!(compute_change(Money::from_cents(500), total), ChangeDue::Shortfall(Money::from_cents(700)));
/// ```
pub fn compute_change(tendered: Money, total: Money) -> ChangeDue {
    if tendered >= total {
        ChangeDue::Change(tendered - total)
    } else {
        ChangeDue::Shortfall(total - tendered)
    }
}

// =============================================================================
// Split Settlement
// =============================================================================

/// Decides whether a list of split sub-payments settles a total.
///
/// This is the extension point for split tender rules. The register ships
/// with [`ExactSumSettlement`]; deployments needing over-tender on a cash
/// leg or partial settlement plug in their own.
pub trait SplitSettlement: Send + Sync {
    fn settle(&self, payments: &[SubPayment], total: Money) -> CoreResult<()>;
}

/// Sub-payments must add up to the total exactly.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactSumSettlement;

impl SplitSettlement for ExactSumSettlement {
    fn settle(&self, payments: &[SubPayment], total: Money) -> CoreResult<()> {
        if payments.is_empty() {
            return Err(CoreError::payment("Split payment needs at least one payment"));
        }
        let paid: Money = payments.iter().map(|p| p.amount).sum();
        if paid != total {
            return Err(CoreError::payment(format!(
                "Split payments total {} but sale total is {}",
                paid, total
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Payment State
// =============================================================================

/// The payment panel: current method plus what has been entered for each.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentState {
    method: PaymentMethod,
    tendered: Option<Money>,
    card_reference: String,
    digital_reference: String,
    split: Vec<SubPayment>,
}

impl PaymentState {
    pub fn new() -> Self {
        PaymentState::default()
    }

    pub fn method(&self) -> PaymentMethod {
        self.method
    }

    /// Switches method. The split list is always emptied.
    pub fn select(&mut self, method: PaymentMethod) {
        self.method = method;
        self.split.clear();
    }

    pub fn set_tendered(&mut self, tendered: Money) {
        self.tendered = Some(tendered);
    }

    pub fn tendered(&self) -> Option<Money> {
        self.tendered
    }

    /// Sets the transaction reference for the current card/digital method.
    pub fn set_reference(&mut self, reference: impl Into<String>) -> CoreResult<()> {
        let reference = reference.into();
        match self.method {
            PaymentMethod::Card => self.card_reference = reference,
            PaymentMethod::Digital => self.digital_reference = reference,
            other => {
                return Err(CoreError::payment(format!(
                    "{} payments take no reference",
                    other
                )))
            }
        }
        Ok(())
    }

    /// Adds a split leg. Only valid while Split is selected.
    pub fn add_split_payment(&mut self, payment: SubPayment) -> CoreResult<()> {
        if self.method != PaymentMethod::Split {
            return Err(CoreError::payment("Select split payment first"));
        }
        if payment.method == PaymentMethod::Split {
            return Err(CoreError::payment("A split leg cannot itself be split"));
        }
        if !payment.amount.is_positive() {
            return Err(ValidationError::MustBePositive {
                field: "payment amount".to_string(),
            }
            .into());
        }
        let has_reference = payment
            .reference
            .as_deref()
            .is_some_and(|r| !r.trim().is_empty());
        if payment.method.needs_reference() && !has_reference {
            return Err(CoreError::payment(format!(
                "{} leg needs a transaction reference",
                payment.method
            )));
        }
        self.split.push(payment);
        Ok(())
    }

    /// Removes a split leg by position; returns it if it existed.
    pub fn remove_split_payment(&mut self, index: usize) -> Option<SubPayment> {
        (index < self.split.len()).then(|| self.split.remove(index))
    }

    pub fn split_payments(&self) -> &[SubPayment] {
        &self.split
    }

    /// Sum of the split legs entered so far.
    pub fn split_paid(&self) -> Money {
        self.split.iter().map(|p| p.amount).sum()
    }

    /// Resets to a fresh Cash panel.
    pub fn reset(&mut self) {
        *self = PaymentState::default();
    }

    /// Validates the current method against `total` and returns what will be
    /// submitted.
    ///
    /// ## Rules
    /// - Cash: tendered ≥ total
    /// - Card / Digital: non-blank reference
    /// - Split: delegated to `settlement`
    pub fn validate(&self, total: Money, settlement: &dyn SplitSettlement) -> CoreResult<PaymentSelection> {
        match self.method {
            PaymentMethod::Cash => {
                let tendered = self.tendered.unwrap_or_default();
                match compute_change(tendered, total) {
                    ChangeDue::Change(_) => Ok(PaymentSelection::Cash { tendered }),
                    ChangeDue::Shortfall(short) => Err(CoreError::payment(format!(
                        "Insufficient amount tendered: need {} more",
                        short
                    ))),
                }
            }
            PaymentMethod::Card => {
                let reference = self.card_reference.trim();
                if reference.is_empty() {
                    return Err(CoreError::payment("Card transaction reference is required"));
                }
                Ok(PaymentSelection::Card {
                    reference: reference.to_string(),
                })
            }
            PaymentMethod::Digital => {
                let reference = self.digital_reference.trim();
                if reference.is_empty() {
                    return Err(CoreError::payment("Digital wallet reference is required"));
                }
                Ok(PaymentSelection::Digital {
                    reference: reference.to_string(),
                })
            }
            PaymentMethod::Split => {
                settlement.settle(&self.split, total)?;
                Ok(PaymentSelection::Split {
                    payments: self.split.clone(),
                })
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
