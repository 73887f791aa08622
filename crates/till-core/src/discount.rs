//! # Discounts
//!
//! The four discount shapes a sale can carry and how each resolves to an
//! amount against the cart subtotal.
//!
//! ## Resolution Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Discount              Amount                       Rejected when       │
//! │  ────────────────────  ───────────────────────────  ─────────────────   │
//! │  None                  0                            never               │
//! │  Percentage(p)         subtotal × p / 100           p > 100%            │
//! │  FixedAmount(v)        v                            v > subtotal        │
//! │  PromoCode{amount}     amount (server-resolved)     never (trusted)     │
//! │                                                                         │
//! │  Every resolved amount is capped at the subtotal.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Discounts are applied after tax: tax is always computed per line on the
//! undiscounted amount.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Percentage;

/// The discount currently applied to a cart.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
#[ts(export)]
pub enum Discount {
    #[default]
    None,
    Percentage(Percentage),
    FixedAmount(Money),
    PromoCode(PromoDiscount),
}

/// A promo code as resolved by the backend's validation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PromoDiscount {
    pub code: String,
    /// What the promo is worth on paper (10% off, $5 off).
    pub value: PromoValue,
    /// What the backend computed against the subtotal it was sent.
    pub amount: Money,
    pub description: Option<String>,
}

/// The nominal value of a promo code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
#[ts(export)]
pub enum PromoValue {
    Percentage(Percentage),
    Fixed(Money),
}

impl Discount {
    /// Resolves the discount amount, rejecting out-of-range values.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::{Discount, Money, Percentage};
    ///
    /// let subtotal = Money::from_cents(2000);
    /// let half = Discount::Percentage(Percentage::from_bps(5000));
    /// assert_eq!(half.resolve(subtotal).unwrap().cents(), 1000);
    ///
    /// let too_much = Discount::FixedAmount(Money::from_cents(2500));
    /// assert!(too_much.resolve(subtotal).is_err());
    /// ```
    pub fn resolve(&self, subtotal: Money) -> CoreResult<Money> {
        match self {
            Discount::None => Ok(Money::zero()),
            Discount::Percentage(pct) => {
                if pct.exceeds_full() {
                    return Err(CoreError::discount("percentage cannot exceed 100%"));
                }
                Ok(subtotal.percentage(*pct).min(subtotal))
            }
            Discount::FixedAmount(value) => {
                if value.is_negative() {
                    return Err(CoreError::discount("amount cannot be negative"));
                }
                if *value > subtotal {
                    return Err(CoreError::discount(format!(
                        "amount {} cannot exceed subtotal {}",
                        value, subtotal
                    )));
                }
                Ok(*value)
            }
            Discount::PromoCode(promo) => Ok(promo.amount.clamp_non_negative().min(subtotal)),
        }
    }

    /// The amount this discount takes off a cart with the given subtotal.
    ///
    /// Never fails: a discount that no longer fits (the cart shrank after a
    /// fixed discount was applied) is capped at the subtotal.
    pub fn amount_for(&self, subtotal: Money) -> Money {
        let subtotal = subtotal.clamp_non_negative();
        match self {
            Discount::None => Money::zero(),
            Discount::Percentage(pct) => subtotal.percentage(*pct).min(subtotal),
            Discount::FixedAmount(value) => value.clamp_non_negative().min(subtotal),
            Discount::PromoCode(promo) => promo.amount.clamp_non_negative().min(subtotal),
        }
    }

    /// Collapses zero-valued discounts to `None`.
    pub fn normalized(self) -> Discount {
        match &self {
            Discount::Percentage(pct) if pct.bps() == 0 => Discount::None,
            Discount::FixedAmount(value) if value.is_zero() => Discount::None,
            _ => self,
        }
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, Discount::None)
    }

    /// Wire name of the discount type.
    pub fn kind(&self) -> &'static str {
        match self {
            Discount::None => "none",
            Discount::Percentage(_) => "percentage",
            Discount::FixedAmount(_) => "fixed",
            Discount::PromoCode(_) => "promo_code",
        }
    }

    /// The promo code, if this is a promo discount.
    pub fn code(&self) -> Option<&str> {
        match self {
            Discount::PromoCode(promo) => Some(promo.code.as_str()),
            _ => None,
        }
    }
}

/// Receipt label, e.g. `Discount (10%)` or `Promo SAVE5`.
impl fmt::Display for Discount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discount::None => write!(f, "No discount"),
            Discount::Percentage(pct) => write!(f, "Discount ({})", pct),
            Discount::FixedAmount(_) => write!(f, "Discount"),
            Discount::PromoCode(promo) => write!(f, "Promo {}", promo.code),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
