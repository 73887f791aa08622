//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Summing line totals as floats:                                         │
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │                                                                         │
//! │  Tendered 0.30 against that total reports a 0.00000000000000004        │
//! │  shortfall. Integer cents make the comparison exact.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Decimal numbers only exist at the edges: the HTTP wire format (converted
//! in `till-client`) and what the cashier types ([`Money::parse`]).
//!
//! ## Usage
//! ```rust
//! use till_core::money::Money;
//!
//! let price = Money::from_cents(1099); // $10.99
//! let doubled = price * 2;
//! assert_eq!(doubled.cents(), 2198);
//!
//! let tendered = Money::parse("20.00").unwrap();
//! assert_eq!((tendered - doubled).cents(), -198);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::{Percentage, TaxRate};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Where Money Flows
/// ```text
/// Product.price ──► LineItem.unit_price ──► LineItem.line_total
///                                               │
///                         ┌─────────────────────┤
///                         ▼                     ▼
///                   Cart.subtotal          LineItem.tax
///                         │                     │
///                         └──► subtotal + tax − discount ──► Cart.total
///                                                               │
///                                               tendered − total ──► change
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Clamps negative values to zero.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(-250).clamp_non_negative(), Money::zero());
    /// assert_eq!(Money::from_cents(250).clamp_non_negative().cents(), 250);
    /// ```
    #[inline]
    pub fn clamp_non_negative(self) -> Self {
        Money(self.0.max(0))
    }

    /// Tax on this amount, rounded half away from zero to the nearest cent.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps ± 5000) / 10000`, widened to i128 and
    /// saturated back into i64.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    /// use till_core::types::TaxRate;
    ///
    /// let line = Money::from_cents(2000);        // $20.00
    /// let tax = line.calculate_tax(TaxRate::from_bps(1000)); // 10%
    /// assert_eq!(tax.cents(), 200);
    ///
    /// // $10.00 × 8.25% = $0.825 → $0.83
    /// assert_eq!(Money::from_cents(1000).calculate_tax(TaxRate::from_bps(825)).cents(), 83);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        Money(apply_bps(self.0, rate.bps()))
    }

    /// The given percentage of this amount, rounded half away from zero.
    ///
    /// This is the discount *amount*, not the discounted price.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    /// use till_core::types::Percentage;
    ///
    /// let subtotal = Money::from_cents(2000);
    /// assert_eq!(subtotal.percentage(Percentage::from_bps(5000)).cents(), 1000);
    /// ```
    pub fn percentage(&self, pct: Percentage) -> Money {
        Money(apply_bps(self.0, pct.bps()))
    }

    /// Multiplies money by a quantity, saturating at the i64 bounds.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Formats with the given currency symbol, e.g. `£10.99` or `-€5.50`.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(-550).format_with("€"), "-€5.50");
    /// ```
    pub fn format_with(&self, symbol: &str) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}{}.{:02}", sign, symbol, self.dollars().abs(), self.cents_part())
    }

    /// Parses a cashier-entered amount such as `"15"`, `"15.5"` or `"$15.50"`.
    ///
    /// ## Rules
    /// - Optional leading currency symbol `$`, thousands separators ignored
    /// - At most two fractional digits
    /// - Must not be negative
    pub fn parse(input: &str) -> Result<Money, ValidationError> {
        let trimmed = input.trim();
        let trimmed = trimmed.strip_prefix('$').unwrap_or(trimmed);
        parse_hundredths(trimmed, "amount").map(Money)
    }
}

/// Parses a non-negative decimal with at most two fractional digits into
/// hundredths (`"12.5"` → `1250`). Shared by amounts and percentages.
pub(crate) fn parse_hundredths(input: &str, field: &str) -> Result<i64, ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: reason.to_string(),
    };

    let cleaned = input.trim().replace(',', "");
    if cleaned.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    if cleaned.starts_with('-') {
        return Err(invalid("must not be negative"));
    }

    let (whole, frac) = cleaned.split_once('.').unwrap_or((cleaned.as_str(), ""));

    if frac.len() > 2 {
        return Err(invalid("at most two decimal places"));
    }
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !all_digits(whole) || !all_digits(frac) || (whole.is_empty() && frac.is_empty()) {
        return Err(invalid("expected a number like 12.50"));
    }

    let whole: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid("value too large"))?
    };
    let frac: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().map_err(|_| invalid("bad fraction"))? * 10,
        _ => frac.parse().map_err(|_| invalid("bad fraction"))?,
    };

    whole
        .checked_mul(100)
        .and_then(|c| c.checked_add(frac))
        .ok_or_else(|| invalid("value too large"))
}

/// `amount * bps / 10000`, rounded half away from zero.
fn apply_bps(amount: i64, bps: u32) -> i64 {
    let scaled = amount as i128 * bps as i128;
    let half = if scaled < 0 { -5000 } else { 5000 };
    // i128 division truncates toward zero
    let rounded = (scaled + half) / 10000;
    rounded.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

// =============================================================================
// Trait Implementations
// =============================================================================
//
// Arithmetic saturates at the i64 bounds; it never wraps.

/// Debug-friendly display. Receipts use the configured currency symbol.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_with("$"))
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
