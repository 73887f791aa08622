//! # Domain Types
//!
//! Value types shared by the pricing engine and the client layer.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    TaxRate      │   │   Percentage    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (i64)       │   │  bps (u32)      │   │  bps (u32)      │       │
//! │  │  sku            │   │  1000 = 10%     │   │  5000 = 50%     │       │
//! │  │  price (Money)  │   └─────────────────┘   └─────────────────┘       │
//! │  │  stock          │                                                    │
//! │  │  tax_rate       │   ┌─────────────────┐                              │
//! │  └─────────────────┘   │    Customer     │                              │
//! │                        │  id, name       │                              │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Products are identified by the backend's integer id; the register never
//! mints identifiers of its own.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::{parse_hundredths, Money};

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 825 bps = 8.25%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_bps(f, self.0)
    }
}

// =============================================================================
// Percentage
// =============================================================================

/// A discount percentage in basis points.
///
/// Deliberately unbounded: a cashier can type `150`, and it is the discount
/// resolution that rejects it (see [`crate::discount`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Percentage(u32);

impl Percentage {
    /// 100% in basis points.
    pub const FULL_BPS: u32 = 10_000;

    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Percentage(bps)
    }

    /// 100%.
    #[inline]
    pub const fn full() -> Self {
        Percentage(Self::FULL_BPS)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// True when the percentage is above 100%.
    #[inline]
    pub const fn exceeds_full(&self) -> bool {
        self.0 > Self::FULL_BPS
    }

    /// Parses cashier input such as `"10"`, `"12.5"` or `"12.5%"`.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::types::Percentage;
    ///
    /// assert_eq!(Percentage::parse("12.5%").unwrap().bps(), 1250);
    /// assert!(Percentage::parse("ten").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Percentage, ValidationError> {
        let trimmed = input.trim();
        let trimmed = trimmed.strip_suffix('%').unwrap_or(trimmed);
        let hundredths = parse_hundredths(trimmed, "percentage")?;
        u32::try_from(hundredths)
            .map(Percentage)
            .map_err(|_| ValidationError::OutOfRange {
                field: "percentage".to_string(),
                min: 0,
                max: i64::from(u32::MAX),
            })
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_bps(f, self.0)
    }
}

/// Writes basis points as a trimmed percentage: 1000 → `10%`, 825 → `8.25%`.
fn write_bps(f: &mut fmt::Formatter<'_>, bps: u32) -> fmt::Result {
    let whole = bps / 100;
    let frac = bps % 100;
    if frac == 0 {
        write!(f, "{}%", whole)
    } else if frac % 10 == 0 {
        write!(f, "{}.{}%", whole, frac / 10)
    } else {
        write!(f, "{}.{:02}%", whole, frac)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog entry as returned by product search.
///
/// `stock` is the on-hand quantity at search time; the cart uses it as the
/// ceiling for the line's quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub sku: String,
    pub barcode: Option<String>,
    pub price: Money,
    pub stock: i64,
    pub tax_rate: TaxRate,
    pub category: Option<String>,
}

impl Product {
    /// Builds a product with the fields the pricing engine cares about.
    ///
    /// The SKU defaults to `SKU-<id>`.
    pub fn new(
        id: i64,
        name: impl Into<String>,
        price: Money,
        stock: i64,
        tax_rate: TaxRate,
    ) -> Self {
        Product {
            id,
            name: name.into(),
            sku: format!("SKU-{}", id),
            barcode: None,
            price,
            stock,
            tax_rate,
            category: None,
        }
    }

    #[inline]
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Low-stock threshold used by the view to flag products.
    pub const LOW_STOCK: i64 = 10;

    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock <= Self::LOW_STOCK
    }
}

// =============================================================================
// Customer
// =============================================================================

/// The customer attached to a sale. No customer means a walk-in sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    pub id: i64,
    pub name: String,
}

// =============================================================================
// Unit Tests
// =============================================================================
