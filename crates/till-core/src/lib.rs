//! # till-core: Pure Business Logic for Till POS
//!
//! Cart pricing, discounts, tender validation and receipt layout as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Till POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/register (view + commands)                 │   │
//! │  │    search ──► add_item ──► select_payment ──► checkout          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ till-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌─────────┐ ┌─────────┐ │   │
//! │  │   │  money  │ │  cart   │ │ discount │ │ payment │ │ receipt │ │   │
//! │  │   └─────────┘ └─────────┘ └──────────┘ └─────────┘ └─────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO FILES • PURE FUNCTIONS               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               till-client (HTTP API, held-sale file)            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Catalog product, tax rate, percentage, customer
//! - [`money`] - Money type with integer arithmetic
//! - [`cart`] - The cart pricing engine
//! - [`discount`] - Discount variants and their resolution
//! - [`payment`] - Payment method state machine, change/shortfall
//! - [`checkout`] - Pre-submission checkout rules
//! - [`receipt`] - Plain-text receipt layout
//! - [`held`] - Held-sale snapshot
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use till_core::{Cart, Discount, Money, Percentage, Product, TaxRate};
//!
//! let product = Product::new(1, "Notebook", Money::from_cents(1000), 5, TaxRate::from_bps(1000));
//!
//! let mut cart = Cart::new();
//! cart.add_item(&product, 2).unwrap();
//! cart.apply_discount(Discount::Percentage(Percentage::from_bps(5000))).unwrap();
//!
//! let totals = cart.totals();
//! assert_eq!(totals.subtotal.cents(), 2000);
//! assert_eq!(totals.tax.cents(), 200);
//! assert_eq!(totals.discount.cents(), 1000);
//! assert_eq!(totals.total.cents(), 1200);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod checkout;
pub mod discount;
pub mod error;
pub mod held;
pub mod money;
pub mod payment;
pub mod receipt;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartTotals, LineItem, QuantityChange};
pub use checkout::{plan_checkout, CheckoutPlan};
pub use discount::{Discount, PromoDiscount, PromoValue};
pub use error::{CoreError, CoreResult, ValidationError};
pub use held::HeldSale;
pub use money::Money;
pub use payment::{
    compute_change, ChangeDue, ExactSumSettlement, PaymentMethod, PaymentSelection, PaymentState,
    SplitSettlement, SubPayment,
};
pub use receipt::{Receipt, SaleConfirmation, StoreInfo};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Minimum search query length before a catalog lookup is made.
///
/// Shorter queries show the default product list instead.
pub const MIN_SEARCH_LEN: usize = 2;

/// Maximum search query length.
pub const MAX_SEARCH_LEN: usize = 100;

/// Highest unit price a product may carry ($1,000,000.00).
pub const MAX_UNIT_PRICE: Money = Money::from_cents(100_000_000);

/// Highest quantity a single cart line may carry.
pub const MAX_LINE_QUANTITY: i64 = 10_000;
