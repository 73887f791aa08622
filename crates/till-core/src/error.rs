//! # Error Types
//!
//! Domain-specific error types for till-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  till-core errors (this file)                                           │
//! │  ├── CoreError        - Cart, discount and tender rule violations      │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  till-client errors (separate crate)                                    │
//! │  └── ClientError      - Network, server and promo failures             │
//! │                                                                         │
//! │  register errors (in app)                                               │
//! │  └── ApiError         - What the view sees (code + message)            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ─┐                                   │
//! │                        ClientError ─┴──► ApiError → Notification       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant is recoverable: the operation that produced it has left the
//! cart exactly as it was.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by the pricing engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The product is not in the current catalog results.
    #[error("Product not found: {0}")]
    ProductNotFound(i64),

    /// The product has no stock at all.
    ///
    /// ## User Workflow
    /// ```text
    /// Click product (stock: 0)
    ///      │
    ///      ▼
    /// OutOfStock { name: "Stapler" }
    ///      │
    ///      ▼
    /// UI shows: "Stapler is out of stock"
    /// ```
    #[error("{name} is out of stock")]
    OutOfStock { product_id: i64, name: String },

    /// The requested quantity would exceed the stock on hand.
    ///
    /// `available` is the ceiling the view should clamp its input to.
    #[error("Not enough stock for {name}: available {available}, requested {requested}")]
    StockExceeded {
        product_id: i64,
        name: String,
        available: i64,
        requested: i64,
    },

    /// Percentage above 100 or fixed amount above the subtotal.
    #[error("Invalid discount: {reason}")]
    InvalidDiscount { reason: String },

    /// Missing or insufficient payment details for the selected method.
    #[error("Payment validation failed: {reason}")]
    PaymentValidationFailed { reason: String },

    /// Checkout or hold attempted with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Cart has exceeded maximum allowed distinct lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Shorthand for a payment validation failure.
    pub fn payment(reason: impl Into<String>) -> Self {
        CoreError::PaymentValidationFailed {
            reason: reason.into(),
        }
    }

    /// Shorthand for a rejected discount.
    pub fn discount(reason: impl Into<String>) -> Self {
        CoreError::InvalidDiscount {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any business rule runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. unparseable amount or date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
