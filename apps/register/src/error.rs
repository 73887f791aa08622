//! # API Error Type
//!
//! Unified error type for register commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Register                           │
//! │                                                                         │
//! │  Terminal view                Rust commands                             │
//! │  ─────────────                ─────────────                             │
//! │                                                                         │
//! │  > pay cash 5                                                           │
//! │  > checkout                                                             │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  Result<T, ApiError>                                             │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Pricing rule? ─── CoreError::PaymentValidationFailed ──┐       │  │
//! │  │         │                                               │       │  │
//! │  │         ▼                                               ▼       │  │
//! │  │  Backend/IO? ───── ClientError::Server { .. } ──────► ApiError ─►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  ◄────────────────────────────────────────────────────────────────────  │
//! │                                                                         │
//! │  ! Insufficient amount tendered: need $7.00 more                        │
//! │    (code = "PAYMENT_ERROR")                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every failure is recoverable: the view shows the message and the session
//! is left as it was.

use serde::Serialize;
use till_client::ClientError;
use till_core::{CoreError, ValidationError};

/// Error returned from register commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "INSUFFICIENT_STOCK",
///   "message": "Not enough stock for Stapler: available 3, requested 5",
///   "available": 3
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// Stock ceiling the view should clamp a quantity input to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<i64>,
}

/// Error codes for command responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Product, held sale or receipt not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Cart operation failed (empty, too large, not recallable)
    CartError,

    /// Out of stock or requested more than is on hand
    InsufficientStock,

    /// Discount rejected by the pricing rules
    DiscountError,

    /// The backend refused the promo code
    PromoInvalid,

    /// Payment details missing or insufficient
    PaymentError,

    /// A checkout is already waiting on the backend
    CheckoutInProgress,

    /// Backend unreachable or timed out
    NetworkError,

    /// Backend answered with an error
    ServerError,

    /// Configuration is invalid
    ConfigError,

    /// Anything else (local I/O, corrupt files)
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            available: None,
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    /// Creates a cart error.
    pub fn cart(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::CartError, message)
    }

    pub fn checkout_in_progress() -> Self {
        ApiError::new(
            ErrorCode::CheckoutInProgress,
            "A checkout is already in progress",
        )
    }
}

/// Converts pricing-rule errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", &id.to_string()),
            CoreError::OutOfStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, err.to_string())
            }
            CoreError::StockExceeded { available, .. } => ApiError {
                available: Some(available),
                ..ApiError::new(ErrorCode::InsufficientStock, err.to_string())
            },
            CoreError::InvalidDiscount { reason } => ApiError::new(ErrorCode::DiscountError, reason),
            CoreError::PaymentValidationFailed { reason } => {
                ApiError::new(ErrorCode::PaymentError, reason)
            }
            CoreError::EmptyCart => ApiError::cart("Cart is empty"),
            CoreError::CartTooLarge { max } => {
                ApiError::cart(format!("Cart cannot have more than {} items", max))
            }
            CoreError::Validation(e) => e.into(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Converts client errors to API errors.
///
/// Backend messages are shown as sent; transport and local failures are
/// logged in full and replaced with a generic message.
impl From<ClientError> for ApiError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Network(e) if e.is_timeout() => {
                tracing::error!("Backend request timed out: {}", e);
                ApiError::new(
                    ErrorCode::NetworkError,
                    "The server did not respond in time. Check the sales history before retrying.",
                )
            }
            ClientError::Network(e) => {
                tracing::error!("Backend unreachable: {}", e);
                ApiError::new(ErrorCode::NetworkError, "Cannot reach the server")
            }
            ClientError::Server { status: 404, message } => {
                ApiError::new(ErrorCode::NotFound, message)
            }
            ClientError::Server { message, .. } => ApiError::new(ErrorCode::ServerError, message),
            ClientError::PromoInvalid(message) => ApiError::new(ErrorCode::PromoInvalid, message),
            ClientError::InvalidResponse(e) => {
                tracing::error!("Unexpected backend response: {}", e);
                ApiError::new(ErrorCode::ServerError, "Unexpected response from the server")
            }
            ClientError::Io(e) => {
                tracing::error!("Local file operation failed: {}", e);
                ApiError::internal("Local file operation failed")
            }
            ClientError::Json(e) => {
                tracing::error!("Stored data could not be read: {}", e);
                ApiError::internal("Stored data could not be read")
            }
            ClientError::Config(message) => ApiError::new(ErrorCode::ConfigError, message),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
