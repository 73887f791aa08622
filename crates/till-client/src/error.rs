//! # Client Error Types
//!
//! Everything that can go wrong between the register and the outside world.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Client Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │   Transport     │  │    Backend      │  │     Local               │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Network        │  │  Server         │  │  Io                     │ │
//! │  │  (timeout,      │  │  PromoInvalid   │  │  Json                   │ │
//! │  │   refused)      │  │  InvalidResponse│  │  Config                 │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// The request never got a response (refused, timed out, DNS).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    // =========================================================================
    // Backend Errors
    // =========================================================================
    /// Non-2xx response, with the backend's message when it sent one.
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The promo validation endpoint rejected the code.
    #[error("Promo code rejected: {0}")]
    PromoInvalid(String),

    /// A 2xx response that does not match the contract.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    // =========================================================================
    // Local Errors
    // =========================================================================
    /// Held-sale or config file access failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Held-sale snapshot could not be (de)serialised.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration is unreadable or invalid.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::Config(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::Config(format!("invalid URL: {}", err))
    }
}

impl ClientError {
    /// True when the backend could not be reached at all.
    pub fn is_network(&self) -> bool {
        matches!(self, ClientError::Network(_))
    }

    /// True for request timeouts.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Network(e) if e.is_timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = ClientError::Server {
            status: 400,
            message: "No open cash register".to_string(),
        };
        assert_eq!(err.to_string(), "Server error (400): No open cash register");
        assert!(!err.is_network());

        let err: ClientError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, ClientError::Config(_)));
    }
}
