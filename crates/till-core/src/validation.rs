//! # Validation Module
//!
//! Input validation for what the cashier types before it reaches the cart
//! or the network.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Terminal view                                                │
//! │  ├── Tokenising, number parsing (Money::parse, Percentage::parse)      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Register command                                             │
//! │  └── THIS MODULE: lengths, required fields, date ranges                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Cart / payment rules                                         │
//! │  └── stock, discount bounds, tender                                    │
//! │                                                                         │
//! │  Backend re-validates everything it receives.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use till_core::validation::{validate_promo_code, validate_search_query};
//!
//! assert_eq!(validate_search_query(" co ").unwrap().as_deref(), Some("co"));
//! assert_eq!(validate_search_query("c").unwrap(), None);
//! assert_eq!(validate_promo_code(" save5 ").unwrap(), "SAVE5");
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_LINE_QUANTITY, MAX_SEARCH_LEN, MAX_UNIT_PRICE, MIN_SEARCH_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of a card/wallet transaction reference.
pub const MAX_REFERENCE_LEN: usize = 100;

/// Maximum length of a promo code.
pub const MAX_PROMO_CODE_LEN: usize = 50;

/// Maximum length of the free-text sale notes.
pub const MAX_NOTES_LEN: usize = 500;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product search query.
///
/// ## Rules
/// - Trimmed before checking
/// - Fewer than [`MIN_SEARCH_LEN`] characters: `Ok(None)`, no lookup is made
/// - More than [`MAX_SEARCH_LEN`] characters: error
///
/// ## Returns
/// The trimmed query when a lookup should be made.
pub fn validate_search_query(query: &str) -> ValidationResult<Option<String>> {
    let query = query.trim();
    let len = query.chars().count();

    if len > MAX_SEARCH_LEN {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: MAX_SEARCH_LEN,
        });
    }

    if len < MIN_SEARCH_LEN {
        return Ok(None);
    }

    Ok(Some(query.to_string()))
}

/// Validates a card or digital wallet transaction reference.
///
/// ## Returns
/// The trimmed reference.
pub fn validate_reference(reference: &str) -> ValidationResult<String> {
    let reference = reference.trim();

    if reference.is_empty() {
        return Err(ValidationError::Required {
            field: "reference".to_string(),
        });
    }

    if reference.chars().count() > MAX_REFERENCE_LEN {
        return Err(ValidationError::TooLong {
            field: "reference".to_string(),
            max: MAX_REFERENCE_LEN,
        });
    }

    Ok(reference.to_string())
}

/// Validates a promo code.
///
/// ## Rules
/// - Must not be empty
/// - At most [`MAX_PROMO_CODE_LEN`] characters
/// - Letters, digits, hyphens and underscores only
///
/// ## Returns
/// The code trimmed and upper-cased, the form the backend stores.
pub fn validate_promo_code(code: &str) -> ValidationResult<String> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "promo code".to_string(),
        });
    }

    if code.chars().count() > MAX_PROMO_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: "promo code".to_string(),
            max: MAX_PROMO_CODE_LEN,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "promo code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(code.to_uppercase())
}

/// Validates sale notes. Blank notes become `None`.
pub fn validate_notes(notes: &str) -> ValidationResult<Option<String>> {
    let notes = notes.trim();

    if notes.chars().count() > MAX_NOTES_LEN {
        return Err(ValidationError::TooLong {
            field: "notes".to_string(),
            max: MAX_NOTES_LEN,
        });
    }

    Ok((!notes.is_empty()).then(|| notes.to_string()))
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity to add to the cart.
///
/// ## Rules
/// - Must be positive (> 0). Stock limits are checked by the cart.
/// - At most [`MAX_LINE_QUANTITY`]
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a product's unit price before it is priced into a cart.
///
/// ## Rules
/// - Not negative
/// - At most [`MAX_UNIT_PRICE`]
pub fn validate_unit_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() || price > MAX_UNIT_PRICE {
        return Err(ValidationError::InvalidFormat {
            field: "unit price".to_string(),
            reason: format!("must be between $0.00 and {}", MAX_UNIT_PRICE),
        });
    }

    Ok(())
}

// =============================================================================
// Date Validators
// =============================================================================

/// Parses a `YYYY-MM-DD` date as typed for the sales history filter.
pub fn parse_date(field: &str, input: &str) -> ValidationResult<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "expected a date like 2024-01-31".to_string(),
        }
    })
}

/// Validates a sales history range. Both ends are inclusive.
pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> ValidationResult<()> {
    if start > end {
        return Err(ValidationError::InvalidFormat {
            field: "date range".to_string(),
            reason: format!("start {} is after end {}", start, end),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_search_query() {
        assert_eq!(validate_search_query("").unwrap(), None);
        assert_eq!(validate_search_query("  a  ").unwrap(), None);
        assert_eq!(validate_search_query("ab").unwrap().as_deref(), Some("ab"));
        assert!(validate_search_query(&"x".repeat(100)).is_ok());
        assert!(validate_search_query(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_reference() {
        assert_eq!(validate_reference("  AUTH-77 ").unwrap(), "AUTH-77");
        assert!(validate_reference("   ").is_err());
        assert!(validate_reference(&"R".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_promo_code() {
        assert_eq!(validate_promo_code("summer_10").unwrap(), "SUMMER_10");
        assert!(validate_promo_code("").is_err());
        assert!(validate_promo_code("SAVE 5").is_err());
        assert!(validate_promo_code(&"P".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_notes() {
        assert_eq!(validate_notes("   ").unwrap(), None);
        assert_eq!(validate_notes(" gift wrap ").unwrap().as_deref(), Some("gift wrap"));
        assert!(validate_notes(&"n".repeat(501)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_LINE_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
        assert!(validate_quantity(MAX_LINE_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_unit_price() {
        assert!(validate_unit_price(Money::zero()).is_ok());
        assert!(validate_unit_price(MAX_UNIT_PRICE).is_ok());
        assert!(validate_unit_price(Money::from_cents(-500)).is_err());
        assert!(validate_unit_price(MAX_UNIT_PRICE + Money::from_cents(1)).is_err());
    }

    #[test]
    fn test_dates() {
        let start = parse_date("start", "2024-01-01").unwrap();
        let end = parse_date("end", " 2024-01-31 ").unwrap();
        assert!(validate_date_range(start, end).is_ok());
        assert!(validate_date_range(end, start).is_err());
        assert!(validate_date_range(start, start).is_ok());
        assert!(parse_date("start", "01/02/2024").is_err());
    }
}
