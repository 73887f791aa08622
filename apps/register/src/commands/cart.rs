//! # Cart Commands
//!
//! Commands for cart manipulation, plus the customer and notes attached to
//! the sale.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Lifecycle                                       │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌──────────┐       │
//! │  │  Empty   │────►│ In Cart  │────►│ Payment  │────►│ Completed│       │
//! │  │  Cart    │     │          │     │  Panel   │     │   Sale   │       │
//! │  └──────────┘     └──────────┘     └──────────┘     └──────────┘       │
//! │       ▲                │  │              │                │             │
//! │       │           add_item│         checkout          (sale.rs)        │
//! │       │           set_quantity                                          │
//! │       │           remove_item                                           │
//! │       │                │  │                                             │
//! │       │                │  └──► hold ──► held_sale.json ──► recall ─┐   │
//! │       │                ▼                                           │   │
//! │       └─────────── clear                                 In Cart ◄─┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tracing::debug;

use till_core::validation::validate_notes;
use till_core::{CoreError, Customer, QuantityChange, ValidationError};

use crate::error::ApiError;
use crate::state::{CartResponse, SessionState};

/// Result of a quantity edit: what happened plus the updated cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantityResponse {
    pub change: QuantityChange,
    pub cart: CartResponse,
}

/// Gets the current cart contents.
pub fn get_cart(session: &SessionState) -> CartResponse {
    debug!("get_cart command");
    session.with_session(|s| CartResponse::from(s))
}

/// Adds a product from the catalog cache to the cart.
///
/// ## Behavior
/// - Product must be in the last search results (`NOT_FOUND` otherwise)
/// - Out of stock, or more than the stock on hand: `INSUFFICIENT_STOCK`
/// - If already in cart: quantity increases
/// - Price is frozen at the time the line is created
pub fn add_item(
    session: &SessionState,
    product_id: i64,
    quantity: Option<i64>,
) -> Result<CartResponse, ApiError> {
    let quantity = quantity.unwrap_or(1);
    debug!(product_id, quantity, "add_item command");

    session.with_session_mut(|s| {
        let product = s
            .find_product(product_id)
            .cloned()
            .ok_or(CoreError::ProductNotFound(product_id))?;
        s.cart.add_item(&product, quantity)?;
        Ok(CartResponse::from(&*s))
    })
}

/// Sets the quantity of a line.
///
/// ## Behavior
/// - Quantity 0 or less: removes the line
/// - More than the stock on hand: `INSUFFICIENT_STOCK` with `available`
///   set, cart unchanged
/// - Unknown product: nothing changes (`NotInCart`)
pub fn set_quantity(
    session: &SessionState,
    product_id: i64,
    quantity: i64,
) -> Result<QuantityResponse, ApiError> {
    debug!(product_id, quantity, "set_quantity command");

    session.with_session_mut(|s| {
        let change = s.cart.set_quantity(product_id, quantity)?;
        Ok(QuantityResponse {
            change,
            cart: CartResponse::from(&*s),
        })
    })
}

/// Removes a line. Removing a product that is not in the cart is a no-op.
pub fn remove_item(session: &SessionState, product_id: i64) -> CartResponse {
    debug!(product_id, "remove_item command");

    session.with_session_mut(|s| {
        s.cart.remove_item(product_id);
        CartResponse::from(&*s)
    })
}

/// Abandons the sale in progress.
///
/// Empties the cart and resets the discount, payment panel, customer and
/// notes.
pub fn clear(session: &SessionState) -> CartResponse {
    debug!("clear command");

    session.with_session_mut(|s| {
        s.clear();
        CartResponse::from(&*s)
    })
}

/// Attaches a customer to the sale, or returns to a walk-in sale with `None`.
pub fn set_customer(
    session: &SessionState,
    customer: Option<Customer>,
) -> Result<CartResponse, ApiError> {
    debug!(customer_id = ?customer.as_ref().map(|c| c.id), "set_customer command");

    if let Some(customer) = &customer {
        if customer.id <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "customer id".to_string(),
            }
            .into());
        }
        if customer.name.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "customer name".to_string(),
            }
            .into());
        }
    }

    session.with_session_mut(|s| {
        s.customer = customer;
        Ok(CartResponse::from(&*s))
    })
}

/// Sets the sale notes. Blank text clears them.
pub fn set_notes(session: &SessionState, notes: &str) -> Result<Option<String>, ApiError> {
    debug!(len = notes.len(), "set_notes command");

    let notes = validate_notes(notes)?;
    session.with_session_mut(|s| {
        s.notes = notes.clone().unwrap_or_default();
    });
    Ok(notes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::product;
    use crate::error::ErrorCode;
    use till_core::Money;

    fn session_with_catalog() -> SessionState {
        let session = SessionState::new();
        session.with_session_mut(|s| {
            s.catalog = vec![
                product(1, 1000, 5, 1000),
                product(2, 250, 0, 0),
                product(3, 199, 100, 0),
            ];
        });
        session
    }

    #[test]
    fn test_add_item_from_catalog() {
        let session = session_with_catalog();

        add_item(&session, 1, Some(2)).unwrap();
        let cart = add_item(&session, 1, None).unwrap();

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 3);
        assert_eq!(cart.totals.subtotal, Money::from_cents(3000));
        assert_eq!(cart.totals.tax, Money::from_cents(300));
    }

    #[test]
    fn test_add_unknown_product() {
        let session = session_with_catalog();
        let err = add_item(&session, 99, None).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert!(get_cart(&session).items.is_empty());
    }

    #[test]
    fn test_add_out_of_stock_leaves_cart_unchanged() {
        let session = session_with_catalog();
        add_item(&session, 1, Some(1)).unwrap();

        let err = add_item(&session, 2, Some(1)).unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(err.message, "Product 2 is out of stock");

        let cart = get_cart(&session);
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].product_id, 1);
    }

    #[test]
    fn test_set_quantity_over_stock_reports_available() {
        let session = session_with_catalog();
        add_item(&session, 1, Some(2)).unwrap();

        let err = set_quantity(&session, 1, 9).unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(err.available, Some(5));
        assert_eq!(get_cart(&session).items[0].quantity, 2);
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let session = session_with_catalog();
        add_item(&session, 1, Some(2)).unwrap();
        add_item(&session, 3, Some(1)).unwrap();

        let response = set_quantity(&session, 1, 0).unwrap();
        assert_eq!(response.change, QuantityChange::Removed);
        assert_eq!(response.cart.items.len(), 1);

        let response = set_quantity(&session, 42, 3).unwrap();
        assert_eq!(response.change, QuantityChange::NotInCart);
    }

    #[test]
    fn test_remove_and_clear() {
        let session = session_with_catalog();
        add_item(&session, 1, Some(1)).unwrap();
        add_item(&session, 3, Some(1)).unwrap();

        assert_eq!(remove_item(&session, 3).items.len(), 1);
        assert_eq!(remove_item(&session, 3).items.len(), 1);

        set_notes(&session, "call when ready").unwrap();
        let cart = clear(&session);
        assert!(cart.items.is_empty());
        assert_eq!(cart.totals.total, Money::zero());
        session.with_session(|s| assert_eq!(s.notes(), None));
    }

    #[test]
    fn test_customer_and_notes() {
        let session = SessionState::new();

        let cart = set_customer(
            &session,
            Some(Customer {
                id: 7,
                name: "Grace".to_string(),
            }),
        )
        .unwrap();
        assert_eq!(cart.customer.map(|c| c.name), Some("Grace".to_string()));

        let err = set_customer(
            &session,
            Some(Customer {
                id: 0,
                name: "Nobody".to_string(),
            }),
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        session.with_session(|s| assert_eq!(s.customer.as_ref().map(|c| c.id), Some(7)));

        assert!(set_customer(&session, None).unwrap().customer.is_none());

        assert_eq!(
            set_notes(&session, "  leave at door ").unwrap(),
            Some("leave at door".to_string())
        );
        assert!(set_notes(&session, &"n".repeat(501)).is_err());
        session.with_session(|s| assert_eq!(s.notes(), Some("leave at door")));
    }
}
