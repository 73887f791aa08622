//! # Held Sale Commands
//!
//! Park the sale in progress to serve someone else, then bring it back.
//! There is one slot: holding again replaces what was held.
//!
//! ```text
//! ┌───────────────┐   hold    ┌──────────────────┐   recall   ┌───────────────┐
//! │ cart, customer│──────────►│  held_sale.json  │───────────►│ empty session │
//! │ discount,notes│           │  (one snapshot)  │  (deleted) │ gets it back  │
//! └───────────────┘           └──────────────────┘            └───────────────┘
//!   session cleared
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use till_client::HeldSaleStore;
use till_core::HeldSale;

use crate::error::ApiError;
use crate::state::{CartResponse, SessionState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldResponse {
    pub item_count: usize,
    pub held_at: DateTime<Utc>,
}

/// Saves the sale in progress and starts a fresh one.
///
/// Fails on an empty cart. The payment panel is not held.
pub fn hold(session: &SessionState, store: &HeldSaleStore) -> Result<HoldResponse, ApiError> {
    debug!("hold command");

    session.with_session_mut(|s| {
        let held = HeldSale::capture(&s.cart, s.customer.as_ref(), s.notes(), Utc::now())?;
        store.save(&held)?;
        s.clear();

        info!(items = held.item_count(), "Sale held");
        Ok(HoldResponse {
            item_count: held.item_count(),
            held_at: held.held_at,
        })
    })
}

/// Restores the held sale into the current, empty, session.
///
/// ## Behavior
/// - Cart not empty: `CART_ERROR`, nothing changes
/// - Nothing held: `NOT_FOUND`
/// - Otherwise the snapshot is deleted and its cart, discount, customer and
///   notes become the current sale
pub fn recall(session: &SessionState, store: &HeldSaleStore) -> Result<CartResponse, ApiError> {
    debug!("recall command");

    session.with_session_mut(|s| {
        if !s.cart.is_empty() {
            return Err(ApiError::cart(
                "Finish or clear the current sale before recalling a held one",
            ));
        }

        let held = store
            .load()?
            .ok_or_else(|| ApiError::not_found("Held sale", "none saved"))?;
        store.clear()?;

        s.cart = held.to_cart();
        s.customer = held.customer.clone();
        s.notes = held.notes.clone().unwrap_or_default();

        info!(items = held.item_count(), held_at = %held.held_at, "Held sale recalled");
        Ok(CartResponse::from(&*s))
    })
}
