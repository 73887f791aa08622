//! # Held Sale
//!
//! A parked cart. The register keeps exactly one: holding a new sale
//! replaces whatever was held before.
//!
//! ```text
//!   hold()                                   recall()
//!   ──────                                   ────────
//!   Cart + customer + notes                  HeldSale
//!        │                                       │
//!        ▼                                       ▼
//!   HeldSale::capture ──► store (1 slot) ──► into_cart ──► empty session
//!        │
//!        ▼
//!   session cleared
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::{Cart, LineItem};
use crate::discount::Discount;
use crate::error::{CoreError, CoreResult};
use crate::types::Customer;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct HeldSale {
    pub items: Vec<LineItem>,
    pub customer: Option<Customer>,
    pub discount: Discount,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub held_at: DateTime<Utc>,
}

impl HeldSale {
    /// Snapshots the sale in progress. Fails on an empty cart.
    pub fn capture(
        cart: &Cart,
        customer: Option<&Customer>,
        notes: Option<&str>,
        held_at: DateTime<Utc>,
    ) -> CoreResult<Self> {
        if cart.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        Ok(HeldSale {
            items: cart.items().to_vec(),
            customer: customer.cloned(),
            discount: cart.discount().clone(),
            notes: notes.map(str::to_string),
            held_at,
        })
    }

    /// Rebuilds the cart. The discount comes back as it was held; a fixed
    /// amount that no longer fits is capped by the cart's totals.
    pub fn to_cart(&self) -> Cart {
        Cart::from_parts(self.items.clone(), self.discount.clone())
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}
