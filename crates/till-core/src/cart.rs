//! # Cart Pricing Engine
//!
//! The ordered list of line items for the sale in progress, the discount
//! applied to it, and the totals derived from both.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  View Action              Cart Method             State Change          │
//! │  ───────────              ───────────             ────────────          │
//! │                                                                         │
//! │  Click product ──────────► add_item() ──────────► push or qty += n     │
//! │                                                                         │
//! │  Edit quantity ──────────► set_quantity() ──────► qty = n (0 removes)  │
//! │                                                                         │
//! │  Click remove ───────────► remove_item() ───────► retain(id != x)      │
//! │                                                                         │
//! │  Apply discount ─────────► apply_discount() ────► discount = d         │
//! │                                                                         │
//! │  Any change ─────────────► totals() ────────────► (read only)          │
//! │                                                                         │
//! │  A failed operation never changes the cart.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Totals
//! ```text
//! subtotal = Σ unit_price × quantity
//! tax      = Σ round(unit_price × quantity × tax_rate)      (per line)
//! discount = discount.amount_for(subtotal)                  (≤ subtotal)
//! total    = max(0, subtotal + tax − discount)
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::discount::Discount;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Product, TaxRate};
use crate::validation::{validate_quantity, validate_unit_price};
use crate::{MAX_CART_ITEMS, MAX_LINE_QUANTITY};

// =============================================================================
// Line Item
// =============================================================================

/// One product entry in the cart.
///
/// Name, price and tax rate are frozen when the product is first added, so
/// a later search returning a new price does not reprice the cart.
/// `stock_limit` is refreshed on every add.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    pub product_id: i64,
    pub name: String,
    pub sku: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub tax_rate: TaxRate,
    pub stock_limit: i64,
}

impl LineItem {
    fn from_product(product: &Product, quantity: i64) -> Self {
        LineItem {
            product_id: product.id,
            name: product.name.clone(),
            sku: product.sku.clone(),
            unit_price: product.price,
            quantity,
            tax_rate: product.tax_rate,
            stock_limit: product.stock,
        }
    }

    /// Unit price × quantity.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    /// Tax on the undiscounted line total.
    #[inline]
    pub fn tax(&self) -> Money {
        self.line_total().calculate_tax(self.tax_rate)
    }
}

// =============================================================================
// Quantity Change
// =============================================================================

/// What `set_quantity` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum QuantityChange {
    Updated,
    Removed,
    /// The product id was not in the cart; nothing changed.
    NotInCart,
}

// =============================================================================
// Cart
// =============================================================================

/// The shopping cart.
///
/// ## Invariants
/// - Lines are unique by `product_id` and kept in add order
/// - `1 <= quantity <= stock_limit` for every line
/// - At most [`MAX_CART_ITEMS`] lines
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    items: Vec<LineItem>,
    discount: Discount,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart::default()
    }

    /// Rebuilds a cart from previously captured lines, e.g. a held sale.
    ///
    /// Lines with a non-positive quantity or an out-of-range price are
    /// dropped, duplicate product ids are merged, and each quantity is
    /// clamped to its `stock_limit`, so the result upholds the cart
    /// invariants whatever the snapshot contained.
    pub fn from_parts(items: Vec<LineItem>, discount: Discount) -> Self {
        let mut cart = Cart::new();
        let usable = items
            .into_iter()
            .filter(|l| l.quantity > 0 && validate_unit_price(l.unit_price).is_ok());
        for line in usable {
            match cart.position(line.product_id) {
                Some(idx) => {
                    let item = &mut cart.items[idx];
                    item.quantity = item.quantity.saturating_add(line.quantity);
                }
                None => cart.items.push(line),
            }
        }
        for item in &mut cart.items {
            item.quantity = item.quantity.min(item.stock_limit).min(MAX_LINE_QUANTITY);
        }
        cart.items.retain(|l| l.quantity > 0);
        cart.items.truncate(MAX_CART_ITEMS);
        cart.discount = discount;
        cart
    }

    fn position(&self, product_id: i64) -> Option<usize> {
        self.items.iter().position(|i| i.product_id == product_id)
    }

    /// Adds a product or increments its quantity.
    ///
    /// ## Errors
    /// - `Validation` if `quantity` is not in `1..=MAX_LINE_QUANTITY` or the
    ///   price is negative or above [`crate::MAX_UNIT_PRICE`]
    /// - `OutOfStock` if the product has no stock
    /// - `StockExceeded` if the line would go above the product's stock
    /// - `CartTooLarge` if a new line would exceed [`MAX_CART_ITEMS`]
    ///
    /// ## Example
    /// ```rust
    /// use till_core::{Cart, Money, Product, TaxRate};
    ///
    /// let pen = Product::new(1, "Pen", Money::from_cents(150), 2, TaxRate::zero());
    /// let mut cart = Cart::new();
    /// cart.add_item(&pen, 1).unwrap();
    /// cart.add_item(&pen, 1).unwrap();
    /// assert_eq!(cart.item_count(), 1);
    /// assert!(cart.add_item(&pen, 1).is_err()); // only 2 in stock
    /// ```
    pub fn add_item(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        validate_quantity(quantity)?;
        validate_unit_price(product.price)?;

        if !product.in_stock() {
            return Err(CoreError::OutOfStock {
                product_id: product.id,
                name: product.name.clone(),
            });
        }

        let existing = self
            .position(product.id)
            .map(|idx| self.items[idx].quantity)
            .unwrap_or(0);
        let requested = existing.saturating_add(quantity);
        validate_quantity(requested)?;
        if requested > product.stock {
            return Err(CoreError::StockExceeded {
                product_id: product.id,
                name: product.name.clone(),
                available: product.stock,
                requested,
            });
        }

        match self.position(product.id) {
            Some(idx) => {
                let item = &mut self.items[idx];
                item.quantity = requested;
                item.stock_limit = product.stock;
            }
            None => {
                if self.items.len() >= MAX_CART_ITEMS {
                    return Err(CoreError::CartTooLarge {
                        max: MAX_CART_ITEMS,
                    });
                }
                self.items.push(LineItem::from_product(product, quantity));
            }
        }

        Ok(())
    }

    /// Sets a line's quantity.
    ///
    /// ## Behavior
    /// - `quantity <= 0` removes the line (same as [`Cart::remove_item`])
    /// - `quantity > MAX_LINE_QUANTITY` fails with `Validation`
    /// - `quantity > stock_limit` fails with `StockExceeded`; the cart keeps
    ///   the old quantity and the view clamps its input to `available`
    /// - unknown product id changes nothing
    pub fn set_quantity(&mut self, product_id: i64, quantity: i64) -> CoreResult<QuantityChange> {
        let Some(idx) = self.position(product_id) else {
            return Ok(QuantityChange::NotInCart);
        };

        if quantity <= 0 {
            self.items.remove(idx);
            return Ok(QuantityChange::Removed);
        }
        validate_quantity(quantity)?;

        let item = &mut self.items[idx];
        if quantity > item.stock_limit {
            return Err(CoreError::StockExceeded {
                product_id,
                name: item.name.clone(),
                available: item.stock_limit,
                requested: quantity,
            });
        }

        item.quantity = quantity;
        Ok(QuantityChange::Updated)
    }

    /// Removes a line. Returns whether anything was removed.
    pub fn remove_item(&mut self, product_id: i64) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        self.items.len() != before
    }

    /// Empties the cart and drops the discount.
    pub fn clear(&mut self) {
        self.items.clear();
        self.discount = Discount::None;
    }

    // -------------------------------------------------------------------------
    // Discount
    // -------------------------------------------------------------------------

    /// Applies a discount against the current subtotal.
    ///
    /// On rejection the cart's discount is reset to `None` and the error
    /// returned; on success the resolved amount is returned.
    pub fn apply_discount(&mut self, discount: Discount) -> CoreResult<Money> {
        let discount = discount.normalized();
        match discount.resolve(self.subtotal()) {
            Ok(amount) => {
                self.discount = discount;
                Ok(amount)
            }
            Err(err) => {
                self.discount = Discount::None;
                Err(err)
            }
        }
    }

    pub fn clear_discount(&mut self) {
        self.discount = Discount::None;
    }

    pub fn discount(&self) -> &Discount {
        &self.discount
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn get(&self, product_id: i64) -> Option<&LineItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }

    /// Number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Sum of quantities across lines.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn subtotal(&self) -> Money {
        self.items.iter().map(LineItem::line_total).sum()
    }

    pub fn tax(&self) -> Money {
        self.items.iter().map(LineItem::tax).sum()
    }

    /// The applied discount resolved against the current subtotal.
    pub fn discount_amount(&self) -> Money {
        self.discount.amount_for(self.subtotal())
    }

    /// `max(0, subtotal + tax − discount)`.
    pub fn total(&self) -> Money {
        (self.subtotal() + self.tax() - self.discount_amount()).clamp_non_negative()
    }

    pub fn totals(&self) -> CartTotals {
        CartTotals::from(self)
    }
}

// =============================================================================
// Cart Totals
// =============================================================================

/// Totals summary for display and for the checkout plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: i64,
    pub subtotal: Money,
    pub tax: Money,
    pub discount: Money,
    pub total: Money,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        let subtotal = cart.subtotal();
        let tax = cart.tax();
        let discount = cart.discount.amount_for(subtotal);
        CartTotals {
            item_count: cart.item_count(),
            total_quantity: cart.total_quantity(),
            subtotal,
            tax,
            discount,
            total: (subtotal + tax - discount).clamp_non_negative(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
