//! # Session State
//!
//! Everything the cashier is working on right now: the cart, the payment
//! panel, the attached customer, sale notes, the last product search and the
//! last completed receipt.
//!
//! ## Session Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Session State Operations                             │
//! │                                                                         │
//! │  View Action              Command                 Session Change        │
//! │  ───────────              ───────                 ──────────────        │
//! │                                                                         │
//! │  search coke ────────────► search() ───────────► catalog = results     │
//! │                                                                         │
//! │  add 12 2 ───────────────► add_item() ─────────► cart.add_item(..)     │
//! │                                                                         │
//! │  pay cash 20 ────────────► set_tendered() ─────► payment.tendered      │
//! │                                                                         │
//! │  checkout ───────────────► checkout() ─────────► busy flag set,        │
//! │                                                  backend call,          │
//! │                                                  finish_sale()          │
//! │                                                                         │
//! │  NOTE: Mutations run synchronously under the mutex. The lock is never  │
//! │        held across a network call.                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use till_core::{
    Cart, CartTotals, Customer, Discount, ExactSumSettlement, LineItem, PaymentState, Product,
    Receipt, SplitSettlement,
};
use uuid::Uuid;

/// The sale in progress plus what the view needs around it.
#[derive(Debug, Clone, Default)]
pub struct PosSession {
    pub cart: Cart,
    pub payment: PaymentState,
    pub customer: Option<Customer>,
    pub notes: String,
    /// Results of the last product search; `add_item` looks products up here.
    pub catalog: Vec<Product>,
    pub last_receipt: Option<Receipt>,
}

impl PosSession {
    pub fn find_product(&self, product_id: i64) -> Option<&Product> {
        self.catalog.iter().find(|p| p.id == product_id)
    }

    /// Starts a fresh sale. The catalog and last receipt survive.
    pub fn clear(&mut self) {
        self.cart.clear();
        self.payment.reset();
        self.customer = None;
        self.notes.clear();
    }

    /// Records a completed sale and starts a fresh one.
    pub fn finish_sale(&mut self, receipt: Receipt) {
        self.clear();
        self.last_receipt = Some(receipt);
    }

    pub fn notes(&self) -> Option<&str> {
        let notes = self.notes.trim();
        (!notes.is_empty()).then_some(notes)
    }
}

/// Cart view returned by most commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub items: Vec<LineItem>,
    pub totals: CartTotals,
    pub discount: Discount,
    pub customer: Option<Customer>,
}

impl From<&PosSession> for CartResponse {
    fn from(session: &PosSession) -> Self {
        CartResponse {
            items: session.cart.items().to_vec(),
            totals: session.cart.totals(),
            discount: session.cart.discount().clone(),
            customer: session.customer.clone(),
        }
    }
}

// =============================================================================
// Shared State
// =============================================================================

/// Session state shared by every command.
///
/// ## Thread Safety
/// - `Arc<Mutex<PosSession>>`: one mutation at a time, never held across
///   an `.await`
/// - `checkout_busy`: set for the whole lifetime of a checkout request so a
///   second checkout is rejected outright instead of queued
pub struct SessionState {
    id: Uuid,
    session: Arc<Mutex<PosSession>>,
    checkout_busy: Arc<AtomicBool>,
    split_policy: Arc<dyn SplitSettlement>,
}

impl SessionState {
    /// Creates an empty session that settles splits with [`ExactSumSettlement`].
    pub fn new() -> Self {
        Self::with_split_policy(Arc::new(ExactSumSettlement))
    }

    pub fn with_split_policy(split_policy: Arc<dyn SplitSettlement>) -> Self {
        SessionState {
            id: Uuid::new_v4(),
            session: Arc::new(Mutex::new(PosSession::default())),
            checkout_busy: Arc::new(AtomicBool::new(false)),
            split_policy,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn split_policy(&self) -> &dyn SplitSettlement {
        self.split_policy.as_ref()
    }

    /// Executes a function with read access to the session.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let totals = session.with_session(|s| s.cart.totals());
    /// ```
    pub fn with_session<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&PosSession) -> R,
    {
        // A panic while holding the lock leaves a session that is still
        // structurally valid, so a poisoned lock is recovered.
        let session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        f(&session)
    }

    /// Executes a function with write access to the session.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// session.with_session_mut(|s| s.cart.add_item(&product, 1))?;
    /// ```
    pub fn with_session_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut PosSession) -> R,
    {
        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut session)
    }

    /// Claims the checkout slot. `None` while another checkout is in flight.
    pub fn begin_checkout(&self) -> Option<CheckoutGuard> {
        self.checkout_busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CheckoutGuard {
                busy: Arc::clone(&self.checkout_busy),
            })
    }

    pub fn checkout_in_progress(&self) -> bool {
        self.checkout_busy.load(Ordering::Acquire)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionState")
            .field("id", &self.id)
            .field("checkout_busy", &self.checkout_in_progress())
            .finish_non_exhaustive()
    }
}

/// Releases the checkout slot when dropped, whether the checkout succeeded,
/// failed or its future was dropped.
#[derive(Debug)]
pub struct CheckoutGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for CheckoutGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
