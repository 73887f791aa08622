//! # Discount Commands
//!
//! One discount per sale. Applying a new one replaces the old; a rejected
//! percentage or fixed amount leaves the sale with no discount at all.
//!
//! ## Promo Codes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  > promo save10                                                         │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  validate_promo_code ──► "SAVE10"                                       │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  subtotal = cart.subtotal()          (lock released)                    │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  POST api/promo-code/validate { code, subtotal }                        │
//! │        │                                                                │
//! │        ├── rejected ──► PROMO_INVALID, discount untouched               │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  cart.apply_discount(PromoCode { amount from backend })                 │
//! │  (subtotal moved meanwhile? applied anyway, logged with warn!)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::{debug, info, warn};

use till_client::PosApi;
use till_core::validation::validate_promo_code;
use till_core::{CoreError, Discount, Money, Percentage};

use crate::error::ApiError;
use crate::state::{CartResponse, SessionState};

/// Applies a percentage discount (0 to 100).
pub fn apply_percentage(
    session: &SessionState,
    percentage: Percentage,
) -> Result<CartResponse, ApiError> {
    debug!(bps = percentage.bps(), "apply_percentage command");
    apply(session, Discount::Percentage(percentage))
}

/// Applies a fixed amount off, up to the subtotal.
pub fn apply_fixed(session: &SessionState, amount: Money) -> Result<CartResponse, ApiError> {
    debug!(amount = %amount, "apply_fixed command");
    apply(session, Discount::FixedAmount(amount))
}

fn apply(session: &SessionState, discount: Discount) -> Result<CartResponse, ApiError> {
    session.with_session_mut(|s| {
        s.cart.apply_discount(discount)?;
        Ok(CartResponse::from(&*s))
    })
}

/// Validates a promo code with the backend and applies it.
///
/// The backend decides what the code is worth against the subtotal it was
/// sent. A rejected code leaves the current discount in place.
pub async fn apply_promo(
    api: &dyn PosApi,
    session: &SessionState,
    code: &str,
) -> Result<CartResponse, ApiError> {
    debug!(code = %code, "apply_promo command");

    let code = validate_promo_code(code)?;
    let subtotal = session
        .with_session(|s| (!s.cart.is_empty()).then(|| s.cart.subtotal()))
        .ok_or(CoreError::EmptyCart)?;

    let promo = api.validate_promo(&code, subtotal).await?;

    session.with_session_mut(|s| {
        let current = s.cart.subtotal();
        if current != subtotal {
            warn!(
                code = %code,
                validated_against = %subtotal,
                current = %current,
                "Cart changed while the promo code was being validated; applying as-is"
            );
        }

        let amount = s.cart.apply_discount(Discount::PromoCode(promo))?;
        info!(code = %code, amount = %amount, "Promo code applied");
        Ok(CartResponse::from(&*s))
    })
}

/// Removes any discount from the sale.
pub fn clear_discount(session: &SessionState) -> CartResponse {
    debug!("clear_discount command");

    session.with_session_mut(|s| {
        s.cart.clear_discount();
        CartResponse::from(&*s)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{product, FakeApi};
    use crate::error::ErrorCode;
    use till_core::{PromoDiscount, PromoValue};

    /// $10.00 × 2 at 10% tax: subtotal $20.00, tax $2.00.
    fn session() -> SessionState {
        let session = SessionState::new();
        session.with_session_mut(|s| {
            s.cart.add_item(&product(1, 1000, 10, 1000), 2).unwrap();
        });
        session
    }

    fn save5() -> PromoDiscount {
        PromoDiscount {
            code: "SAVE5".to_string(),
            value: PromoValue::Fixed(Money::from_cents(500)),
            amount: Money::from_cents(500),
            description: Some("$5 off".to_string()),
        }
    }

    #[test]
    fn test_percentage_discount() {
        let session = session();
        let cart = apply_percentage(&session, Percentage::from_bps(5000)).unwrap();
        assert_eq!(cart.totals.discount, Money::from_cents(1000));
        assert_eq!(cart.totals.total, Money::from_cents(1200));
    }

    #[test]
    fn test_rejected_discount_resets_to_none() {
        let session = session();
        apply_percentage(&session, Percentage::from_bps(1000)).unwrap();

        let err = apply_fixed(&session, Money::from_cents(2001)).unwrap_err();
        assert_eq!(err.code, ErrorCode::DiscountError);
        session.with_session(|s| assert_eq!(s.cart.discount(), &Discount::None));

        let err = apply_percentage(&session, Percentage::from_bps(10_001)).unwrap_err();
        assert_eq!(err.code, ErrorCode::DiscountError);
    }

    #[test]
    fn test_clear_discount() {
        let session = session();
        apply_fixed(&session, Money::from_cents(300)).unwrap();
        let cart = clear_discount(&session);
        assert_eq!(cart.discount, Discount::None);
        assert_eq!(cart.totals.total, Money::from_cents(2200));
    }

    #[tokio::test]
    async fn test_promo_applied_with_backend_amount() {
        let api = FakeApi {
            promo: Some(save5()),
            ..FakeApi::default()
        };
        let session = session();

        let cart = apply_promo(&api, &session, " save5 ").await.unwrap();
        assert_eq!(cart.totals.discount, Money::from_cents(500));
        assert_eq!(cart.totals.total, Money::from_cents(1700));
        assert_eq!(
            api.promo_requests.lock().unwrap()[0],
            ("SAVE5".to_string(), Money::from_cents(2000))
        );
    }

    #[tokio::test]
    async fn test_rejected_promo_keeps_existing_discount() {
        let api = FakeApi::default();
        let session = session();
        apply_percentage(&session, Percentage::from_bps(1000)).unwrap();

        let err = apply_promo(&api, &session, "BOGUS").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PromoInvalid);
        session.with_session(|s| {
            assert_eq!(
                s.cart.discount(),
                &Discount::Percentage(Percentage::from_bps(1000))
            )
        });
    }

    #[tokio::test]
    async fn test_promo_needs_items_and_a_valid_code() {
        let api = FakeApi::default();

        let err = apply_promo(&api, &SessionState::new(), "SAVE5")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::CartError);

        let err = apply_promo(&api, &session(), "SAVE 5").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(api.promo_requests.lock().unwrap().is_empty());
    }
}
