//! # Wire Format
//!
//! JSON bodies exchanged with the POS backend, and the conversion between
//! the backend's decimal numbers and the register's integer types.
//!
//! ## Decimal Boundary
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  backend JSON                 register                                  │
//! │  ────────────                 ────────                                  │
//! │  "price": 10.99        ◄──►   Money(1099)          (× 100, rounded)    │
//! │  "tax_rate": 8.25      ◄──►   TaxRate(825 bps)     (× 100, rounded)    │
//! │  "discount_value": 10  ──►    Percentage(1000 bps) or Money(1000)      │
//! │                                                                         │
//! │  Rounding is half away from zero, to the nearest cent / basis point.   │
//! │  Numbers sent as strings ("10.99") are accepted too.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use till_core::discount::{PromoDiscount, PromoValue};
use till_core::{
    CheckoutPlan, Discount, Money, PaymentSelection, Percentage, Product, SaleConfirmation, TaxRate,
};

use crate::error::{ClientError, ClientResult};

// =============================================================================
// Decimal Helpers
// =============================================================================

/// A JSON number that may arrive as a number or a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum WireDecimal {
    Number(f64),
    Text(String),
}

impl WireDecimal {
    fn hundredths<E: serde::de::Error>(self) -> Result<i64, E> {
        let value = match self {
            WireDecimal::Number(n) => n,
            WireDecimal::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| E::custom(format!("not a decimal number: {:?}", s)))?,
        };
        to_hundredths(value).ok_or_else(|| E::custom(format!("decimal out of range: {}", value)))
    }
}

/// `12.345` → `1235`. `None` for NaN, infinities and overflow.
pub fn to_hundredths(value: f64) -> Option<i64> {
    let scaled = (value * 100.0).round();
    (scaled.is_finite() && scaled.abs() < i64::MAX as f64).then_some(scaled as i64)
}

/// `1235` → `12.35`.
pub fn from_hundredths(hundredths: i64) -> f64 {
    hundredths as f64 / 100.0
}

/// `Money` as a decimal amount of dollars.
pub mod dollars {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Money, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(from_hundredths(value.cents()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        WireDecimal::deserialize(deserializer)?
            .hundredths()
            .map(Money::from_cents)
    }
}

/// `Option<Money>` as an optional decimal; `null` and absent are `None`.
pub mod dollars_opt {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Money>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(m) => serializer.serialize_some(&from_hundredths(m.cents())),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Money>, D::Error> {
        Option::<WireDecimal>::deserialize(deserializer)?
            .map(|d| d.hundredths().map(Money::from_cents))
            .transpose()
    }
}

/// A product's unit price: `dollars`, but rejecting negative or
/// implausibly large values so a bad catalog entry never reaches a cart.
pub mod unit_price {
    use super::*;
    use serde::{Deserializer, Serializer};
    use till_core::validation::validate_unit_price;

    pub fn serialize<S: Serializer>(value: &Money, serializer: S) -> Result<S::Ok, S::Error> {
        dollars::serialize(value, serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        let price = dollars::deserialize(deserializer)?;
        validate_unit_price(price)
            .map(|()| price)
            .map_err(serde::de::Error::custom)
    }
}

/// `TaxRate` as a decimal percentage (`8.25`).
pub mod percent {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &TaxRate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(from_hundredths(i64::from(value.bps())))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TaxRate, D::Error> {
        let bps = WireDecimal::deserialize(deserializer)?.hundredths::<D::Error>()?;
        u32::try_from(bps)
            .map(TaxRate::from_bps)
            .map_err(|_| serde::de::Error::custom(format!("tax rate out of range: {} bps", bps)))
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Error body the backend sends with non-2xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.error.or(self.message).filter(|m| !m.trim().is_empty())
    }
}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDto {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(with = "unit_price")]
    pub price: Money,
    #[serde(default)]
    pub stock: i64,
    #[serde(default, with = "percent")]
    pub tax_rate: TaxRate,
    #[serde(default)]
    pub category: Option<String>,
}

impl From<ProductDto> for Product {
    fn from(dto: ProductDto) -> Self {
        let sku = dto
            .sku
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| format!("SKU-{}", dto.id));
        Product {
            id: dto.id,
            name: dto.name,
            sku,
            barcode: dto.barcode,
            price: dto.price,
            stock: dto.stock,
            tax_rate: dto.tax_rate,
            category: dto.category,
        }
    }
}

// =============================================================================
// Promo Codes
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoRequest {
    pub code: String,
    #[serde(with = "dollars")]
    pub subtotal: Money,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PromoResponse {
    #[serde(default = "default_true")]
    pub valid: bool,
    #[serde(default)]
    pub discount_type: Option<String>,
    pub discount_value: f64,
    #[serde(with = "dollars")]
    pub discount_amount: Money,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

fn default_true() -> bool {
    true
}

impl PromoResponse {
    /// Turns a successful validation into the discount the cart applies.
    pub fn into_discount(self, code: &str) -> ClientResult<PromoDiscount> {
        if !self.valid {
            return Err(ClientError::PromoInvalid(
                self.error.unwrap_or_else(|| "Invalid promo code".to_string()),
            ));
        }

        let nominal = to_hundredths(self.discount_value).ok_or_else(|| {
            ClientError::InvalidResponse(format!("bad discount_value {}", self.discount_value))
        })?;
        let value = match self.discount_type.as_deref() {
            Some("percentage") => {
                let bps = u32::try_from(nominal).map_err(|_| {
                    ClientError::InvalidResponse(format!("bad percentage {}", self.discount_value))
                })?;
                PromoValue::Percentage(Percentage::from_bps(bps))
            }
            _ => PromoValue::Fixed(Money::from_cents(nominal)),
        };

        Ok(PromoDiscount {
            code: code.to_string(),
            value,
            amount: self.discount_amount,
            description: self.description,
        })
    }
}

// =============================================================================
// Sale Submission
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleItemDto {
    pub product_id: i64,
    pub quantity: i64,
    #[serde(with = "dollars")]
    pub unit_price: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountDto {
    #[serde(rename = "type")]
    pub kind: String,
    /// Nominal value: a percentage for percentage discounts, dollars otherwise.
    pub value: f64,
    #[serde(with = "dollars")]
    pub amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitPaymentDto {
    pub method: String,
    #[serde(with = "dollars")]
    pub amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRequest {
    pub items: Vec<SaleItemDto>,
    pub customer_id: Option<i64>,
    pub payment_method: String,
    pub discount: DiscountDto,
    pub notes: String,
    #[serde(default, with = "dollars_opt", skip_serializing_if = "Option::is_none")]
    pub amount_tendered: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_payments: Option<Vec<SplitPaymentDto>>,
}

impl From<&CheckoutPlan> for SaleRequest {
    fn from(plan: &CheckoutPlan) -> Self {
        let items = plan
            .lines
            .iter()
            .map(|line| SaleItemDto {
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
            })
            .collect();

        let value = match &plan.discount {
            Discount::None => 0.0,
            Discount::Percentage(pct) => from_hundredths(i64::from(pct.bps())),
            Discount::FixedAmount(amount) => from_hundredths(amount.cents()),
            Discount::PromoCode(promo) => match promo.value {
                PromoValue::Percentage(pct) => from_hundredths(i64::from(pct.bps())),
                PromoValue::Fixed(amount) => from_hundredths(amount.cents()),
            },
        };
        let discount = DiscountDto {
            kind: plan.discount.kind().to_string(),
            value,
            amount: plan.totals.discount,
            code: plan.discount.code().map(str::to_string),
        };

        let (amount_tendered, payment_reference, split_payments) = match &plan.payment {
            PaymentSelection::Cash { tendered } => (Some(*tendered), None, None),
            PaymentSelection::Card { reference } | PaymentSelection::Digital { reference } => {
                (None, Some(reference.clone()), None)
            }
            PaymentSelection::Split { payments } => {
                let legs = payments
                    .iter()
                    .map(|p| SplitPaymentDto {
                        method: p.method.as_str().to_string(),
                        amount: p.amount,
                        reference: p.reference.clone(),
                    })
                    .collect();
                (None, None, Some(legs))
            }
        };

        SaleRequest {
            items,
            customer_id: plan.customer.as_ref().map(|c| c.id),
            payment_method: plan.payment.method().as_str().to_string(),
            discount,
            notes: plan.notes.clone().unwrap_or_default(),
            amount_tendered,
            payment_reference,
            split_payments,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaleResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub sale_id: Option<i64>,
    #[serde(default)]
    pub receipt_number: Option<String>,
    #[serde(default, with = "dollars_opt")]
    pub total_amount: Option<Money>,
    #[serde(default, with = "dollars_opt")]
    pub change_amount: Option<Money>,
    #[serde(default)]
    pub loyalty_points_earned: Option<i64>,
    #[serde(default)]
    pub error: Option<String>,
}

impl SaleResponse {
    pub fn into_confirmation(self) -> ClientResult<SaleConfirmation> {
        if !self.success {
            return Err(ClientError::Server {
                status: 200,
                message: self
                    .error
                    .unwrap_or_else(|| "Sale was not processed".to_string()),
            });
        }

        let receipt_number = self
            .receipt_number
            .filter(|r| !r.trim().is_empty())
            .ok_or_else(|| ClientError::InvalidResponse("missing receipt_number".to_string()))?;
        let total = self
            .total_amount
            .ok_or_else(|| ClientError::InvalidResponse("missing total_amount".to_string()))?;

        Ok(SaleConfirmation {
            sale_id: self.sale_id,
            receipt_number,
            total,
            change: self.change_amount,
            loyalty_points: self.loyalty_points_earned,
        })
    }
}

// =============================================================================
// Sales History
// =============================================================================

/// One row of the sales history listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleSummary {
    pub id: i64,
    pub receipt_number: String,
    pub created_at: NaiveDateTime,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub item_count: i64,
    #[serde(with = "dollars")]
    pub total_amount: Money,
    pub payment_method: String,
}

// =============================================================================
// Unit Tests
// =============================================================================
