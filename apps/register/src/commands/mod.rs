//! # Register Commands
//!
//! Every action the cashier can take, as plain functions over the state they
//! need.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (exports)
//! ├── product.rs   ◄─── Product search, catalog cache
//! ├── cart.rs      ◄─── Cart lines, customer, notes
//! ├── discount.rs  ◄─── Percentage, fixed and promo-code discounts
//! ├── payment.rs   ◄─── Payment panel: method, tendered, references, split
//! ├── sale.rs      ◄─── Checkout, receipt, PDF printout, sales history
//! └── held.rs      ◄─── Hold and recall a sale
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  Terminal view                                                          │
//! │  ─────────────                                                          │
//! │  > add 12 2                                                             │
//! │         │                                                               │
//! │         │ (cli::Command::Add { product_id: 12, quantity: Some(2) })     │
//! │         ▼                                                               │
//! │  Rust commands                                                          │
//! │  ─────────────                                                          │
//! │  fn add_item(                                                           │
//! │      session: &SessionState,  ◄── Passed in by the caller              │
//! │      product_id: i64,                                                   │
//! │      quantity: Option<i64>,                                             │
//! │  ) -> Result<CartResponse, ApiError>                                    │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Terminal view prints the cart or the error message                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Commands that talk to the backend take `&dyn PosApi` and never hold the
//! session lock across the request. A failed command leaves the session as
//! it was.

pub mod cart;
pub mod discount;
pub mod held;
pub mod payment;
pub mod product;
pub mod sale;

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory backend for command tests.

    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use till_client::{ClientError, ClientResult, HistoryRange, PosApi, SaleSummary};
    use till_core::{
        CheckoutPlan, Money, Product, PromoDiscount, SaleConfirmation, TaxRate,
    };

    #[derive(Default)]
    pub struct FakeApi {
        pub products: Vec<Product>,
        pub promo: Option<PromoDiscount>,
        pub sale_error: Option<String>,
        /// When set, `process_sale` waits for a notification before answering.
        pub gate: Option<Arc<Notify>>,
        pub loyalty_points: Option<i64>,
        pub history: Vec<SaleSummary>,
        pub pdf: Option<Vec<u8>>,
        pub searches: Mutex<Vec<String>>,
        pub promo_requests: Mutex<Vec<(String, Money)>>,
        pub sales: Mutex<Vec<CheckoutPlan>>,
        pub history_requests: Mutex<Vec<HistoryRange>>,
    }

    impl FakeApi {
        pub fn with_products(products: Vec<Product>) -> Self {
            FakeApi {
                products,
                ..FakeApi::default()
            }
        }

        pub fn search_count(&self) -> usize {
            self.searches.lock().unwrap().len()
        }

        pub fn sale_count(&self) -> usize {
            self.sales.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl PosApi for FakeApi {
        async fn list_products(&self) -> ClientResult<Vec<Product>> {
            Ok(self.products.clone())
        }

        async fn search_products(&self, query: &str) -> ClientResult<Vec<Product>> {
            self.searches.lock().unwrap().push(query.to_string());
            let needle = query.to_lowercase();
            Ok(self
                .products
                .iter()
                .filter(|p| p.name.to_lowercase().contains(&needle))
                .cloned()
                .collect())
        }

        async fn validate_promo(&self, code: &str, subtotal: Money) -> ClientResult<PromoDiscount> {
            self.promo_requests
                .lock()
                .unwrap()
                .push((code.to_string(), subtotal));
            match &self.promo {
                Some(promo) if promo.code == code => Ok(promo.clone()),
                _ => Err(ClientError::PromoInvalid("Invalid promo code".to_string())),
            }
        }

        async fn process_sale(&self, plan: &CheckoutPlan) -> ClientResult<SaleConfirmation> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if let Some(message) = &self.sale_error {
                return Err(ClientError::Server {
                    status: 400,
                    message: message.clone(),
                });
            }

            let mut sales = self.sales.lock().unwrap();
            sales.push(plan.clone());
            Ok(SaleConfirmation {
                sale_id: Some(sales.len() as i64),
                receipt_number: format!("R-{:04}", sales.len()),
                total: plan.totals.total,
                change: plan.change,
                loyalty_points: self.loyalty_points,
            })
        }

        async fn sales_history(&self, range: HistoryRange) -> ClientResult<Vec<SaleSummary>> {
            self.history_requests.lock().unwrap().push(range);
            Ok(self.history.clone())
        }

        async fn receipt_pdf(&self, _receipt_number: &str) -> ClientResult<Vec<u8>> {
            self.pdf.clone().ok_or_else(|| ClientError::Server {
                status: 404,
                message: "Receipt not found".to_string(),
            })
        }
    }

    /// A product with the given price (cents), stock and tax rate (bps).
    pub fn product(id: i64, price_cents: i64, stock: i64, tax_bps: u32) -> Product {
        Product::new(
            id,
            format!("Product {}", id),
            Money::from_cents(price_cents),
            stock,
            TaxRate::from_bps(tax_bps),
        )
    }
}
