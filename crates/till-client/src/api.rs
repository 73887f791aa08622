//! # POS Backend API
//!
//! The [`PosApi`] trait is the seam between the register and its backend;
//! [`HttpPosApi`] is the `reqwest` implementation.
//!
//! ## Endpoints
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Method  Path (relative to api.base_url)     Used by                    │
//! │  ──────  ──────────────────────────────────  ─────────────────────────  │
//! │  GET     api/products                        list_products              │
//! │  GET     api/products/search?q=              search_products            │
//! │  POST    api/promo-code/validate             validate_promo             │
//! │  POST    api/sale/process                    process_sale               │
//! │  GET     api/sales/history?start_date=&..    sales_history              │
//! │  GET     receipt/print/{receipt_number}      receipt_pdf                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every request is a single shot with the configured timeout. Nothing is
//! retried: a sale that timed out may still have been recorded, so the
//! cashier checks the history before trying again.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use till_core::discount::PromoDiscount;
use till_core::{CheckoutPlan, Money, Product, SaleConfirmation};

use crate::config::ApiConfig;
use crate::error::{ClientError, ClientResult};
use crate::wire::{
    ErrorBody, ProductDto, PromoRequest, PromoResponse, SaleRequest, SaleResponse, SaleSummary,
};

/// Inclusive date filter for the sales history. Open ends are unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Everything the register asks of its backend.
#[async_trait]
pub trait PosApi: Send + Sync {
    /// Default product list, shown when the search box is (nearly) empty.
    async fn list_products(&self) -> ClientResult<Vec<Product>>;

    async fn search_products(&self, query: &str) -> ClientResult<Vec<Product>>;

    /// Asks the backend what `code` is worth against `subtotal`.
    async fn validate_promo(&self, code: &str, subtotal: Money) -> ClientResult<PromoDiscount>;

    async fn process_sale(&self, plan: &CheckoutPlan) -> ClientResult<SaleConfirmation>;

    async fn sales_history(&self, range: HistoryRange) -> ClientResult<Vec<SaleSummary>>;

    /// The printable PDF receipt for a completed sale.
    async fn receipt_pdf(&self, receipt_number: &str) -> ClientResult<Vec<u8>>;
}

// =============================================================================
// HTTP Implementation
// =============================================================================

#[derive(Debug, Clone)]
pub struct HttpPosApi {
    client: Client,
    base_url: Url,
}

impl HttpPosApi {
    pub fn new(config: &ApiConfig) -> ClientResult<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        let mut base_url = Url::parse(&config.base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> ClientResult<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> ClientResult<T> {
        debug!(%url, "GET");
        let response = self.client.get(url).send().await?;
        Self::handle_response(response).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, url: Url, body: &B) -> ClientResult<T> {
        debug!(%url, "POST");
        let response = self.client.post(url).json(body).send().await?;
        Self::handle_response(response).await
    }

    /// Maps non-2xx responses to [`ClientError::Server`].
    async fn check_status(response: Response) -> ClientResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(ErrorBody::into_message)
            .or_else(|| {
                let trimmed = text.trim();
                (!trimmed.is_empty() && trimmed.len() <= 200).then(|| trimmed.to_string())
            })
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());

        warn!(status = status.as_u16(), %message, "Backend returned an error");
        Err(ClientError::Server {
            status: status.as_u16(),
            message,
        })
    }

    async fn handle_response<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        let response = Self::check_status(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl PosApi for HttpPosApi {
    async fn list_products(&self) -> ClientResult<Vec<Product>> {
        let url = self.endpoint("api/products")?;
        let products: Vec<ProductDto> = self.get(url).await?;
        Ok(products.into_iter().map(Product::from).collect())
    }

    async fn search_products(&self, query: &str) -> ClientResult<Vec<Product>> {
        let mut url = self.endpoint("api/products/search")?;
        url.query_pairs_mut().append_pair("q", query);
        let products: Vec<ProductDto> = self.get(url).await?;
        debug!(query, count = products.len(), "Product search");
        Ok(products.into_iter().map(Product::from).collect())
    }

    async fn validate_promo(&self, code: &str, subtotal: Money) -> ClientResult<PromoDiscount> {
        let url = self.endpoint("api/promo-code/validate")?;
        let body = PromoRequest {
            code: code.to_string(),
            subtotal,
        };
        let response: PromoResponse = match self.post(url, &body).await {
            Ok(response) => response,
            Err(ClientError::Server { message, .. }) => {
                return Err(ClientError::PromoInvalid(message))
            }
            Err(other) => return Err(other),
        };
        response.into_discount(code)
    }

    async fn process_sale(&self, plan: &CheckoutPlan) -> ClientResult<SaleConfirmation> {
        let url = self.endpoint("api/sale/process")?;
        let body = SaleRequest::from(plan);
        let response: SaleResponse = self.post(url, &body).await?;
        response.into_confirmation()
    }

    async fn sales_history(&self, range: HistoryRange) -> ClientResult<Vec<SaleSummary>> {
        let mut url = self.endpoint("api/sales/history")?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(start) = range.start {
                query.append_pair("start_date", &start.format("%Y-%m-%d").to_string());
            }
            if let Some(end) = range.end {
                query.append_pair("end_date", &end.format("%Y-%m-%d").to_string());
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        self.get(url).await
    }

    async fn receipt_pdf(&self, receipt_number: &str) -> ClientResult<Vec<u8>> {
        let mut url = self.endpoint("receipt/print")?;
        url.path_segments_mut()
            .map_err(|_| ClientError::Config(format!("base URL cannot hold paths: {}", self.base_url)))?
            .push(receipt_number);

        debug!(%url, "GET receipt PDF");
        let response = self.client.get(url).send().await?;
        let response = Self::check_status(response).await?;
        Ok(response.bytes().await?.to_vec())
    }
}
