//! HTTP contract tests against an in-process axum stand-in for the backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde_json::{json, Value};

use till_client::{ApiConfig, ClientError, HistoryRange, HttpPosApi, PosApi};
use till_core::discount::PromoValue;
use till_core::{
    plan_checkout, Cart, Discount, ExactSumSettlement, Money, PaymentMethod, PaymentState,
    Percentage, Product, TaxRate,
};

// =============================================================================
// Stub Backend
// =============================================================================

#[derive(Clone, Default)]
struct Recorded {
    requests: Arc<Mutex<Vec<(String, Value)>>>,
}

impl Recorded {
    fn push(&self, what: &str, value: Value) {
        self.requests.lock().unwrap().push((what.to_string(), value));
    }

    fn last(&self, what: &str) -> Option<Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(w, _)| w == what)
            .map(|(_, v)| v.clone())
    }
}

async fn search(
    State(rec): State<Recorded>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    rec.push("search", json!(params));
    Json(json!([
        {"id": 12, "name": "Cola 330ml", "sku": "COLA-330", "price": 1.5, "stock": 40, "tax_rate": 10.0},
        {"id": 13, "name": "Cola Zero", "sku": "COLA-0", "price": "1.75", "stock": 0, "tax_rate": 0}
    ]))
}

async fn products() -> Json<Value> {
    Json(json!([{"id": 1, "name": "Notebook", "price": 10.0, "stock": 5}]))
}

async fn promo(State(rec): State<Recorded>, Json(body): Json<Value>) -> Response {
    rec.push("promo", body.clone());
    if body["code"] == "SAVE10" {
        Json(json!({
            "valid": true,
            "discount_type": "percentage",
            "discount_value": 10.0,
            "discount_amount": 2.0,
            "description": "Ten percent off"
        }))
        .into_response()
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Invalid promo code"})),
        )
            .into_response()
    }
}

async fn sale(State(rec): State<Recorded>, Json(body): Json<Value>) -> Json<Value> {
    rec.push("sale", body);
    Json(json!({
        "success": true,
        "sale_id": 501,
        "receipt_number": "R-20240131-0501",
        "total_amount": 12.0,
        "change_amount": 3.0,
        "message": "Sale completed successfully"
    }))
}

async fn sale_fails() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"success": false, "error": "No open cash register"})),
    )
        .into_response()
}

async fn history(
    State(rec): State<Recorded>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    rec.push("history", json!(params));
    Json(json!([{
        "id": 501,
        "receipt_number": "R-20240131-0501",
        "created_at": "2024-01-31T14:05:00",
        "customer_name": null,
        "total_amount": 12.0,
        "payment_method": "cash",
        "item_count": 2
    }]))
}

async fn receipt(Path(number): Path<String>) -> Response {
    if number == "R-404" {
        return (StatusCode::NOT_FOUND, "no such receipt").into_response();
    }
    format!("%PDF-1.4 {}", number).into_response()
}

fn backend(rec: Recorded) -> Router {
    Router::new()
        .route("/pos/api/products", get(products))
        .route("/pos/api/products/search", get(search))
        .route("/pos/api/promo-code/validate", post(promo))
        .route("/pos/api/sale/process", post(sale))
        .route("/pos/api/sales/history", get(history))
        .route("/pos/receipt/print/{number}", get(receipt))
        .with_state(rec)
}

async fn serve(app: Router) -> HttpPosApi {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    HttpPosApi::new(&ApiConfig::new(format!("http://{}/pos", addr))).unwrap()
}

fn cash_plan() -> till_core::CheckoutPlan {
    let product = Product::new(1, "Notebook", Money::from_cents(1000), 5, TaxRate::from_bps(1000));
    let mut cart = Cart::new();
    cart.add_item(&product, 2).unwrap();
    cart.apply_discount(Discount::Percentage(Percentage::from_bps(5000)))
        .unwrap();
    let mut payment = PaymentState::new();
    payment.set_tendered(Money::from_cents(1500));
    plan_checkout(&cart, &payment, None, "", &ExactSumSettlement).unwrap()
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_search_sends_query_and_converts_products() {
    let rec = Recorded::default();
    let api = serve(backend(rec.clone())).await;

    let products = api.search_products("cola & lime").await.unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0].price.cents(), 150);
    assert_eq!(products[0].tax_rate.bps(), 1000);
    assert_eq!(products[1].price.cents(), 175);
    assert!(!products[1].in_stock());

    assert_eq!(rec.last("search"), Some(json!({"q": "cola & lime"})));
}

#[tokio::test]
async fn test_list_products() {
    let api = serve(backend(Recorded::default())).await;
    let products = api.list_products().await.unwrap();
    assert_eq!(products[0].name, "Notebook");
    assert_eq!(products[0].sku, "SKU-1");
}

#[tokio::test]
async fn test_promo_accepted() {
    let rec = Recorded::default();
    let api = serve(backend(rec.clone())).await;

    let promo = api
        .validate_promo("SAVE10", Money::from_cents(2000))
        .await
        .unwrap();
    assert_eq!(promo.amount.cents(), 200);
    assert_eq!(promo.value, PromoValue::Percentage(Percentage::from_bps(1000)));
    assert_eq!(promo.description.as_deref(), Some("Ten percent off"));

    assert_eq!(
        rec.last("promo"),
        Some(json!({"code": "SAVE10", "subtotal": 20.0}))
    );
}

#[tokio::test]
async fn test_promo_rejected_maps_to_promo_invalid() {
    let api = serve(backend(Recorded::default())).await;
    let err = api
        .validate_promo("BOGUS", Money::from_cents(2000))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::PromoInvalid(ref m) if m == "Invalid promo code"));
}

#[tokio::test]
async fn test_process_sale_body_and_confirmation() {
    let rec = Recorded::default();
    let api = serve(backend(rec.clone())).await;

    let confirmation = api.process_sale(&cash_plan()).await.unwrap();
    assert_eq!(confirmation.receipt_number, "R-20240131-0501");
    assert_eq!(confirmation.total.cents(), 1200);
    assert_eq!(confirmation.change, Some(Money::from_cents(300)));

    let body = rec.last("sale").unwrap();
    assert_eq!(body["payment_method"], "cash");
    assert_eq!(body["amount_tendered"], 15.0);
    assert_eq!(body["items"][0]["product_id"], 1);
    assert_eq!(body["items"][0]["quantity"], 2);
    assert_eq!(body["items"][0]["unit_price"], 10.0);
    assert_eq!(body["discount"]["type"], "percentage");
    assert_eq!(body["discount"]["amount"], 10.0);
    assert!(body.get("payment_reference").is_none());
}

#[tokio::test]
async fn test_card_sale_sends_reference() {
    let rec = Recorded::default();
    let api = serve(backend(rec.clone())).await;

    let product = Product::new(1, "Notebook", Money::from_cents(1000), 5, TaxRate::zero());
    let mut cart = Cart::new();
    cart.add_item(&product, 1).unwrap();
    let mut payment = PaymentState::new();
    payment.select(PaymentMethod::Card);
    payment.set_reference("AUTH-77").unwrap();
    let plan = plan_checkout(&cart, &payment, None, "", &ExactSumSettlement).unwrap();

    api.process_sale(&plan).await.unwrap();
    let body = rec.last("sale").unwrap();
    assert_eq!(body["payment_method"], "card");
    assert_eq!(body["payment_reference"], "AUTH-77");
    assert!(body.get("amount_tendered").is_none());
}

#[tokio::test]
async fn test_sale_failure_maps_to_server_error() {
    let app = Router::new().route("/pos/api/sale/process", post(sale_fails));
    let api = serve(app).await;

    let err = api.process_sale(&cash_plan()).await.unwrap_err();
    match err {
        ClientError::Server { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "No open cash register");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_history_date_filter() {
    let rec = Recorded::default();
    let api = serve(backend(rec.clone())).await;

    let range = HistoryRange {
        start: NaiveDate::from_ymd_opt(2024, 1, 1),
        end: NaiveDate::from_ymd_opt(2024, 1, 31),
    };
    let rows = api.sales_history(range).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].total_amount.cents(), 1200);
    assert_eq!(
        rec.last("history"),
        Some(json!({"start_date": "2024-01-01", "end_date": "2024-01-31"}))
    );

    api.sales_history(HistoryRange::default()).await.unwrap();
    assert_eq!(rec.last("history"), Some(json!({})));
}

#[tokio::test]
async fn test_receipt_pdf() {
    let api = serve(backend(Recorded::default())).await;

    let bytes = api.receipt_pdf("R-20240131-0501").await.unwrap();
    assert_eq!(bytes, b"%PDF-1.4 R-20240131-0501".to_vec());

    let err = api.receipt_pdf("R-404").await.unwrap_err();
    assert!(matches!(err, ClientError::Server { status: 404, ref message } if message == "no such receipt"));
}

#[tokio::test]
async fn test_negative_catalog_price_is_invalid_response() {
    let app = Router::new().route(
        "/pos/api/products",
        get(|| async {
            Json(json!([
                {"id": 1, "name": "Notebook", "price": 10.0, "stock": 5},
                {"id": 2, "name": "Voucher", "price": -5.0, "stock": 5}
            ]))
        }),
    );
    let api = serve(app).await;

    let err = api.list_products().await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = HttpPosApi::new(&ApiConfig::new(format!("http://{}/pos", addr))).unwrap();
    let err = api.list_products().await.unwrap_err();
    assert!(err.is_network());
}
