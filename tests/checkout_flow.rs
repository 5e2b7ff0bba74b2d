use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, StatusCode, header},
};
use storefront::{
    metrics::HttpMetrics,
    models::{NewOrder, Order, Product},
    routes::create_app,
    state::AppState,
    store::{MemoryStore, Store, StoreError, StoreResult, Traced},
};
use rust_decimal::Decimal;
use tower::ServiceExt;

struct Harness {
    app: Router,
    state: AppState,
    store: Arc<MemoryStore>,
}

impl Harness {
    fn with_widget() -> Self {
        let store = Arc::new(MemoryStore::new());
        store.insert_product("Widget", Decimal::from(100));
        Self::new(store)
    }

    fn new(store: Arc<MemoryStore>) -> Self {
        let state = AppState::new(store.clone()).expect("state");
        Self {
            app: create_app(state.clone()),
            state,
            store,
        }
    }

    async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.expect("response")
    }

    fn metrics(&self) -> &HttpMetrics {
        &self.state.metrics
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("location header")
        .to_str()
        .unwrap()
        .to_string()
}

/// Sum of `http_request_duration_seconds_count` samples for one endpoint.
fn duration_observations(metrics: &HttpMetrics, method: &str, endpoint: &str) -> u64 {
    let method = format!("method=\"{method}\"");
    let endpoint = format!("endpoint=\"{endpoint}\"");
    metrics
        .encode()
        .unwrap()
        .lines()
        .filter(|line| line.starts_with("http_request_duration_seconds_count{"))
        .filter(|line| line.contains(&method) && line.contains(&endpoint))
        .map(|line| line.rsplit(' ').next().unwrap().parse::<u64>().unwrap())
        .sum()
}

#[tokio::test]
async fn checkout_then_success_shows_order() {
    let harness = Harness::with_widget();

    let response = harness
        .send(post_form("/checkout", "product_id=1&quantity=3"))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/success?order_id=1");

    let order = harness.store.get_order(1).await.unwrap();
    assert_eq!(order.product_id, 1);
    assert_eq!(order.quantity, 3);
    assert_eq!(order.total, Decimal::from(300));

    let response = harness.send(get("/success?order_id=1")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("Widget"), "page should name the product");
    assert!(page.contains("300.00"), "page should show the order total");

    assert_eq!(harness.metrics().orders_created_total.get(), 1);
    assert_eq!(harness.metrics().request_count("POST", "/checkout", 303), 1);
    assert_eq!(harness.metrics().request_count("GET", "/success", 200), 1);
}

#[tokio::test]
async fn home_lists_products_in_id_order() {
    let harness = Harness::new(Arc::new(MemoryStore::seeded()));

    let response = harness.send(get("/")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;

    let laptop = page.find("Gaming Laptop").expect("first product");
    let monitor = page.find("4K Monitor").expect("last product");
    assert!(laptop < monitor);
    assert!(page.contains("15000000.00"));
    assert_eq!(harness.metrics().request_count("GET", "/", 200), 1);
}

#[tokio::test]
async fn home_with_empty_catalogue_is_ok() {
    let harness = Harness::new(Arc::new(MemoryStore::new()));

    let response = harness.send(get("/")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("No products available"));
}

#[tokio::test]
async fn checkout_rejects_get_without_creating_order() {
    let harness = Harness::with_widget();

    let response = harness
        .send(get("/checkout?product_id=1&quantity=1"))
        .await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body_text(response).await, "Method not allowed");
    assert_eq!(harness.store.order_count(), 0);
    assert_eq!(harness.metrics().orders_created_total.get(), 0);
}

#[tokio::test]
async fn checkout_unknown_product_is_not_found() {
    let harness = Harness::with_widget();

    let response = harness
        .send(post_form("/checkout", "product_id=999&quantity=1"))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(response).await, "Product not found");
    assert_eq!(harness.store.order_count(), 0);
}

#[tokio::test]
async fn checkout_rejects_malformed_input() {
    let harness = Harness::with_widget();

    for (body, reason) in [
        ("quantity=2", "Invalid product_id"),
        ("product_id=abc&quantity=2", "Invalid product_id"),
        ("product_id=1", "Invalid quantity"),
        ("product_id=1&quantity=zero", "Invalid quantity"),
        ("product_id=1&quantity=0", "Invalid quantity"),
        ("product_id=1&quantity=-4", "Invalid quantity"),
    ] {
        let response = harness.send(post_form("/checkout", body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {body:?}");
        assert_eq!(body_text(response).await, reason);
    }

    assert_eq!(harness.store.order_count(), 0);
    assert_eq!(harness.metrics().request_count("POST", "/checkout", 400), 6);
}

#[tokio::test]
async fn checkout_rejects_totals_too_large_to_store() {
    let store = Arc::new(MemoryStore::new());
    store.insert_product("Gaming Laptop", Decimal::from(15_000_000));
    let harness = Harness::new(store);

    for quantity in ["100000", "2147483647"] {
        let response = harness
            .send(post_form(
                "/checkout",
                &format!("product_id=1&quantity={quantity}"),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "quantity {quantity}");
        assert_eq!(body_text(response).await, "Invalid quantity");
    }

    // The largest order that still fits is accepted.
    let response = harness
        .send(post_form("/checkout", "product_id=1&quantity=66666"))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    assert_eq!(harness.store.order_count(), 1);
    assert_eq!(harness.metrics().request_count("POST", "/checkout", 400), 2);
}

#[tokio::test]
async fn fractional_prices_keep_exact_totals() {
    let store = Arc::new(MemoryStore::new());
    store.insert_product("Sticker", Decimal::new(10, 2));
    let harness = Harness::new(store);

    let response = harness
        .send(post_form("/checkout", "product_id=1&quantity=3"))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let order = harness.store.get_order(1).await.unwrap();
    assert_eq!(order.total, Decimal::new(30, 2));

    let page = body_text(harness.send(get("/success?order_id=1")).await).await;
    assert!(page.contains("0.30"), "page should show the exact total");
}

#[tokio::test]
async fn reading_a_count_adds_no_series() {
    let harness = Harness::with_widget();

    assert_eq!(harness.metrics().request_count("DELETE", "/nowhere", 418), 0);
    let text = harness.metrics().encode().unwrap();
    assert!(!text.contains("/nowhere"), "{text}");
}

#[tokio::test]
async fn success_maps_missing_records_to_not_found() {
    let store = Arc::new(MemoryStore::new());
    let product = store.insert_product("Widget", Decimal::from(100));
    // An order pointing at a product the store does not know.
    store
        .create_order(NewOrder {
            product_id: product.id + 1,
            quantity: 1,
            total: Decimal::ONE,
        })
        .await
        .unwrap();
    let harness = Harness::new(store);

    let response = harness.send(get("/success?order_id=42")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(response).await, "Order not found");

    let response = harness.send(get("/success?order_id=1")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(response).await, "Product not found");

    let response = harness.send(get("/success?order_id=abc")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = harness.send(get("/success")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(harness.metrics().request_count("GET", "/success", 404), 2);
    assert_eq!(harness.metrics().request_count("GET", "/success", 400), 2);
}

#[tokio::test]
async fn every_request_is_recorded_exactly_once() {
    let harness = Harness::with_widget();

    harness.send(get("/")).await;
    harness
        .send(post_form("/checkout", "product_id=1&quantity=1"))
        .await;
    harness.send(get("/checkout")).await;
    harness
        .send(post_form("/checkout", "product_id=7&quantity=1"))
        .await;
    harness.send(get("/success?order_id=1")).await;
    harness.send(get("/success?order_id=5")).await;
    // Wrong method on a GET-only route is answered by the router itself.
    harness.send(post_form("/success", "")).await;

    let metrics = harness.metrics();
    assert_eq!(metrics.request_count("GET", "/", 200), 1);
    assert_eq!(metrics.request_count("POST", "/checkout", 303), 1);
    assert_eq!(metrics.request_count("GET", "/checkout", 405), 1);
    assert_eq!(metrics.request_count("POST", "/checkout", 404), 1);
    assert_eq!(metrics.request_count("GET", "/success", 200), 1);
    assert_eq!(metrics.request_count("GET", "/success", 404), 1);
    assert_eq!(metrics.request_count("POST", "/success", 405), 1);

    assert_eq!(duration_observations(metrics, "GET", "/"), 1);
    assert_eq!(duration_observations(metrics, "POST", "/checkout"), 2);
    assert_eq!(duration_observations(metrics, "GET", "/checkout"), 1);
    assert_eq!(duration_observations(metrics, "GET", "/success"), 2);
    assert_eq!(duration_observations(metrics, "POST", "/success"), 1);
}

struct BrokenStore;

#[async_trait]
impl Store for BrokenStore {
    fn backend(&self) -> &'static str {
        "broken"
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        Err(StoreError::Query(sqlx::Error::PoolClosed))
    }

    async fn get_product(&self, id: i32) -> StoreResult<Product> {
        Ok(Product {
            id,
            name: "Widget".into(),
            price: Decimal::ONE,
        })
    }

    async fn create_order(&self, _order: NewOrder) -> StoreResult<i32> {
        Err(StoreError::Query(sqlx::Error::PoolClosed))
    }

    async fn get_order(&self, _id: i32) -> StoreResult<Order> {
        Err(StoreError::Query(sqlx::Error::PoolClosed))
    }

    async fn shutdown(&self) {}
}

#[tokio::test]
async fn store_failures_are_server_errors() {
    let state = AppState::new(Arc::new(Traced::new(BrokenStore))).unwrap();
    let app = create_app(state.clone());

    let response = app.clone().oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(response).await, "Failed to get products");

    let response = app
        .clone()
        .oneshot(post_form("/checkout", "product_id=1&quantity=2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(response).await, "Failed to create order");

    assert_eq!(state.metrics.orders_created_total.get(), 0);
    assert_eq!(state.metrics.request_count("GET", "/", 500), 1);
    assert_eq!(state.metrics.request_count("POST", "/checkout", 500), 1);
    assert_eq!(duration_observations(&state.metrics, "GET", "/"), 1);
}

#[tokio::test]
async fn metrics_endpoint_exposes_counters() {
    let harness = Harness::with_widget();
    harness
        .send(post_form("/checkout", "product_id=1&quantity=2"))
        .await;

    let response = harness.send(get("/metrics")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let text = body_text(response).await;

    assert!(text.contains("orders_created_total 1"));
    assert!(text.contains("http_requests_total{"));
    assert!(text.contains("status=\"303\""));
    // Scrapes are not counted as shop traffic.
    assert_eq!(duration_observations(harness.metrics(), "GET", "/metrics"), 0);
}

#[tokio::test]
async fn docs_are_served() {
    let harness = Harness::with_widget();
    let response = harness.send(get("/docs")).await;
    assert_eq!(response.status(), StatusCode::OK);
}
