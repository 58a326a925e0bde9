use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::json;

use storefront_api::app::{
    self,
    services::{InventoryGateway, InventoryServices, OrderServices, ProductServices},
};
use storefront_infra::inventory_client::{FailurePolicy, HttpInventoryClient, InventoryApi};
use storefront_infra::resilience::{CircuitBreakerConfig, RetryPolicy};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(app: axum::Router) -> Self {
        // Same routers as prod, bound to an ephemeral port.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn spawn_inventory() -> TestServer {
    TestServer::spawn(app::build_inventory_app(InventoryServices::in_memory())).await
}

async fn spawn_orders(inventory_url: &str) -> TestServer {
    let http: Arc<dyn InventoryApi> =
        Arc::new(HttpInventoryClient::new(inventory_url, Duration::from_millis(500)).unwrap());
    let gateway = InventoryGateway::with_settings(
        http,
        RetryPolicy::fixed(2, Duration::from_millis(10)),
        CircuitBreakerConfig::default(),
        FailurePolicy::FailClosed,
    );
    TestServer::spawn(app::build_order_app(OrderServices::new(Arc::new(gateway)))).await
}

/// Address nothing listens on.
fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    format!("http://{}", listener.local_addr().unwrap())
}

fn decimal(value: &serde_json::Value) -> Decimal {
    value.as_str().unwrap().parse().unwrap()
}

async fn add_stock(client: &reqwest::Client, inventory: &TestServer, sku: &str, quantity: i64) -> serde_json::Value {
    let res = client
        .post(inventory.url("/api/inventory"))
        .json(&json!({ "skuCode": sku, "quantity": quantity }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

async fn in_stock(client: &reqwest::Client, inventory: &TestServer, sku: &str, quantity: i64) -> bool {
    let res = client
        .get(inventory.url("/api/inventory/stock"))
        .query(&[("skuCode", sku.to_string()), ("quantity", quantity.to_string())])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    res.json().await.unwrap()
}

#[tokio::test]
async fn every_service_reports_health() {
    let client = reqwest::Client::new();
    let inventory = spawn_inventory().await;
    let orders = spawn_orders(&inventory.base_url).await;
    let products = TestServer::spawn(app::build_product_app(ProductServices::in_memory())).await;

    for srv in [&inventory, &orders, &products] {
        let res = client.get(srv.url("/health")).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn inventory_stock_query_and_reduce() {
    let client = reqwest::Client::new();
    let inventory = spawn_inventory().await;

    let created = add_stock(&client, &inventory, "iphone_13", 100).await;
    assert_eq!(created["skuCode"], "iphone_13");
    assert_eq!(created["quantity"], 100);

    assert!(in_stock(&client, &inventory, "iphone_13", 100).await);
    assert!(!in_stock(&client, &inventory, "iphone_13", 101).await);
    assert!(!in_stock(&client, &inventory, "unknown_sku", 1).await);

    let res = client
        .post(inventory.url("/api/inventory/reduce"))
        .query(&[("skuCode", "iphone_13"), ("quantity", "30")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(inventory.url("/api/inventory/reduce"))
        .query(&[("skuCode", "iphone_13"), ("quantity", "1000")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "insufficient_stock");

    let res = client
        .post(inventory.url("/api/inventory/reduce"))
        .query(&[("skuCode", "pixel_8"), ("quantity", "1")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let list: Vec<serde_json::Value> = client
        .get(inventory.url("/api/inventory"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["quantity"], 70);
}

#[tokio::test]
async fn inventory_validation_update_and_delete() {
    let client = reqwest::Client::new();
    let inventory = spawn_inventory().await;

    let res = client
        .post(inventory.url("/api/inventory"))
        .json(&json!({ "skuCode": "iphone_13", "quantity": -1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    let first = add_stock(&client, &inventory, "iphone_13", 5).await;
    add_stock(&client, &inventory, "pixel_8", 5).await;
    let id = first["id"].as_u64().unwrap();

    let res = client
        .put(inventory.url(&format!("/api/inventory/update/{id}")))
        .json(&json!({ "skuCode": "pixel_8", "quantity": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = client
        .put(inventory.url(&format!("/api/inventory/update/{id}")))
        .json(&json!({ "skuCode": "iphone_13_pro", "quantity": 9 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: serde_json::Value = res.json().await.unwrap();
    assert_eq!(updated["id"].as_u64(), Some(id));
    assert_eq!(updated["skuCode"], "iphone_13_pro");

    let res = client
        .delete(inventory.url(&format!("/api/inventory/delete/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "Inventory deleted successfully");

    let res = client
        .delete(inventory.url(&format!("/api/inventory/delete/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .delete(inventory.url("/api/inventory/delete/not-a-number"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn order_placement_across_services() {
    let client = reqwest::Client::new();
    let inventory = spawn_inventory().await;
    let orders = spawn_orders(&inventory.base_url).await;
    add_stock(&client, &inventory, "iphone_13", 100).await;

    let res = client
        .post(orders.url("/api/order"))
        .json(&json!({ "skuCode": "iphone_13", "price": "1299.99", "quantity": 60 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let placed: serde_json::Value = res.json().await.unwrap();
    assert_eq!(placed["status"], "placed");
    assert_eq!(placed["stage"], "stock_reduced");
    assert_eq!(placed["quantity"], 60);
    assert_eq!(decimal(&placed["price"]), Decimal::new(129999, 2));
    assert!(!placed["orderNumber"].as_str().unwrap().is_empty());

    // 40 left: a second order for 60 is denied and stock is untouched.
    assert!(!in_stock(&client, &inventory, "iphone_13", 41).await);
    assert!(in_stock(&client, &inventory, "iphone_13", 40).await);

    let res = client
        .post(orders.url("/api/order"))
        .json(&json!({ "skuCode": "iphone_13", "price": 1299.99, "quantity": 60 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "product_not_in_stock");
    assert!(body["message"].as_str().unwrap().contains("iphone_13"));
    assert!(in_stock(&client, &inventory, "iphone_13", 40).await);

    let all: Vec<serde_json::Value> = client
        .get(orders.url("/api/order"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.len(), 1);

    let id = placed["id"].as_u64().unwrap();
    let res = client.get(orders.url(&format!("/api/order/{id}"))).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let fetched: serde_json::Value = res.json().await.unwrap();
    assert_eq!(fetched["orderNumber"], placed["orderNumber"]);

    let res = client
        .delete(orders.url(&format!("/api/order/delete/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let res = client.get(orders.url(&format!("/api/order/{id}"))).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn invalid_order_is_rejected_before_inventory_is_asked() {
    let client = reqwest::Client::new();
    let orders = spawn_orders(&closed_port_url()).await;

    for body in [
        json!({ "skuCode": "iphone_13", "price": 10, "quantity": 0 }),
        json!({ "skuCode": "", "price": 10, "quantity": 1 }),
        json!({ "skuCode": "iphone_13", "price": -1, "quantity": 1 }),
    ] {
        let res = client.post(orders.url("/api/order")).json(&body).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    let health: serde_json::Value = client
        .get(orders.url("/api/order/inventory-health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(health["recentFailures"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn inventory_outage_fails_closed() {
    let client = reqwest::Client::new();
    let orders = spawn_orders(&closed_port_url()).await;

    let res = client
        .post(orders.url("/api/order"))
        .json(&json!({ "skuCode": "iphone_13", "price": 10, "quantity": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "product_not_in_stock");

    let all: Vec<serde_json::Value> = client
        .get(orders.url("/api/order"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(all.is_empty());

    let health: serde_json::Value = client
        .get(orders.url("/api/order/inventory-health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["failurePolicy"], "fail_closed");
    assert_eq!(health["circuitState"], "closed");
    let failures = health["recentFailures"].as_array().unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0]["operation"], "check_stock");
    assert_eq!(failures[0]["kind"], "retries_exhausted");
}

#[tokio::test]
async fn product_catalog_endpoints() {
    let client = reqwest::Client::new();
    let products = TestServer::spawn(app::build_product_app(ProductServices::in_memory())).await;

    let res = client
        .post(products.url("/api/product"))
        .json(&json!({ "name": "iPhone 15", "description": "Apple smartphone", "price": 999 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let phone: serde_json::Value = res.json().await.unwrap();
    assert_eq!(decimal(&phone["price"]), Decimal::from(999));

    // One bad draft: nothing from the batch is created.
    let res = client
        .post(products.url("/api/product/bulk"))
        .json(&json!([
            { "name": "Pixel 8", "description": "Google smartphone", "price": 699 },
            { "name": "", "description": "nameless", "price": 1 },
        ]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(products.url("/api/product/bulk"))
        .json(&json!([
            { "name": "Pixel 8", "description": "Google smartphone", "price": 699 },
            { "name": "USB cable", "description": "Braided", "price": "15.50" },
        ]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Vec<serde_json::Value> = res.json().await.unwrap();
    assert_eq!(created[0]["name"], "Pixel 8");
    assert_eq!(created[1]["name"], "USB cable");

    let all: Vec<serde_json::Value> = client
        .get(products.url("/api/product"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.len(), 3);

    let res = client
        .get(products.url("/api/product/price?minPrice=600&maxPrice=999"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let ranged: Vec<serde_json::Value> = res.json().await.unwrap();
    assert_eq!(ranged.len(), 2);

    let res = client
        .get(products.url("/api/product/price?minPrice=5000&maxPrice=6000"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(products.url("/api/product/price?minPrice=10&maxPrice=1"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let found: Vec<serde_json::Value> = client
        .get(products.url("/api/product/search?keyword=smartphone"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(found.len(), 2);

    let id = phone["id"].as_str().unwrap();
    let res = client
        .put(products.url(&format!("/api/product/update/{id}")))
        .json(&json!({ "name": "iPhone 15 Pro", "description": "Apple smartphone", "price": 1199 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: serde_json::Value = res.json().await.unwrap();
    assert_eq!(updated["id"], phone["id"]);
    assert_eq!(updated["name"], "iPhone 15 Pro");

    let res = client
        .delete(products.url(&format!("/api/product/delete/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let res = client
        .delete(products.url(&format!("/api/product/delete/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
