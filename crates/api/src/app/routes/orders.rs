use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};

use storefront_core::RecordId;

use crate::app::services::OrderServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/api/order", post(place_order).get(list_orders))
        .route("/api/order/inventory-health", get(inventory_health))
        .route("/api/order/:id", get(get_order))
        .route("/api/order/delete/:id", delete(delete_order))
}

fn parse_id(raw: &str) -> Result<RecordId, axum::response::Response> {
    raw.parse().map_err(errors::domain_error_to_response)
}

pub async fn place_order(
    Extension(services): Extension<Arc<OrderServices>>,
    body: Result<Json<dto::OrderRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::bad_request(e.body_text()),
    };
    let command = match body.into_command() {
        Ok(c) => c,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.placement.place_order(command).await {
        Ok(receipt) => (StatusCode::CREATED, Json(dto::receipt_to_json(&receipt))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_orders(Extension(services): Extension<Arc<OrderServices>>) -> impl IntoResponse {
    let body: Vec<_> = services
        .placement
        .get_all_orders()
        .iter()
        .map(dto::order_to_json)
        .collect();
    Json(body)
}

pub async fn get_order(
    Extension(services): Extension<Arc<OrderServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.placement.get_order_by_id(id) {
        Ok(order) => Json(dto::order_to_json(&order)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_order(
    Extension(services): Extension<Arc<OrderServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.placement.delete_order_by_id(id) {
        Ok(_) => (StatusCode::OK, "Order deleted successfully").into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// Circuit state and the fallback journal of the inventory client.
pub async fn inventory_health(Extension(services): Extension<Arc<OrderServices>>) -> impl IntoResponse {
    let failures: Vec<_> = services
        .inventory
        .recent_failures()
        .iter()
        .map(dto::failure_to_json)
        .collect();
    Json(serde_json::json!({
        "circuitState": services.inventory.circuit_state(),
        "failurePolicy": services.inventory.failure_policy(),
        "recentFailures": failures,
    }))
}
