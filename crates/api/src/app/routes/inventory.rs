use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Extension, Path, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};

use storefront_core::{RecordId, SkuCode};

use crate::app::services::InventoryServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/api/inventory", post(add_inventory).get(list_inventory))
        .route("/api/inventory/update/:id", put(update_inventory))
        .route("/api/inventory/delete/:id", delete(delete_inventory))
        .route("/api/inventory/stock", get(is_in_stock))
        .route("/api/inventory/reduce", post(reduce_stock))
}

fn parse_sku(raw: &str) -> Result<SkuCode, axum::response::Response> {
    SkuCode::parse(raw).map_err(errors::domain_error_to_response)
}

fn parse_id(raw: &str) -> Result<RecordId, axum::response::Response> {
    raw.parse().map_err(errors::domain_error_to_response)
}

pub async fn add_inventory(
    Extension(services): Extension<Arc<InventoryServices>>,
    body: Result<Json<dto::InventoryRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::bad_request(e.body_text()),
    };
    let sku = match parse_sku(&body.sku_code) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match services.ledger.add_stock(&sku, body.quantity).await {
        Ok(record) => (StatusCode::CREATED, Json(dto::stock_record_to_json(&record))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn list_inventory(Extension(services): Extension<Arc<InventoryServices>>) -> axum::response::Response {
    match services.ledger.list_stock().await {
        Ok(records) => {
            let body: Vec<_> = records.iter().map(dto::stock_record_to_json).collect();
            Json(body).into_response()
        }
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn update_inventory(
    Extension(services): Extension<Arc<InventoryServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::InventoryRequest>, JsonRejection>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::bad_request(e.body_text()),
    };
    let sku = match parse_sku(&body.sku_code) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match services.ledger.update_stock(id, &sku, body.quantity).await {
        Ok(record) => Json(dto::stock_record_to_json(&record)).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn delete_inventory(
    Extension(services): Extension<Arc<InventoryServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.ledger.delete_stock(id).await {
        Ok(_) => (StatusCode::OK, "Inventory deleted successfully").into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn is_in_stock(
    Extension(services): Extension<Arc<InventoryServices>>,
    query: Result<Query<dto::StockQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return errors::bad_request(e.body_text()),
    };
    let sku = match parse_sku(&query.sku_code) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match services.ledger.is_in_stock(&sku, query.quantity).await {
        Ok(available) => Json(available).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn reduce_stock(
    Extension(services): Extension<Arc<InventoryServices>>,
    query: Result<Query<dto::StockQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return errors::bad_request(e.body_text()),
    };
    let sku = match parse_sku(&query.sku_code) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match services.ledger.reduce_stock(&sku, query.quantity).await {
        Ok(_) => StatusCode::OK.into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
