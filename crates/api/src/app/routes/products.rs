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

use storefront_core::{DomainResult, ProductId};
use storefront_products::ProductDraft;

use crate::app::services::ProductServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/api/product", post(create_product).get(list_products))
        .route("/api/product/bulk", post(create_products_bulk))
        .route("/api/product/update/:id", put(update_product))
        .route("/api/product/delete/:id", delete(delete_product))
        .route("/api/product/price", get(products_by_price))
        .route("/api/product/search", get(search_products))
}

fn parse_id(raw: &str) -> Result<ProductId, axum::response::Response> {
    raw.parse().map_err(errors::domain_error_to_response)
}

fn products_json(products: &[storefront_products::Product]) -> Vec<serde_json::Value> {
    products.iter().map(dto::product_to_json).collect()
}

pub async fn create_product(
    Extension(services): Extension<Arc<ProductServices>>,
    body: Result<Json<dto::ProductRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::bad_request(e.body_text()),
    };
    let draft = match body.into_draft() {
        Ok(d) => d,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let product = services.catalog.create(draft);
    (StatusCode::CREATED, Json(dto::product_to_json(&product))).into_response()
}

pub async fn create_products_bulk(
    Extension(services): Extension<Arc<ProductServices>>,
    body: Result<Json<Vec<dto::ProductRequest>>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::bad_request(e.body_text()),
    };
    // Validate the whole batch before creating anything.
    let drafts: DomainResult<Vec<ProductDraft>> = body.into_iter().map(dto::ProductRequest::into_draft).collect();
    let drafts = match drafts {
        Ok(d) => d,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let created = services.catalog.create_bulk(drafts);
    (StatusCode::CREATED, Json(products_json(&created))).into_response()
}

pub async fn list_products(Extension(services): Extension<Arc<ProductServices>>) -> impl IntoResponse {
    Json(products_json(&services.catalog.list()))
}

pub async fn update_product(
    Extension(services): Extension<Arc<ProductServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::ProductRequest>, JsonRejection>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::bad_request(e.body_text()),
    };
    let draft = match body.into_draft() {
        Ok(d) => d,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.catalog.update(id, draft) {
        Ok(product) => Json(dto::product_to_json(&product)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_product(
    Extension(services): Extension<Arc<ProductServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.catalog.delete(id) {
        Ok(_) => (StatusCode::OK, "Product deleted successfully").into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn products_by_price(
    Extension(services): Extension<Arc<ProductServices>>,
    query: Result<Query<dto::PriceRangeQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return errors::bad_request(e.body_text()),
    };

    match services.catalog.by_price_range(query.min_price, query.max_price) {
        Ok(products) if products.is_empty() => StatusCode::NO_CONTENT.into_response(),
        Ok(products) => Json(products_json(&products)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn search_products(
    Extension(services): Extension<Arc<ProductServices>>,
    query: Result<Query<dto::SearchQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return errors::bad_request(e.body_text()),
    };
    Json(products_json(&services.catalog.search(&query.keyword))).into_response()
}
