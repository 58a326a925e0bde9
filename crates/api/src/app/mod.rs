//! HTTP application wiring (Axum routers + service wiring).
//!
//! - `services.rs`: which ledger, store and inventory client each service runs on
//! - `routes/`: HTTP routes + handlers (one file per service)
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

fn with_common_layers(router: Router) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(router)
        .layer(ServiceBuilder::new().layer(axum::middleware::from_fn(middleware::request_logging)))
}

/// Inventory service router.
pub fn build_inventory_app(services: services::InventoryServices) -> Router {
    with_common_layers(routes::inventory::router().layer(Extension(Arc::new(services))))
}

/// Order service router.
pub fn build_order_app(services: services::OrderServices) -> Router {
    with_common_layers(routes::orders::router().layer(Extension(Arc::new(services))))
}

/// Product service router.
pub fn build_product_app(services: services::ProductServices) -> Router {
    with_common_layers(routes::products::router().layer(Extension(Arc::new(services))))
}

/// Serve `app` on an already-bound listener until the process is stopped.
pub async fn serve(listener: tokio::net::TcpListener, app: Router) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "listening");
    }
    axum::serve(listener, app).await
}
