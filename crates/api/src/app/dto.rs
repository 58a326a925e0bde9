use rust_decimal::Decimal;
use serde::Deserialize;

use storefront_core::DomainResult;
use storefront_infra::inventory_client::FailureRecord;
use storefront_infra::PlacementReceipt;
use storefront_inventory::StockRecord;
use storefront_orders::{Order, PlaceOrder};
use storefront_products::{Product, ProductDraft};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRequest {
    pub sku_code: String,
    pub quantity: i64,
}

/// `?skuCode=..&quantity=..`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockQuery {
    pub sku_code: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub sku_code: String,
    pub price: Decimal,
    pub quantity: i64,
}

impl OrderRequest {
    pub fn into_command(self) -> DomainResult<PlaceOrder> {
        PlaceOrder::new(&self.sku_code, self.price, self.quantity)
    }
}

#[derive(Debug, Deserialize)]
pub struct ProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
}

impl ProductRequest {
    pub fn into_draft(self) -> DomainResult<ProductDraft> {
        ProductDraft::new(self.name, self.description, self.price)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRangeQuery {
    pub min_price: Decimal,
    pub max_price: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub keyword: String,
}

// -------------------------
// Response mapping
// -------------------------

pub fn stock_record_to_json(record: &StockRecord) -> serde_json::Value {
    serde_json::json!({
        "id": record.id_typed().value(),
        "skuCode": record.sku_code().as_str(),
        "quantity": record.quantity(),
        "updatedAt": record.updated_at().to_rfc3339(),
    })
}

pub fn order_to_json(order: &Order) -> serde_json::Value {
    serde_json::json!({
        "id": order.id_typed().value(),
        "orderNumber": order.order_number().to_string(),
        "skuCode": order.sku_code().as_str(),
        "price": order.price().amount(),
        "quantity": order.quantity(),
        "placedAt": order.placed_at().to_rfc3339(),
    })
}

pub fn receipt_to_json(receipt: &PlacementReceipt) -> serde_json::Value {
    let mut body = order_to_json(&receipt.order);
    if let Some(obj) = body.as_object_mut() {
        obj.insert("status".to_string(), serde_json::json!("placed"));
        obj.insert("stage".to_string(), serde_json::json!(receipt.stage));
        obj.insert("stockReduced".to_string(), serde_json::json!(!receipt.stock_drifted()));
    }
    body
}

pub fn product_to_json(product: &Product) -> serde_json::Value {
    serde_json::json!({
        "id": product.id_typed().to_string(),
        "name": product.name(),
        "description": product.description(),
        "price": product.price().amount(),
    })
}

pub fn failure_to_json(failure: &FailureRecord) -> serde_json::Value {
    serde_json::json!({
        "at": failure.at.to_rfc3339(),
        "operation": failure.operation,
        "skuCode": failure.sku_code,
        "quantity": failure.quantity,
        "kind": failure.kind,
        "reason": failure.reason,
    })
}
