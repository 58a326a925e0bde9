use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult, Entity, OrderNumber, Price, RecordId, SkuCode};

/// Command: PlaceOrder (validated request to buy `quantity` units of one SKU).
/// Only built through `new`, so a held value is always valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaceOrder {
    sku_code: SkuCode,
    price: Price,
    quantity: i64,
}

impl PlaceOrder {
    pub fn new(sku_code: &str, price: Decimal, quantity: i64) -> DomainResult<Self> {
        let sku_code = SkuCode::parse(sku_code)?;
        let price = Price::new(price)?;
        if quantity <= 0 {
            return Err(DomainError::validation("order quantity must be positive"));
        }
        Ok(Self {
            sku_code,
            price,
            quantity,
        })
    }

    pub fn sku_code(&self) -> &SkuCode {
        &self.sku_code
    }

    pub fn price(&self) -> Price {
        self.price
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }
}

/// Entity: a placed order.
///
/// Immutable once created; the only lifecycle operation left is deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: RecordId,
    order_number: OrderNumber,
    sku_code: SkuCode,
    price: Price,
    quantity: i64,
    placed_at: DateTime<Utc>,
}

impl Order {
    pub fn place(
        id: RecordId,
        order_number: OrderNumber,
        request: &PlaceOrder,
        placed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            order_number,
            sku_code: request.sku_code.clone(),
            price: request.price,
            quantity: request.quantity,
            placed_at,
        }
    }

    pub fn id_typed(&self) -> RecordId {
        self.id
    }

    pub fn order_number(&self) -> OrderNumber {
        self.order_number
    }

    pub fn sku_code(&self) -> &SkuCode {
        &self.sku_code
    }

    pub fn price(&self) -> Price {
        self.price
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn placed_at(&self) -> DateTime<Utc> {
        self.placed_at
    }
}

impl Entity for Order {
    type Id = RecordId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
