use storefront_core::{DomainError, SkuCode};

use crate::ledger::{LedgerError, StockLedger};

use super::{InventoryApi, InventoryCallError};

/// In-process inventory: answers straight from a stock ledger, reporting
/// ledger errors the way the inventory service would over HTTP.
#[derive(Debug, Clone)]
pub struct LedgerInventoryApi<L> {
    ledger: L,
}

impl<L: StockLedger> LedgerInventoryApi<L> {
    pub fn new(ledger: L) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }
}

fn as_call_error(err: LedgerError) -> InventoryCallError {
    let status = match &err {
        LedgerError::Domain(DomainError::Validation(_)) => 400,
        LedgerError::Domain(DomainError::NotFound(_)) => 404,
        LedgerError::Domain(_) => 409,
        LedgerError::Storage(_) => 500,
    };
    InventoryCallError::Status {
        status,
        body: err.to_string(),
    }
}

#[async_trait::async_trait]
impl<L: StockLedger> InventoryApi for LedgerInventoryApi<L> {
    async fn is_in_stock(&self, sku: &SkuCode, quantity: i64) -> Result<bool, InventoryCallError> {
        self.ledger.is_in_stock(sku, quantity).await.map_err(as_call_error)
    }

    async fn reduce_stock(&self, sku: &SkuCode, quantity: i64) -> Result<(), InventoryCallError> {
        self.ledger
            .reduce_stock(sku, quantity)
            .await
            .map(|_| ())
            .map_err(as_call_error)
    }
}
