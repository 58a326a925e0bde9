//! Stock ledger: the single owner of per-SKU stock records.
//!
//! All stock mutation goes through this interface. `reduce_stock` is a single
//! atomic check-and-decrement per SKU in every implementation: concurrent
//! reducers for the same SKU cannot both pass the check and overdraw it.

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use std::sync::Arc;

use thiserror::Error;

use storefront_core::{DomainError, RecordId, SkuCode};
use storefront_inventory::StockRecord;

pub use in_memory::InMemoryStockLedger;
#[cfg(feature = "postgres")]
pub use postgres::PostgresStockLedger;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("ledger storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    pub fn domain(&self) -> Option<&DomainError> {
        match self {
            LedgerError::Domain(e) => Some(e),
            LedgerError::Storage(_) => None,
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

#[async_trait::async_trait]
pub trait StockLedger: Send + Sync {
    /// Create the record for `sku`, or overwrite its quantity if it exists.
    async fn add_stock(&self, sku: &SkuCode, quantity: i64) -> LedgerResult<StockRecord>;

    /// Atomically take `quantity` units of `sku` out of stock.
    async fn reduce_stock(&self, sku: &SkuCode, quantity: i64) -> LedgerResult<StockRecord>;

    /// True iff a record for `sku` holds at least `quantity` units.
    async fn is_in_stock(&self, sku: &SkuCode, quantity: i64) -> LedgerResult<bool>;

    async fn find_by_sku(&self, sku: &SkuCode) -> LedgerResult<Option<StockRecord>>;

    /// All records, in record-id order.
    async fn list_stock(&self) -> LedgerResult<Vec<StockRecord>>;

    /// Overwrite SKU and quantity of the record with `id`.
    async fn update_stock(&self, id: RecordId, sku: &SkuCode, quantity: i64) -> LedgerResult<StockRecord>;

    async fn delete_stock(&self, id: RecordId) -> LedgerResult<StockRecord>;
}

#[async_trait::async_trait]
impl<L> StockLedger for Arc<L>
where
    L: StockLedger + ?Sized,
{
    async fn add_stock(&self, sku: &SkuCode, quantity: i64) -> LedgerResult<StockRecord> {
        (**self).add_stock(sku, quantity).await
    }

    async fn reduce_stock(&self, sku: &SkuCode, quantity: i64) -> LedgerResult<StockRecord> {
        (**self).reduce_stock(sku, quantity).await
    }

    async fn is_in_stock(&self, sku: &SkuCode, quantity: i64) -> LedgerResult<bool> {
        (**self).is_in_stock(sku, quantity).await
    }

    async fn find_by_sku(&self, sku: &SkuCode) -> LedgerResult<Option<StockRecord>> {
        (**self).find_by_sku(sku).await
    }

    async fn list_stock(&self) -> LedgerResult<Vec<StockRecord>> {
        (**self).list_stock().await
    }

    async fn update_stock(&self, id: RecordId, sku: &SkuCode, quantity: i64) -> LedgerResult<StockRecord> {
        (**self).update_stock(id, sku, quantity).await
    }

    async fn delete_stock(&self, id: RecordId) -> LedgerResult<StockRecord> {
        (**self).delete_stock(id).await
    }
}

pub(crate) fn sku_not_found(sku: &SkuCode) -> DomainError {
    DomainError::not_found(format!("inventory record with sku {sku}"))
}

pub(crate) fn id_not_found(id: RecordId) -> DomainError {
    DomainError::not_found(format!("inventory record with id {id}"))
}
