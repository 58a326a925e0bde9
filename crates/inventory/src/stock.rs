use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult, Entity, RecordId, SkuCode};

/// Validate a quantity that will be stored on a record.
pub fn ensure_stock_quantity(quantity: i64) -> DomainResult<()> {
    if quantity < 0 {
        return Err(DomainError::validation("stock quantity cannot be negative"));
    }
    Ok(())
}

/// Validate a quantity asked of the ledger (availability checks, reductions).
pub fn ensure_requested_quantity(quantity: i64) -> DomainResult<()> {
    if quantity < 0 {
        return Err(DomainError::validation("requested quantity cannot be negative"));
    }
    Ok(())
}

/// Entity: per-SKU stock record.
///
/// Invariant: `quantity >= 0`. Every constructor and mutator checks it, so a
/// record that exists is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    id: RecordId,
    sku_code: SkuCode,
    quantity: i64,
    updated_at: DateTime<Utc>,
}

impl StockRecord {
    pub fn new(
        id: RecordId,
        sku_code: SkuCode,
        quantity: i64,
        at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        ensure_stock_quantity(quantity)?;
        Ok(Self {
            id,
            sku_code,
            quantity,
            updated_at: at,
        })
    }

    pub fn id_typed(&self) -> RecordId {
        self.id
    }

    pub fn sku_code(&self) -> &SkuCode {
        &self.sku_code
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// True iff the record holds at least `requested` units.
    pub fn can_fulfil(&self, requested: i64) -> bool {
        self.quantity >= requested
    }

    /// Take `requested` units out of stock.
    ///
    /// Leaves the record untouched on error.
    pub fn reduce(&mut self, requested: i64, at: DateTime<Utc>) -> DomainResult<()> {
        ensure_requested_quantity(requested)?;
        if !self.can_fulfil(requested) {
            return Err(DomainError::insufficient_stock(
                self.sku_code.as_str(),
                requested,
                self.quantity,
            ));
        }
        self.quantity -= requested;
        self.updated_at = at;
        Ok(())
    }

    /// Overwrite the quantity (inventory add on an existing SKU).
    pub fn restock(&mut self, quantity: i64, at: DateTime<Utc>) -> DomainResult<()> {
        ensure_stock_quantity(quantity)?;
        self.quantity = quantity;
        self.updated_at = at;
        Ok(())
    }

    /// Overwrite both SKU and quantity (update by record id).
    pub fn reassign(&mut self, sku_code: SkuCode, quantity: i64, at: DateTime<Utc>) -> DomainResult<()> {
        ensure_stock_quantity(quantity)?;
        self.sku_code = sku_code;
        self.quantity = quantity;
        self.updated_at = at;
        Ok(())
    }
}

impl Entity for StockRecord {
    type Id = RecordId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
