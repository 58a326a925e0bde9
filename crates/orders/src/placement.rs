//! Order placement stage machine.
//!
//! ```text
//! CheckingStock ──in stock──▶ StockConfirmed ──▶ OrderPersisted ──▶ StockReduced
//!       │
//!       └──not in stock──▶ StockDenied
//! ```
//!
//! `OrderPersisted` is also where a placement ends when the reduce call was
//! absorbed by the inventory client's fallback (stock drift).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlacementStage {
    #[default]
    CheckingStock,
    StockConfirmed,
    StockDenied,
    OrderPersisted,
    StockReduced,
}

/// Rejected stage transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageError {
    pub from: PlacementStage,
    pub to: PlacementStage,
}

impl core::fmt::Display for StageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "invalid placement transition {:?} -> {:?}", self.from, self.to)
    }
}

impl std::error::Error for StageError {}

impl PlacementStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlacementStage::StockDenied | PlacementStage::StockReduced)
    }

    pub fn can_advance_to(&self, next: PlacementStage) -> bool {
        use PlacementStage::*;
        matches!(
            (self, next),
            (CheckingStock, StockConfirmed)
                | (CheckingStock, StockDenied)
                | (StockConfirmed, OrderPersisted)
                | (OrderPersisted, StockReduced)
        )
    }

    pub fn advance(self, next: PlacementStage) -> Result<PlacementStage, StageError> {
        if self.can_advance_to(next) {
            Ok(next)
        } else {
            Err(StageError { from: self, to: next })
        }
    }

    /// Stage reached after the availability answer.
    pub fn after_stock_check(self, in_stock: bool) -> Result<PlacementStage, StageError> {
        if in_stock {
            self.advance(PlacementStage::StockConfirmed)
        } else {
            self.advance(PlacementStage::StockDenied)
        }
    }
}
