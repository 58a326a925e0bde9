//! Inventory dependency of the order service.
//!
//! `InventoryApi` is the raw remote interface (fallible, no policy).
//! `StockGateway` is what the order placement flow consumes: it never fails,
//! every failure is already converted to a fallback outcome.
//! `ResilientInventoryClient` turns the former into the latter.

pub mod http;
pub mod local;
pub mod resilient;
pub mod stub;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use storefront_core::SkuCode;

pub use http::HttpInventoryClient;
pub use local::LedgerInventoryApi;
pub use resilient::ResilientInventoryClient;
pub use stub::StubInventoryApi;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InventoryCallError {
    #[error("inventory service unreachable: {0}")]
    Transport(String),

    #[error("inventory service answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("undecodable inventory response: {0}")]
    Decode(String),
}

impl InventoryCallError {
    /// Transport problems, 5xx answers and garbled bodies are worth retrying;
    /// a 4xx is a definitive answer.
    pub fn is_transient(&self) -> bool {
        match self {
            InventoryCallError::Transport(_) | InventoryCallError::Decode(_) => true,
            InventoryCallError::Status { status, .. } => *status >= 500,
        }
    }
}

#[async_trait::async_trait]
pub trait InventoryApi: Send + Sync {
    async fn is_in_stock(&self, sku: &SkuCode, quantity: i64) -> Result<bool, InventoryCallError>;

    async fn reduce_stock(&self, sku: &SkuCode, quantity: i64) -> Result<(), InventoryCallError>;
}

#[async_trait::async_trait]
impl<A> InventoryApi for Arc<A>
where
    A: InventoryApi + ?Sized,
{
    async fn is_in_stock(&self, sku: &SkuCode, quantity: i64) -> Result<bool, InventoryCallError> {
        (**self).is_in_stock(sku, quantity).await
    }

    async fn reduce_stock(&self, sku: &SkuCode, quantity: i64) -> Result<(), InventoryCallError> {
        (**self).reduce_stock(sku, quantity).await
    }
}

/// What an unanswered availability question resolves to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Unknown availability counts as out of stock.
    #[default]
    FailClosed,
    /// Unknown availability counts as in stock (risks overselling).
    FailOpen,
}

impl FailurePolicy {
    pub fn fallback_availability(self) -> bool {
        matches!(self, FailurePolicy::FailOpen)
    }
}

impl std::str::FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail_closed" | "closed" => Ok(Self::FailClosed),
            "fail_open" | "open" => Ok(Self::FailOpen),
            other => Err(format!("unknown failure policy '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StockCheck {
    /// The inventory service answered.
    Answered(bool),
    /// No answer; `available` comes from the failure policy.
    Fallback { available: bool, reason: String },
}

impl StockCheck {
    pub fn is_available(&self) -> bool {
        match self {
            StockCheck::Answered(available) | StockCheck::Fallback { available, .. } => *available,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, StockCheck::Fallback { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReduceOutcome {
    Reduced,
    /// The reduction did not happen and was swallowed (stock drift).
    Absorbed { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InventoryOperation {
    CheckStock,
    ReduceStock,
}

impl std::fmt::Display for InventoryOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InventoryOperation::CheckStock => f.write_str("check_stock"),
            InventoryOperation::ReduceStock => f.write_str("reduce_stock"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    CircuitOpen,
    RetriesExhausted,
    Rejected,
}

/// One journal entry of a call that ended in a fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub at: DateTime<Utc>,
    pub operation: InventoryOperation,
    pub sku_code: String,
    pub quantity: i64,
    pub kind: FailureKind,
    pub reason: String,
}

/// Stock operations as seen by order placement. Infallible by contract.
#[async_trait::async_trait]
pub trait StockGateway: Send + Sync {
    async fn check_stock(&self, sku: &SkuCode, quantity: i64) -> StockCheck;

    async fn reduce_stock(&self, sku: &SkuCode, quantity: i64) -> ReduceOutcome;
}

#[async_trait::async_trait]
impl<G> StockGateway for Arc<G>
where
    G: StockGateway + ?Sized,
{
    async fn check_stock(&self, sku: &SkuCode, quantity: i64) -> StockCheck {
        (**self).check_stock(sku, quantity).await
    }

    async fn reduce_stock(&self, sku: &SkuCode, quantity: i64) -> ReduceOutcome {
        (**self).reduce_stock(sku, quantity).await
    }
}
