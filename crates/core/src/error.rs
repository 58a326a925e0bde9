//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// missing records, stock rules, conflicts). Infrastructure concerns such as
/// storage or network failures belong to the infra layer's own error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. negative quantity, empty SKU).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A requested entity was not found (by id or by SKU).
    #[error("not found: {0}")]
    NotFound(String),

    /// A reduction asked for more units than the ledger holds.
    #[error("insufficient stock for sku {sku}: requested {requested}, available {available}")]
    InsufficientStock {
        sku: String,
        requested: i64,
        available: i64,
    },

    /// Order-time denial: inventory did not confirm availability.
    #[error("product with sku {sku} is not in stock")]
    ProductNotInStock { sku: String },

    /// A uniqueness or state conflict (e.g. SKU already owned by another record).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn insufficient_stock(sku: impl Into<String>, requested: i64, available: i64) -> Self {
        Self::InsufficientStock {
            sku: sku.into(),
            requested,
            available,
        }
    }

    pub fn product_not_in_stock(sku: impl Into<String>) -> Self {
        Self::ProductNotInStock { sku: sku.into() }
    }

    /// Stable machine-readable code (used in HTTP error bodies).
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "validation_error",
            DomainError::NotFound(_) => "not_found",
            DomainError::InsufficientStock { .. } => "insufficient_stock",
            DomainError::ProductNotInStock { .. } => "product_not_in_stock",
            DomainError::Conflict(_) => "conflict",
        }
    }
}
