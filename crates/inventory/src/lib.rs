//! Inventory domain module.
//!
//! This crate contains the stock rules for the inventory service, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage). Ledgers
//! in `storefront-infra` apply these rules under their own atomicity guarantees.

pub mod stock;

pub use stock::{StockRecord, ensure_requested_quantity, ensure_stock_quantity};
