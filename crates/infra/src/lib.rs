//! Infrastructure layer: storage, the stock ledger, the resilient inventory
//! client and the service-level orchestration built on them.

pub mod catalog;
pub mod config;
pub mod inventory_client;
pub mod ledger;
pub mod order_placement;
pub mod record_store;
pub mod resilience;


pub use catalog::ProductCatalog;
pub use order_placement::{OrderPlacement, PlacementReceipt};
