//! Order domain module.
//!
//! Orders are immutable records created by the placement flow in
//! `storefront-infra`. This crate holds the entity, request validation and the
//! placement stage machine (no IO).

pub mod order;
pub mod placement;

pub use order::{Order, PlaceOrder};
pub use placement::{PlacementStage, StageError};
