//! `storefront-core` - domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the inventory,
//! order and product services (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{OrderNumber, ProductId, RecordId};
pub use value_object::{Price, SkuCode, ValueObject};
