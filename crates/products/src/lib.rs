//! Product catalog domain module.
//!
//! Plain catalog records with keyword search and price-range matching. The
//! catalog service that stores them lives in `storefront-infra`.

pub mod product;

pub use product::{PriceRange, Product, ProductDraft};
