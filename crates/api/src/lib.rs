//! HTTP API of the inventory, order and product services.

pub mod app;
pub mod middleware;
