pub mod inventory;
pub mod orders;
pub mod products;
pub mod system;
