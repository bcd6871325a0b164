// storefront/src/models/mod.rs

//! Database rows for the `orders` and `order_items` tables.

pub mod order;
pub mod order_item;

pub use order::OrderRow;
pub use order_item::OrderItemRow;
