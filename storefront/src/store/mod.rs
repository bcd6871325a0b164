// storefront/src/store/mod.rs

pub mod pg_order_store;

pub use pg_order_store::PgOrderStore;
