// core/src/store/mod.rs

//! The order record store seam. The store is the only state shared between a
//! submission, its reconciliation and any number of pollers; every write is
//! keyed by order identifier.

pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{NewOrder, Order, OrderLineItem, OrderPatch, PaymentStatus};

pub use memory::InMemoryOrderStore;

/// Result of a keyed update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
  Applied,
  /// The `only_if_status` guard did not match; nothing was written.
  Skipped { current: PaymentStatus },
}

#[async_trait]
pub trait OrderStore: Send + Sync {
  /// Records the order (status `pending`) together with its line items, atomically.
  /// An existing identifier yields `StoreError::Duplicate`.
  async fn create(&self, order: NewOrder) -> Result<(), StoreError>;

  /// Updates an existing order. Never creates one: an unknown id yields `StoreError::NotFound`.
  async fn update(&self, order_id: Uuid, patch: OrderPatch) -> Result<UpdateOutcome, StoreError>;

  async fn read(&self, order_id: Uuid) -> Result<Order, StoreError>;

  async fn line_items(&self, order_id: Uuid) -> Result<Vec<OrderLineItem>, StoreError>;
}
