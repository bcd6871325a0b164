// core/src/store/memory.rs

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{NewOrder, Order, OrderLineItem, OrderPatch};
use crate::store::{OrderStore, UpdateOutcome};

#[derive(Debug, Clone)]
struct StoredOrder {
  order: Order,
  items: Vec<OrderLineItem>,
}

/// Process-local order store. Used by tests and by local runs without a database.
///
/// `write_count` counts every successful create and applied update.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
  orders: RwLock<HashMap<Uuid, StoredOrder>>,
  writes: AtomicUsize,
  unavailable: RwLock<Option<String>>,
}

impl InMemoryOrderStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn write_count(&self) -> usize {
    self.writes.load(Ordering::SeqCst)
  }

  pub fn len(&self) -> usize {
    self.orders.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.orders.read().is_empty()
  }

  /// Makes every subsequent call fail with `StoreError::Unavailable(reason)`;
  /// `None` restores normal operation.
  pub fn set_unavailable(&self, reason: Option<&str>) {
    *self.unavailable.write() = reason.map(str::to_string);
  }

  fn check_available(&self) -> Result<(), StoreError> {
    match self.unavailable.read().as_ref() {
      Some(reason) => Err(StoreError::Unavailable(reason.clone())),
      None => Ok(()),
    }
  }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
  async fn create(&self, new_order: NewOrder) -> Result<(), StoreError> {
    self.check_available()?;
    let mut orders = self.orders.write();
    if orders.contains_key(&new_order.order_id) {
      return Err(StoreError::Duplicate(new_order.order_id.to_string()));
    }
    let stored = StoredOrder {
      order: Order::from_new(&new_order),
      items: new_order.items.clone(),
    };
    orders.insert(new_order.order_id, stored);
    self.writes.fetch_add(1, Ordering::SeqCst);
    debug!(order_id = %new_order.order_id, "Order recorded in memory store.");
    Ok(())
  }

  async fn update(&self, order_id: Uuid, patch: OrderPatch) -> Result<UpdateOutcome, StoreError> {
    self.check_available()?;
    let mut orders = self.orders.write();
    let stored = orders
      .get_mut(&order_id)
      .ok_or_else(|| StoreError::NotFound(order_id.to_string()))?;

    if let Some(expected) = patch.only_if_status {
      if stored.order.payment_status != expected {
        return Ok(UpdateOutcome::Skipped {
          current: stored.order.payment_status,
        });
      }
    }
    stored.order.apply(&patch, Utc::now());
    self.writes.fetch_add(1, Ordering::SeqCst);
    Ok(UpdateOutcome::Applied)
  }

  async fn read(&self, order_id: Uuid) -> Result<Order, StoreError> {
    self.check_available()?;
    self
      .orders
      .read()
      .get(&order_id)
      .map(|stored| stored.order.clone())
      .ok_or_else(|| StoreError::NotFound(order_id.to_string()))
  }

  async fn line_items(&self, order_id: Uuid) -> Result<Vec<OrderLineItem>, StoreError> {
    self.check_available()?;
    self
      .orders
      .read()
      .get(&order_id)
      .map(|stored| stored.items.clone())
      .ok_or_else(|| StoreError::NotFound(order_id.to_string()))
  }
}
