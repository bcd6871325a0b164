// storefront/src/store/pg_order_store.rs

//! Postgres-backed [`OrderStore`], using runtime-checked sqlx queries.

use async_trait::async_trait;
use checkout_core::{NewOrder, Order, OrderLineItem, OrderPatch, OrderStore, PaymentStatus, StoreError, UpdateOutcome};
use sqlx::PgPool;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::models::order::ORDER_COLUMNS;
use crate::models::{OrderItemRow, OrderRow};

#[derive(Clone)]
pub struct PgOrderStore {
  pool: PgPool,
}

impl PgOrderStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

fn unavailable(context: &str, err: sqlx::Error) -> StoreError {
  error!(error = %err, "{} failed.", context);
  StoreError::Unavailable(format!("{}: {}", context, err))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
  err
    .as_database_error()
    .map(|db_err| db_err.is_unique_violation())
    .unwrap_or(false)
}

#[async_trait]
impl OrderStore for PgOrderStore {
  #[instrument(name = "pg_store::create", skip_all, fields(order_id = %order.order_id, items = order.items.len()))]
  async fn create(&self, order: NewOrder) -> Result<(), StoreError> {
    let mut tx = self.pool.begin().await.map_err(|e| unavailable("begin transaction", e))?;

    let inserted = sqlx::query(
      "INSERT INTO orders (id, user_id, payment_status, total_amount, shipping_address, billing_address, email, phone, \
       payment_method, shipping_method, created_at, updated_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)",
    )
    .bind(order.order_id)
    .bind(order.user_id)
    .bind(PaymentStatus::Pending.as_str())
    .bind(order.total_amount)
    .bind(&order.shipping_address)
    .bind(&order.billing_address)
    .bind(&order.email)
    .bind(&order.phone)
    .bind(Order::PAYMENT_METHOD)
    .bind(Order::SHIPPING_METHOD)
    .bind(order.created_at)
    .execute(&mut *tx)
    .await;

    if let Err(e) = inserted {
      if is_unique_violation(&e) {
        return Err(StoreError::Duplicate(order.order_id.to_string()));
      }
      return Err(unavailable("insert order", e));
    }

    for item in &order.items {
      let quantity = i32::try_from(item.quantity)
        .map_err(|_| StoreError::Unavailable(format!("quantity {} out of range", item.quantity)))?;
      sqlx::query(
        "INSERT INTO order_items (order_id, product_id, quantity, price_at_time_of_order, total_price, options) \
         VALUES ($1, $2, $3, $4, $5, $6)",
      )
      .bind(order.order_id)
      .bind(&item.product_id)
      .bind(quantity)
      .bind(item.unit_price)
      .bind(item.line_total)
      .bind(serde_json::Value::Object(item.options.clone()))
      .execute(&mut *tx)
      .await
      .map_err(|e| unavailable("insert order item", e))?;
    }

    tx.commit().await.map_err(|e| unavailable("commit order", e))?;
    info!("Order and line items stored.");
    Ok(())
  }

  #[instrument(name = "pg_store::update", skip(self, patch))]
  async fn update(&self, order_id: Uuid, patch: OrderPatch) -> Result<UpdateOutcome, StoreError> {
    let updated: Option<Uuid> = sqlx::query_scalar(
      "UPDATE orders SET \
         payment_status = COALESCE($2, payment_status), \
         payment_processor_response = COALESCE($3, payment_processor_response), \
         response_message = COALESCE($4, response_message), \
         user_id = COALESCE($5, user_id), \
         updated_at = NOW() \
       WHERE id = $1 AND ($6::text IS NULL OR payment_status = $6) \
       RETURNING id",
    )
    .bind(order_id)
    .bind(patch.payment_status.map(|s| s.as_str()))
    .bind(patch.payment_processor_response)
    .bind(patch.response_message)
    .bind(patch.user_id)
    .bind(patch.only_if_status.map(|s| s.as_str()))
    .fetch_optional(&self.pool)
    .await
    .map_err(|e| unavailable("update order", e))?;

    if updated.is_some() {
      return Ok(UpdateOutcome::Applied);
    }

    // Nothing matched: either the order is missing or the guard held it back.
    let current: Option<String> = sqlx::query_scalar("SELECT payment_status FROM orders WHERE id = $1")
      .bind(order_id)
      .fetch_optional(&self.pool)
      .await
      .map_err(|e| unavailable("read order status", e))?;

    match current {
      None => Err(StoreError::NotFound(order_id.to_string())),
      Some(status) => {
        let current = status
          .parse::<PaymentStatus>()
          .map_err(|e| StoreError::Unavailable(format!("order {} has a corrupt status: {}", order_id, e)))?;
        Ok(UpdateOutcome::Skipped { current })
      }
    }
  }

  #[instrument(name = "pg_store::read", skip(self))]
  async fn read(&self, order_id: Uuid) -> Result<Order, StoreError> {
    let row: Option<OrderRow> = sqlx::query_as(&format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS))
      .bind(order_id)
      .fetch_optional(&self.pool)
      .await
      .map_err(|e| unavailable("read order", e))?;

    row
      .ok_or_else(|| StoreError::NotFound(order_id.to_string()))
      .and_then(Order::try_from)
  }

  #[instrument(name = "pg_store::line_items", skip(self))]
  async fn line_items(&self, order_id: Uuid) -> Result<Vec<OrderLineItem>, StoreError> {
    let rows: Vec<OrderItemRow> = sqlx::query_as(
      "SELECT order_id, product_id, quantity, price_at_time_of_order, total_price, options \
       FROM order_items WHERE order_id = $1 ORDER BY id ASC",
    )
    .bind(order_id)
    .fetch_all(&self.pool)
    .await
    .map_err(|e| unavailable("read order items", e))?;

    rows.into_iter().map(OrderLineItem::try_from).collect()
  }
}
