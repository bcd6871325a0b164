// storefront/src/models/order.rs

use checkout_core::{Order, PaymentStatus, StoreError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

pub const ORDER_COLUMNS: &str = "id, user_id, payment_status, total_amount, shipping_address, billing_address, \
   email, phone, payment_method, shipping_method, payment_processor_response, response_message, created_at, updated_at";

#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
  pub id: Uuid,
  pub user_id: Option<Uuid>,
  pub payment_status: String,
  pub total_amount: Decimal,
  pub shipping_address: String,
  pub billing_address: String,
  pub email: String,
  pub phone: Option<String>,
  pub payment_method: String,
  pub shipping_method: String,
  pub payment_processor_response: Option<JsonValue>,
  pub response_message: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
  type Error = StoreError;

  fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
    let payment_status: PaymentStatus = row
      .payment_status
      .parse()
      .map_err(|e: String| StoreError::Unavailable(format!("order {} has a corrupt status: {}", row.id, e)))?;

    Ok(Order {
      order_id: row.id,
      user_id: row.user_id,
      payment_status,
      total_amount: row.total_amount,
      shipping_address: row.shipping_address,
      billing_address: row.billing_address,
      email: row.email,
      phone: row.phone,
      payment_method: row.payment_method,
      shipping_method: row.shipping_method,
      payment_processor_response: row.payment_processor_response,
      response_message: row.response_message,
      created_at: row.created_at,
      updated_at: row.updated_at,
    })
  }
}
