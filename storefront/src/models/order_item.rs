// storefront/src/models/order_item.rs

use checkout_core::{OrderLineItem, StoreError};
use rust_decimal::Decimal;
use serde_json::{Map, Value as JsonValue};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct OrderItemRow {
  pub order_id: Uuid,
  pub product_id: String,
  pub quantity: i32,
  pub price_at_time_of_order: Decimal,
  pub total_price: Decimal,
  pub options: JsonValue,
}

impl TryFrom<OrderItemRow> for OrderLineItem {
  type Error = StoreError;

  fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
    let quantity = u32::try_from(row.quantity)
      .map_err(|_| StoreError::Unavailable(format!("order {} has a negative item quantity", row.order_id)))?;
    let options = match row.options {
      JsonValue::Object(map) => map,
      _ => Map::new(),
    };
    Ok(OrderLineItem {
      order_id: row.order_id,
      product_id: row.product_id,
      quantity,
      unit_price: row.price_at_time_of_order,
      line_total: row.total_price,
      options,
    })
  }
}
