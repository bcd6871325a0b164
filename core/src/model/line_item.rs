// core/src/model/line_item.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;

/// A cart line as submitted with the payment request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
  /// Catalog product identifier.
  #[serde(rename = "id")]
  pub product_id: String,
  pub quantity: u32,
  pub price: Decimal,
  /// Selected product options (caliber, color, size, ...).
  #[serde(default)]
  pub options: Map<String, JsonValue>,
}

impl CartLine {
  pub fn line_total(&self) -> Decimal {
    self.price * Decimal::from(self.quantity)
  }
}

/// Line item as recorded with the order. Price and options are a snapshot taken
/// at submission and are never re-read from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLineItem {
  pub order_id: Uuid,
  pub product_id: String,
  pub quantity: u32,
  pub unit_price: Decimal,
  pub line_total: Decimal,
  pub options: Map<String, JsonValue>,
}

impl OrderLineItem {
  pub fn snapshot(order_id: Uuid, line: &CartLine) -> Self {
    Self {
      order_id,
      product_id: line.product_id.clone(),
      quantity: line.quantity,
      unit_price: line.price,
      line_total: line.line_total(),
      options: line.options.clone(),
    }
  }
}
