// core/src/model/order.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::model::line_item::OrderLineItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
  Pending,
  Paid,
  Failed,
}

impl PaymentStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      PaymentStatus::Pending => "pending",
      PaymentStatus::Paid => "paid",
      PaymentStatus::Failed => "failed",
    }
  }

  pub fn is_terminal(&self) -> bool {
    !matches!(self, PaymentStatus::Pending)
  }
}

impl fmt::Display for PaymentStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for PaymentStatus {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "pending" => Ok(PaymentStatus::Pending),
      "paid" => Ok(PaymentStatus::Paid),
      "failed" => Ok(PaymentStatus::Failed),
      other => Err(format!("unknown payment status '{}'", other)),
    }
  }
}

/// Everything needed to record a new order. The status is always `pending`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewOrder {
  pub order_id: Uuid,
  pub user_id: Option<Uuid>,
  pub total_amount: Decimal,
  pub shipping_address: String,
  pub billing_address: String,
  pub email: String,
  pub phone: Option<String>,
  pub items: Vec<OrderLineItem>,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
  pub order_id: Uuid,
  pub user_id: Option<Uuid>,
  pub payment_status: PaymentStatus,
  pub total_amount: Decimal,
  pub shipping_address: String,
  pub billing_address: String,
  pub email: String,
  pub phone: Option<String>,
  pub payment_method: String,
  pub shipping_method: String,
  /// Normalized processor outcome plus the raw body; absent until the first reconciliation.
  pub payment_processor_response: Option<JsonValue>,
  /// Message shown to the customer once the order settles.
  pub response_message: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Order {
  pub const PAYMENT_METHOD: &'static str = "credit_card";
  pub const SHIPPING_METHOD: &'static str = "standard";

  /// The stored form of a freshly created order.
  pub fn from_new(new_order: &NewOrder) -> Self {
    Self {
      order_id: new_order.order_id,
      user_id: new_order.user_id,
      payment_status: PaymentStatus::Pending,
      total_amount: new_order.total_amount,
      shipping_address: new_order.shipping_address.clone(),
      billing_address: new_order.billing_address.clone(),
      email: new_order.email.clone(),
      phone: new_order.phone.clone(),
      payment_method: Self::PAYMENT_METHOD.to_string(),
      shipping_method: Self::SHIPPING_METHOD.to_string(),
      payment_processor_response: None,
      response_message: None,
      created_at: new_order.created_at,
      updated_at: new_order.created_at,
    }
  }

  /// Applies the non-empty fields of `patch`. Guard checks belong to the store.
  pub fn apply(&mut self, patch: &OrderPatch, at: DateTime<Utc>) {
    if let Some(status) = patch.payment_status {
      self.payment_status = status;
    }
    if let Some(response) = &patch.payment_processor_response {
      self.payment_processor_response = Some(response.clone());
    }
    if let Some(message) = &patch.response_message {
      self.response_message = Some(message.clone());
    }
    if let Some(user_id) = patch.user_id {
      self.user_id = Some(user_id);
    }
    self.updated_at = at;
  }
}

/// Partial keyed update of an order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderPatch {
  pub payment_status: Option<PaymentStatus>,
  pub payment_processor_response: Option<JsonValue>,
  pub response_message: Option<String>,
  pub user_id: Option<Uuid>,
  /// Apply only while the stored status still equals this value.
  pub only_if_status: Option<PaymentStatus>,
}

impl OrderPatch {
  pub fn link_user(user_id: Uuid) -> Self {
    Self {
      user_id: Some(user_id),
      ..Default::default()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn payment_status_round_trips_through_text() {
    for status in [PaymentStatus::Pending, PaymentStatus::Paid, PaymentStatus::Failed] {
      assert_eq!(status.as_str().parse::<PaymentStatus>(), Ok(status));
    }
    assert_eq!(" PAID ".parse::<PaymentStatus>(), Ok(PaymentStatus::Paid));
    assert!("refunded".parse::<PaymentStatus>().is_err());
  }

  #[test]
  fn only_pending_is_non_terminal() {
    assert!(!PaymentStatus::Pending.is_terminal());
    assert!(PaymentStatus::Paid.is_terminal());
    assert!(PaymentStatus::Failed.is_terminal());
  }

  #[test]
  fn apply_leaves_unset_fields_alone() {
    let now = Utc::now();
    let new_order = NewOrder {
      order_id: Uuid::new_v4(),
      user_id: None,
      total_amount: Decimal::new(12999, 2),
      shipping_address: "1 Main St, 78701".to_string(),
      billing_address: "1 Main St, 78701".to_string(),
      email: "buyer@example.com".to_string(),
      phone: None,
      items: Vec::new(),
      created_at: now,
    };
    let mut order = Order::from_new(&new_order);
    order.apply(&OrderPatch::link_user(Uuid::nil()), now);
    assert_eq!(order.user_id, Some(Uuid::nil()));
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert!(order.response_message.is_none());
  }
}
