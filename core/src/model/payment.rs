// core/src/model/payment.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::address::Address;
use crate::model::line_item::CartLine;
use crate::model::order::PaymentStatus;

/// Checkout form data as posted by the browser.
///
/// Every field is optional at the serde level so that a missing field is
/// reported as a validation error naming it, not as a JSON decode failure.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
  pub order_id: Option<String>,
  pub card_number: Option<String>,
  pub expiry_month: Option<String>,
  pub expiry_year: Option<String>,
  pub cvv: Option<String>,
  pub name_on_card: Option<String>,
  pub amount: Option<Decimal>,
  pub shipping_address: Option<Address>,
  pub billing_address: Option<Address>,
  #[serde(default)]
  pub items: Vec<CartLine>,
  pub email: Option<String>,
  pub phone: Option<String>,
}

// Card data never goes to the logs.
impl fmt::Debug for PaymentRequest {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PaymentRequest")
      .field("order_id", &self.order_id)
      .field("card_number", &self.card_number.as_ref().map(|_| "[REDACTED]"))
      .field("cvv", &self.cvv.as_ref().map(|_| "[REDACTED]"))
      .field("amount", &self.amount)
      .field("items", &self.items.len())
      .finish_non_exhaustive()
  }
}

/// Immediate answer to a submission. Settlement is learned by polling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
  pub order_id: String,
  pub status: PaymentStatus,
  pub message: String,
}

impl PaymentReceipt {
  pub fn pending(order_id: impl Into<String>) -> Self {
    Self {
      order_id: order_id.into(),
      status: PaymentStatus::Pending,
      message: "Payment processing initiated".to_string(),
    }
  }
}
