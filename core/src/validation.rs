// core/src/validation.rs

//! Input checks run before any order is written. A failure here leaves no trace
//! in the store.

use chrono::Datelike;
use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;
use tracing::warn;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{CheckoutError, CheckoutResult};
use crate::model::{Address, CartLine, PaymentRequest};

/// A checked and normalized submission, ready for the order record and the gateway form.
#[derive(Clone, PartialEq)]
pub struct ValidatedPayment {
  pub order_id: Uuid,
  /// Digits only.
  pub card_number: String,
  /// Two digits, zero padded.
  pub expiry_month: String,
  /// Last two digits of the year.
  pub expiry_year: String,
  pub cvv: String,
  pub amount: Decimal,
  pub shipping_address: Address,
  pub billing_address: Option<Address>,
  pub items: Vec<CartLine>,
  pub email: String,
  pub phone: Option<String>,
}

impl ValidatedPayment {
  /// The amount as the processor expects it: fixed two decimal places.
  pub fn amount_text(&self) -> String {
    format_amount(self.amount)
  }

  /// Address used for the processor's AVS fields: billing parts win over shipping.
  pub fn avs_address(&self) -> Address {
    Address::billing_or_shipping(self.billing_address.as_ref(), &self.shipping_address)
  }

  pub fn items_total(&self) -> Decimal {
    self.items.iter().map(CartLine::line_total).sum()
  }
}

impl fmt::Debug for ValidatedPayment {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let last4 = self.card_number.get(self.card_number.len().saturating_sub(4)..).unwrap_or("");
    f.debug_struct("ValidatedPayment")
      .field("order_id", &self.order_id)
      .field("card_last4", &last4)
      .field("amount", &self.amount)
      .field("items", &self.items.len())
      .finish_non_exhaustive()
  }
}

fn round_to_cents(amount: Decimal) -> Decimal {
  amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn format_amount(amount: Decimal) -> String {
  format!("{:.2}", round_to_cents(amount))
}

fn required<'a>(value: Option<&'a str>, field: &str) -> CheckoutResult<&'a str> {
  match value.map(str::trim) {
    Some(v) if !v.is_empty() => Ok(v),
    _ => Err(CheckoutError::validation(field, format!("{} is required", field))),
  }
}

fn all_digits(s: &str) -> bool {
  !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// Validates `request` against the current date from `clock`.
pub fn validate_payment(request: &PaymentRequest, clock: &dyn Clock) -> CheckoutResult<ValidatedPayment> {
  let order_id_text = required(request.order_id.as_deref(), "orderId")?;
  let card_text = required(request.card_number.as_deref(), "cardNumber")?;
  let month_text = required(request.expiry_month.as_deref(), "expiryMonth")?;
  let year_text = required(request.expiry_year.as_deref(), "expiryYear")?;
  let cvv = required(request.cvv.as_deref(), "cvv")?;

  // Checked in cents, as sent to the processor.
  let amount = match request.amount.map(round_to_cents) {
    Some(amount) if amount > Decimal::ZERO => amount,
    Some(_) => return Err(CheckoutError::validation("amount", "amount must be greater than zero")),
    None => return Err(CheckoutError::validation("amount", "amount is required")),
  };

  let shipping = request
    .shipping_address
    .as_ref()
    .ok_or_else(|| CheckoutError::validation("shippingAddress", "shippingAddress is required"))?;
  required(Some(shipping.address.as_str()), "shippingAddress.address")?;
  required(Some(shipping.zip_code.as_str()), "shippingAddress.zipCode")?;

  let email = required(request.email.as_deref(), "email")?;

  let order_id = Uuid::parse_str(order_id_text)
    .map_err(|_| CheckoutError::validation("orderId", "orderId must be a UUID"))?;

  let card_number: String = card_text.chars().filter(|c| !c.is_whitespace()).collect();
  if !all_digits(&card_number) || !(15..=16).contains(&card_number.len()) {
    return Err(CheckoutError::validation("cardNumber", "Invalid card number"));
  }

  let (expiry_month, expiry_year) = validate_expiry(month_text, year_text, clock)?;

  if !all_digits(cvv) || !(3..=4).contains(&cvv.len()) {
    return Err(CheckoutError::validation("cvv", "Invalid CVV"));
  }

  if request.items.is_empty() {
    return Err(CheckoutError::validation("items", "at least one item is required"));
  }
  for (idx, line) in request.items.iter().enumerate() {
    if line.product_id.trim().is_empty() {
      return Err(CheckoutError::validation(format!("items[{}].id", idx), "product id is required"));
    }
    if line.quantity == 0 {
      return Err(CheckoutError::validation(format!("items[{}].quantity", idx), "quantity must be positive"));
    }
    if line.price < Decimal::ZERO {
      return Err(CheckoutError::validation(format!("items[{}].price", idx), "price must not be negative"));
    }
  }

  let validated = ValidatedPayment {
    order_id,
    card_number,
    expiry_month,
    expiry_year,
    cvv: cvv.to_string(),
    amount,
    shipping_address: shipping.clone(),
    billing_address: request.billing_address.clone(),
    items: request.items.clone(),
    email: email.to_string(),
    phone: request
      .phone
      .as_deref()
      .map(str::trim)
      .filter(|p| !p.is_empty())
      .map(str::to_string),
  };

  // Tax and shipping are added by the caller, so a gap here is expected; it is only worth a trace.
  let items_total = validated.items_total();
  if items_total != amount {
    warn!(
      order_id = %order_id,
      amount = %amount,
      items_total = %items_total,
      "Submitted amount differs from the sum of line items."
    );
  }

  Ok(validated)
}

/// Returns the normalized (`MM`, `YY`) pair. The current month is still valid.
fn validate_expiry(month_text: &str, year_text: &str, clock: &dyn Clock) -> CheckoutResult<(String, String)> {
  let invalid = || CheckoutError::validation("expiry", "Invalid expiry date");

  if !all_digits(month_text) || month_text.len() > 2 {
    return Err(invalid());
  }
  let month: u32 = month_text.parse().map_err(|_| invalid())?;
  if !(1..=12).contains(&month) {
    return Err(invalid());
  }

  if !all_digits(year_text) {
    return Err(invalid());
  }
  let year: i32 = match year_text.len() {
    2 => 2000 + year_text.parse::<i32>().map_err(|_| invalid())?,
    4 => year_text.parse::<i32>().map_err(|_| invalid())?,
    _ => return Err(invalid()),
  };

  let today = clock.today();
  if (year, month) < (today.year(), today.month()) {
    return Err(invalid());
  }

  Ok((format!("{:02}", month), format!("{:02}", year % 100)))
}
