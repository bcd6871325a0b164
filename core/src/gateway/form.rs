// core/src/gateway/form.rs

use std::fmt;

use crate::validation::ValidatedPayment;

/// Merchant credentials, supplied by the environment.
#[derive(Clone)]
pub struct GatewayCredentials {
  pub account: String,
  pub restrict_key: String,
}

impl fmt::Debug for GatewayCredentials {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("GatewayCredentials")
      .field("account", &self.account)
      .field("restrict_key", &"[REDACTED]")
      .finish()
  }
}

// Fields whose values must never appear in logs.
const SECRET_FIELDS: &[&str] = &["CardNo", "CVV2", "RestrictKey", "Postback.RestrictKey"];

/// The flat `application/x-www-form-urlencoded` field list for one sale authorization.
///
/// Field order is kept stable so request bodies are reproducible.
#[derive(Clone, PartialEq)]
pub struct AuthorizationForm {
  fields: Vec<(&'static str, String)>,
}

impl AuthorizationForm {
  pub fn for_sale(payment: &ValidatedPayment, credentials: &GatewayCredentials) -> Self {
    let order_id = payment.order_id.to_string();
    let total = payment.amount_text();
    let avs = payment.avs_address();

    let fields = vec![
      ("ePNAccount", credentials.account.clone()),
      ("RestrictKey", credentials.restrict_key.clone()),
      ("RequestType", "transaction".to_string()),
      ("TranType", "Sale".to_string()),
      ("IndustryType", "E".to_string()),
      ("Total", total.clone()),
      ("Address", avs.address),
      ("City", avs.city),
      ("State", avs.state),
      ("Zip", avs.zip_code),
      ("CardNo", payment.card_number.clone()),
      ("ExpMonth", payment.expiry_month.clone()),
      ("ExpYear", payment.expiry_year.clone()),
      ("CVV2Type", "1".to_string()),
      ("CVV2", payment.cvv.clone()),
      ("Postback.OrderID", order_id.clone()),
      ("Postback.Description", format!("Order {}", order_id)),
      ("Postback.Total", total),
      ("Postback.RestrictKey", credentials.restrict_key.clone()),
      ("PostbackID", order_id),
      ("COMBINE_PB_RESPONSE", "1".to_string()),
      ("NOMAIL_CARDHOLDER", "1".to_string()),
      ("NOMAIL_MERCHANT", "1".to_string()),
    ];
    Self { fields }
  }

  pub fn fields(&self) -> &[(&'static str, String)] {
    &self.fields
  }

  pub fn get(&self, name: &str) -> Option<&str> {
    self
      .fields
      .iter()
      .find(|(key, _)| *key == name)
      .map(|(_, value)| value.as_str())
  }
}

impl fmt::Debug for AuthorizationForm {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut map = f.debug_map();
    for (key, value) in &self.fields {
      if SECRET_FIELDS.contains(key) {
        map.entry(key, &"[REDACTED]");
      } else {
        map.entry(key, value);
      }
    }
    map.finish()
  }
}
