// core/src/model/address.rs

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
  #[serde(default)]
  pub address: String,
  #[serde(default)]
  pub city: String,
  #[serde(default)]
  pub state: String,
  #[serde(default)]
  pub zip_code: String,
}

impl Address {
  /// Single-line form stored on the order, e.g. `"1 Main St, Austin, TX, 78701"`.
  /// Blank parts are left out.
  pub fn formatted(&self) -> String {
    [&self.address, &self.city, &self.state, &self.zip_code]
      .iter()
      .map(|part| part.trim())
      .filter(|part| !part.is_empty())
      .collect::<Vec<_>>()
      .join(", ")
  }

  /// Picks each part from `billing` when it is filled in, else from `shipping`.
  pub fn billing_or_shipping(billing: Option<&Address>, shipping: &Address) -> Address {
    let pick = |billing_part: Option<&String>, shipping_part: &String| {
      billing_part
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| shipping_part.trim())
        .to_string()
    };
    Address {
      address: pick(billing.map(|b| &b.address), &shipping.address),
      city: pick(billing.map(|b| &b.city), &shipping.city),
      state: pick(billing.map(|b| &b.state), &shipping.state),
      zip_code: pick(billing.map(|b| &b.zip_code), &shipping.zip_code),
    }
  }
}
