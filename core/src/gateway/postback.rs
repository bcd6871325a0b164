// core/src/gateway/postback.rs

//! Authentication of processor postbacks.
//!
//! The authorization form carries `Postback.RestrictKey`; the processor echoes
//! it in the postback body. Relays that cannot forward the body untouched may
//! send it in the [`POSTBACK_KEY_HEADER`] header instead.

use std::fmt;
use subtle::ConstantTimeEq;

use crate::gateway::form::GatewayCredentials;
use crate::gateway::parser::{delimited_fields, json_fields, lookup};

pub const POSTBACK_KEY_FIELD: &str = "Postback.RestrictKey";
pub const POSTBACK_KEY_HEADER: &str = "X-Postback-Key";

#[derive(Clone)]
pub struct PostbackVerifier {
  restrict_key: String,
}

impl fmt::Debug for PostbackVerifier {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PostbackVerifier").finish_non_exhaustive()
  }
}

impl PostbackVerifier {
  pub fn new(credentials: &GatewayCredentials) -> Self {
    Self {
      restrict_key: credentials.restrict_key.clone(),
    }
  }

  /// True when the header key, or failing that the key echoed in `body`,
  /// equals the merchant restrict key. An empty configured key accepts nothing.
  pub fn verify(&self, header_key: Option<&str>, body: &str) -> bool {
    if self.restrict_key.is_empty() {
      return false;
    }
    match header_key {
      Some(key) => self.matches(key.trim()),
      None => echoed_key(body).is_some_and(|key| self.matches(&key)),
    }
  }

  fn matches(&self, candidate: &str) -> bool {
    bool::from(candidate.as_bytes().ct_eq(self.restrict_key.as_bytes()))
  }
}

fn echoed_key(body: &str) -> Option<String> {
  let fields = json_fields(body).unwrap_or_else(|| delimited_fields(body).0);
  lookup(&fields, POSTBACK_KEY_FIELD).map(str::to_string)
}
