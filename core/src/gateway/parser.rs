// core/src/gateway/parser.rs

//! Normalizes a processor reply of unknown shape into a [`GatewayOutcome`].
//!
//! Shapes are tried in order, first match wins: an HTML error page, a JSON
//! object, then delimited `key=value` pairs.

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};
use uuid::Uuid;

const HTML_MARKERS: &[&str] = &["<html", "<!doctype html", "<body"];
const SUCCESS_KEYS: &[&str] = &["Success", "Approved", "Status"];
const MESSAGE_KEYS: &[&str] = &["RespText", "Message", "ErrorMessage", "Error", "Response"];
const ECHO_KEYS: &[&str] = &["Postback.OrderID", "PostbackID"];

const GENERIC_HTML_ERROR: &str = "Payment processor returned an error page";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
  /// Correlated reply with a positive approval indicator.
  Approved,
  /// Correlated reply with a negative approval indicator.
  Declined,
  /// The processor refused the request itself (error page).
  Rejected,
  /// The echoed order identifier names a different order.
  Mismatch,
  /// Nothing usable could be read from the body.
  Unparseable,
}

impl Verdict {
  pub fn as_str(&self) -> &'static str {
    match self {
      Verdict::Approved => "approved",
      Verdict::Declined => "declined",
      Verdict::Rejected => "rejected",
      Verdict::Mismatch => "mismatch",
      Verdict::Unparseable => "unparseable",
    }
  }

  /// Mismatched or unreadable replies say nothing about the card itself.
  pub fn is_protocol_error(&self) -> bool {
    matches!(self, Verdict::Mismatch | Verdict::Unparseable)
  }
}

impl fmt::Display for Verdict {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayOutcome {
  pub verdict: Verdict,
  pub processor_order_id: Option<String>,
  pub fields: BTreeMap<String, String>,
  pub raw_response: String,
  pub error_message: Option<String>,
}

impl GatewayOutcome {
  pub fn approved(&self) -> bool {
    self.verdict == Verdict::Approved
  }

  fn new(verdict: Verdict, raw: &str) -> Self {
    Self {
      verdict,
      processor_order_id: None,
      fields: BTreeMap::new(),
      raw_response: raw.to_string(),
      error_message: None,
    }
  }
}

/// Parses `body` and correlates it against `expected_order_id`.
pub fn parse_reply(body: &str, expected_order_id: Uuid) -> GatewayOutcome {
  if looks_like_html(body) {
    let message = first_quoted_text(body).unwrap_or_else(|| GENERIC_HTML_ERROR.to_string());
    debug!(order_id = %expected_order_id, message = %message, "Processor replied with an HTML error page.");
    let mut outcome = GatewayOutcome::new(Verdict::Rejected, body);
    outcome.error_message = Some(message);
    return outcome;
  }

  let fields = match json_fields(body) {
    Some(fields) => fields,
    None => {
      let (fields, malformed) = delimited_fields(body);
      if malformed > 0 {
        warn!(order_id = %expected_order_id, malformed, "Skipped reply segments without '='.");
      }
      fields
    }
  };

  if fields.is_empty() {
    let mut outcome = GatewayOutcome::new(Verdict::Unparseable, body);
    outcome.error_message = Some("Processor reply could not be parsed".to_string());
    return outcome;
  }

  let echoed = ECHO_KEYS
    .iter()
    .find_map(|key| lookup(&fields, key))
    .map(str::to_string);

  let mut outcome = GatewayOutcome::new(Verdict::Unparseable, body);
  outcome.processor_order_id = echoed.clone();
  let message = first_message(&fields);

  match echoed {
    None => {
      outcome.error_message = Some("Processor reply did not echo the order identifier".to_string());
    }
    Some(ref echoed) if !same_order(echoed, expected_order_id) => {
      outcome.verdict = Verdict::Mismatch;
      outcome.error_message = Some(format!(
        "Processor reply names order '{}' but '{}' was submitted",
        echoed, expected_order_id
      ));
    }
    Some(_) => match approval(&fields) {
      Some(true) => {
        outcome.verdict = Verdict::Approved;
        outcome.error_message = None;
      }
      Some(false) => {
        outcome.verdict = Verdict::Declined;
        outcome.error_message = message;
      }
      None => {
        outcome.error_message = Some("Processor reply carried no approval indicator".to_string());
      }
    },
  }

  outcome.fields = fields;
  outcome
}

fn looks_like_html(body: &str) -> bool {
  let lowered = body.to_ascii_lowercase();
  HTML_MARKERS.iter().any(|marker| lowered.contains(marker))
}

/// First `"..."` run found in the page's text content. Attribute values are
/// skipped because markup inside `<...>` is dropped before searching.
fn first_quoted_text(html: &str) -> Option<String> {
  let mut text = String::with_capacity(html.len());
  let mut in_tag = false;
  for ch in html.chars() {
    match ch {
      '<' => in_tag = true,
      '>' if in_tag => {
        in_tag = false;
        text.push(' ');
      }
      _ if !in_tag => text.push(ch),
      _ => {}
    }
  }

  let start = text.find('"')? + 1;
  let len = text[start..].find('"')?;
  let quoted = text[start..start + len].trim();
  (!quoted.is_empty()).then(|| quoted.to_string())
}

pub(super) fn json_fields(body: &str) -> Option<BTreeMap<String, String>> {
  let parsed: JsonValue = serde_json::from_str(body.trim()).ok()?;
  let object = parsed.as_object()?;
  Some(
    object
      .iter()
      .map(|(key, value)| {
        let text = match value {
          JsonValue::String(s) => s.clone(),
          JsonValue::Null => String::new(),
          other => other.to_string(),
        };
        (key.clone(), text)
      })
      .collect(),
  )
}

/// Returns the collected pairs and the number of segments that lacked `=`.
pub(super) fn delimited_fields(body: &str) -> (BTreeMap<String, String>, usize) {
  let delimiter = if body.contains(';') { ';' } else { ',' };
  let mut fields = BTreeMap::new();
  let mut malformed = 0;

  for segment in body.split(delimiter) {
    if segment.trim().is_empty() {
      continue;
    }
    match segment.split_once('=') {
      Some((key, value)) => {
        let key = decode(key);
        if key.is_empty() {
          malformed += 1;
          continue;
        }
        fields.insert(key, decode(value));
      }
      None => malformed += 1,
    }
  }
  (fields, malformed)
}

fn decode(raw: &str) -> String {
  percent_decode_str(raw.trim()).decode_utf8_lossy().trim().to_string()
}

fn same_order(echoed: &str, expected: Uuid) -> bool {
  Uuid::parse_str(echoed).map(|id| id == expected).unwrap_or(false)
}

pub(super) fn lookup<'a>(fields: &'a BTreeMap<String, String>, key: &str) -> Option<&'a str> {
  fields
    .iter()
    .find(|(k, _)| k.eq_ignore_ascii_case(key))
    .map(|(_, v)| v.trim())
}

fn first_message(fields: &BTreeMap<String, String>) -> Option<String> {
  MESSAGE_KEYS
    .iter()
    .filter_map(|key| lookup(fields, key))
    .find(|value| !value.is_empty())
    .map(str::to_string)
}

/// `Some(true)` approved, `Some(false)` recognized but not approved, `None` no indicator.
fn approval(fields: &BTreeMap<String, String>) -> Option<bool> {
  if let Some(value) = SUCCESS_KEYS.iter().find_map(|key| lookup(fields, key)) {
    let value = value.to_ascii_uppercase();
    return Some(matches!(value.as_str(), "Y" | "YES" | "TRUE" | "1") || value.starts_with("APPROVED"));
  }
  lookup(fields, "RespText").map(|text| {
    let text = text.to_ascii_uppercase();
    text.starts_with("APPROVED") || text.starts_with("YAPPROVED")
  })
}
