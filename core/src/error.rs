// core/src/error.rs
use thiserror::Error;

use crate::gateway::GatewayError;

/// Failures raised by an [`crate::store::OrderStore`] implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
  #[error("Order already exists: {0}")]
  Duplicate(String),

  #[error("Order not found: {0}")]
  NotFound(String),

  #[error("Order store unavailable: {0}")]
  Unavailable(String),
}

/// Every error the checkout core can surface.
///
/// Only `Validation` reaches the submitting caller synchronously. Everything that
/// happens after the order is recorded is logged and surfaces through the stored
/// order status instead.
#[derive(Debug, Error)]
pub enum CheckoutError {
  #[error("Validation Error ({field}): {message}")]
  Validation { field: String, message: String },

  #[error("Order store unavailable: {0}")]
  StoreUnavailable(String),

  #[error("Duplicate order identifier: {0}")]
  DuplicateOrder(String),

  #[error("Order not found: {0}")]
  OrderNotFound(String),

  #[error("Payment gateway unreachable: {0}")]
  GatewayUnreachable(String),

  #[error("Payment gateway protocol error: {0}")]
  GatewayProtocol(String),

  #[error("Payment declined: {0}")]
  Declined(String),

  #[error("Handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("Internal checkout error: {0}")]
  Internal(String),
}

impl CheckoutError {
  pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
    CheckoutError::Validation {
      field: field.into(),
      message: message.into(),
    }
  }

  /// True for input problems the caller can fix and resubmit.
  pub fn is_validation(&self) -> bool {
    matches!(self, CheckoutError::Validation { .. })
  }
}

impl From<StoreError> for CheckoutError {
  fn from(err: StoreError) -> Self {
    match err {
      StoreError::Duplicate(id) => CheckoutError::DuplicateOrder(id),
      StoreError::NotFound(id) => CheckoutError::OrderNotFound(id),
      StoreError::Unavailable(msg) => CheckoutError::StoreUnavailable(msg),
    }
  }
}

impl From<GatewayError> for CheckoutError {
  fn from(err: GatewayError) -> Self {
    CheckoutError::GatewayUnreachable(err.to_string())
  }
}

pub type CheckoutResult<T, E = CheckoutError> = std::result::Result<T, E>;
