// core/src/checkout/context.rs

use uuid::Uuid;

use crate::model::PaymentRequest;
use crate::validation::ValidatedPayment;

/// Shared state of one submission run.
#[derive(Debug, Clone, Default)]
pub struct SubmissionContext {
  pub request: PaymentRequest,
  pub user_id: Option<Uuid>,
  pub validated: Option<ValidatedPayment>,
  pub order_recorded: bool,
  /// HTTP status of the processor's answer, when one arrived.
  pub gateway_status: Option<u16>,
}

impl SubmissionContext {
  pub fn new(request: PaymentRequest, user_id: Option<Uuid>) -> Self {
    Self {
      request,
      user_id,
      ..Default::default()
    }
  }
}
