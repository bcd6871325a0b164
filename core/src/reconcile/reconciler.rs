// core/src/reconcile/reconciler.rs

use chrono::{DateTime, Utc};
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{CheckoutError, CheckoutResult};
use crate::gateway::{parse_reply, GatewayOutcome, Verdict};
use crate::model::{OrderPatch, PaymentStatus};
use crate::pipeline::{ContextData, Pipeline, PipelineControl};
use crate::store::{OrderStore, UpdateOutcome};

pub const APPROVED_MESSAGE: &str = "Your payment has been processed successfully.";
pub const DECLINED_FALLBACK_MESSAGE: &str = "Your card was declined.";
pub const UNCONFIRMED_MESSAGE: &str =
  "We could not confirm your payment status. Please contact us before trying again.";

/// What one reconciliation did to the stored order.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileReport {
  pub order_id: Uuid,
  pub verdict: Verdict,
  /// Status the reply maps to. Equals the stored status only when `update` is `Applied`.
  pub payment_status: PaymentStatus,
  pub update: UpdateOutcome,
  pub message: String,
}

impl ReconcileReport {
  pub fn applied(&self) -> bool {
    self.update == UpdateOutcome::Applied
  }

  /// Why the order failed, classified: a decline or processor refusal, or a
  /// reply that could not be trusted. `None` for an approval.
  pub fn failure(&self) -> Option<CheckoutError> {
    match self.verdict {
      Verdict::Approved => None,
      Verdict::Declined | Verdict::Rejected => Some(CheckoutError::Declined(self.message.clone())),
      Verdict::Mismatch | Verdict::Unparseable => Some(CheckoutError::GatewayProtocol(self.message.clone())),
    }
  }
}

/// Customer-facing text for an outcome. Protocol errors never read as a decline.
pub fn user_message(outcome: &GatewayOutcome) -> String {
  match outcome.verdict {
    Verdict::Approved => APPROVED_MESSAGE.to_string(),
    Verdict::Declined => outcome
      .error_message
      .clone()
      .unwrap_or_else(|| DECLINED_FALLBACK_MESSAGE.to_string()),
    Verdict::Rejected => outcome
      .error_message
      .clone()
      .unwrap_or_else(|| UNCONFIRMED_MESSAGE.to_string()),
    Verdict::Mismatch | Verdict::Unparseable => UNCONFIRMED_MESSAGE.to_string(),
  }
}

fn response_blob(outcome: &GatewayOutcome, received_at: DateTime<Utc>) -> JsonValue {
  json!({
    "verdict": outcome.verdict,
    "approved": outcome.approved(),
    "processor_order_id": outcome.processor_order_id,
    "fields": outcome.fields,
    "raw_response": outcome.raw_response,
    "error_message": outcome.error_message,
    "received_at": received_at,
  })
}

#[derive(Debug, Clone)]
pub(crate) struct ReconcileContext {
  order_id: Uuid,
  raw_body: String,
  received_at: DateTime<Utc>,
  outcome: Option<GatewayOutcome>,
  report: Option<ReconcileReport>,
}

/// Applies processor replies to existing orders, at most once per order.
pub struct OrderReconciler {
  pipeline: Pipeline<ReconcileContext>,
  clock: Arc<dyn Clock>,
}

impl OrderReconciler {
  pub fn new(store: Arc<dyn OrderStore>, clock: Arc<dyn Clock>) -> Self {
    Self {
      pipeline: build_pipeline(store),
      clock,
    }
  }

  /// Parses `raw_body` and records the result on `order_id`.
  ///
  /// Fails only when the order does not exist or the store cannot be written;
  /// an unreadable body is still recorded, as `failed`.
  #[instrument(name = "reconcile", skip(self, raw_body), fields(body_len = raw_body.len()))]
  pub async fn reconcile_reply(&self, order_id: Uuid, raw_body: &str) -> CheckoutResult<ReconcileReport> {
    let ctx = ContextData::new(ReconcileContext {
      order_id,
      raw_body: raw_body.to_string(),
      received_at: self.clock.now(),
      outcome: None,
      report: None,
    });

    self.pipeline.run(ctx.clone()).await.map_err(|e| {
      error!(order_id = %order_id, error = %e, raw_body = %raw_body, "Reconciliation failed.");
      e
    })?;

    let report = ctx.read().report.clone();
    report.ok_or_else(|| CheckoutError::Internal(format!("reconciliation of {} produced no report", order_id)))
  }
}

fn build_pipeline(store: Arc<dyn OrderStore>) -> Pipeline<ReconcileContext> {
  let mut pipeline = Pipeline::new(
    "reconcile_gateway_reply",
    &[("parse_gateway_reply", false), ("load_order", false), ("apply_outcome", false)],
  );

  pipeline.on("parse_gateway_reply", |ctx: ContextData<ReconcileContext>| async move {
    let mut guard = ctx.write();
    let outcome = parse_reply(&guard.raw_body, guard.order_id);
    if outcome.verdict.is_protocol_error() {
      warn!(
        verdict = %outcome.verdict,
        error = outcome.error_message.as_deref().unwrap_or_default(),
        raw_body = %guard.raw_body,
        "Processor reply could not be correlated."
      );
    } else {
      info!(verdict = %outcome.verdict, "Processor reply parsed.");
    }
    guard.outcome = Some(outcome);
    Ok(PipelineControl::Continue)
  });

  let load_store = store.clone();
  pipeline.on("load_order", move |ctx: ContextData<ReconcileContext>| {
    let store = load_store.clone();
    async move {
      let order_id = ctx.read().order_id;
      let order = store.read(order_id).await?;
      if order.payment_status.is_terminal() {
        info!(current = %order.payment_status, "Order already settled; the pending guard will skip this reply.");
      }
      Ok(PipelineControl::Continue)
    }
  });

  pipeline.on("apply_outcome", move |ctx: ContextData<ReconcileContext>| {
    let store = store.clone();
    async move {
      let (order_id, outcome, received_at) = {
        let guard = ctx.read();
        let outcome = guard
          .outcome
          .clone()
          .ok_or_else(|| CheckoutError::Internal("apply_outcome ran before parse_gateway_reply".to_string()))?;
        (guard.order_id, outcome, guard.received_at)
      };

      let payment_status = if outcome.approved() {
        PaymentStatus::Paid
      } else {
        PaymentStatus::Failed
      };
      let message = user_message(&outcome);
      let patch = OrderPatch {
        payment_status: Some(payment_status),
        payment_processor_response: Some(response_blob(&outcome, received_at)),
        response_message: Some(message.clone()),
        only_if_status: Some(PaymentStatus::Pending),
        ..Default::default()
      };

      let update = store.update(order_id, patch).await?;
      match update {
        UpdateOutcome::Applied => info!(status = %payment_status, "Order settled."),
        UpdateOutcome::Skipped { current } => {
          warn!(current = %current, ignored = %payment_status, "Duplicate or stale reply ignored.")
        }
      }

      ctx.write().report = Some(ReconcileReport {
        order_id,
        verdict: outcome.verdict,
        payment_status,
        update,
        message,
      });
      Ok(PipelineControl::Continue)
    }
  });

  pipeline
}
