// core/src/checkout/mod.rs

//! Payment submission: validate, record the pending order, send the
//! authorization and hand back a pending receipt.

pub mod context;
pub mod link;
pub mod plan;

use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{CheckoutError, CheckoutResult};
use crate::gateway::PaymentGatewayClient;
use crate::model::{Address, NewOrder, OrderLineItem, PaymentReceipt, PaymentRequest};
use crate::pipeline::{ContextData, Pipeline, PipelineControl, PipelineResult};
use crate::reconcile::{GatewayReplyEnvelope, ReplySender};
use crate::store::OrderStore;
use crate::validation::{validate_payment, ValidatedPayment};

pub use context::SubmissionContext;
pub use link::link_order_to_user;
pub use plan::{CheckoutPlan, CheckoutStep};

/// Who is checking out. Guests have no user id.
pub trait CurrentUser: Send + Sync {
  fn user_id(&self) -> Option<Uuid>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Guest;

impl CurrentUser for Guest {
  fn user_id(&self) -> Option<Uuid> {
    None
  }
}

impl CurrentUser for Option<Uuid> {
  fn user_id(&self) -> Option<Uuid> {
    *self
  }
}

pub struct CheckoutOrchestrator {
  pipeline: Pipeline<SubmissionContext>,
}

impl CheckoutOrchestrator {
  pub fn new(
    store: Arc<dyn OrderStore>,
    gateway: PaymentGatewayClient,
    replies: ReplySender,
    clock: Arc<dyn Clock>,
  ) -> Self {
    Self {
      pipeline: build_pipeline(store, gateway, replies, clock),
    }
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.pipeline.step_names()
  }

  /// Returns as soon as the authorization request has been answered or has
  /// failed in transit. Settlement is learned by polling the stored order.
  ///
  /// Errors: validation problems (nothing written), or the order record could
  /// not be created (no authorization sent).
  #[instrument(name = "submit_payment", skip_all, fields(order_id = request.order_id.as_deref().unwrap_or_default()))]
  pub async fn submit_payment(
    &self,
    request: PaymentRequest,
    user: &dyn CurrentUser,
  ) -> CheckoutResult<PaymentReceipt> {
    let ctx = ContextData::new(SubmissionContext::new(request, user.user_id()));

    match self.pipeline.run(ctx.clone()).await? {
      PipelineResult::Completed => {}
      PipelineResult::Stopped => {
        return Err(CheckoutError::Internal("payment submission stopped before dispatch".to_string()));
      }
    }

    let order_id = ctx
      .read()
      .validated
      .as_ref()
      .map(|v| v.order_id)
      .ok_or_else(|| CheckoutError::Internal("submission finished without a validated payment".to_string()))?;
    Ok(PaymentReceipt::pending(order_id.to_string()))
  }
}

fn validated(ctx: &ContextData<SubmissionContext>) -> CheckoutResult<ValidatedPayment> {
  ctx
    .read()
    .validated
    .clone()
    .ok_or_else(|| CheckoutError::Internal("payment was not validated".to_string()))
}

fn new_order(payment: &ValidatedPayment, user_id: Option<Uuid>, clock: &dyn Clock) -> NewOrder {
  let billing: &Address = payment.billing_address.as_ref().unwrap_or(&payment.shipping_address);
  NewOrder {
    order_id: payment.order_id,
    user_id,
    total_amount: payment.amount,
    shipping_address: payment.shipping_address.formatted(),
    billing_address: billing.formatted(),
    email: payment.email.clone(),
    phone: payment.phone.clone(),
    items: payment
      .items
      .iter()
      .map(|line| OrderLineItem::snapshot(payment.order_id, line))
      .collect(),
    created_at: clock.now(),
  }
}

fn build_pipeline(
  store: Arc<dyn OrderStore>,
  gateway: PaymentGatewayClient,
  replies: ReplySender,
  clock: Arc<dyn Clock>,
) -> Pipeline<SubmissionContext> {
  let mut pipeline = Pipeline::new(
    "submit_payment",
    &[
      ("validate_payment_request", false),
      ("create_pending_order", false),
      ("dispatch_gateway_request", false),
    ],
  );

  let validate_clock = clock.clone();
  pipeline.on("validate_payment_request", move |ctx: ContextData<SubmissionContext>| {
    let clock = validate_clock.clone();
    async move {
      let result = validate_payment(&ctx.read().request, clock.as_ref());
      match result {
        Ok(payment) => {
          ctx.write().validated = Some(payment);
          Ok(PipelineControl::Continue)
        }
        Err(e) => {
          info!(error = %e, "Payment request rejected by validation.");
          Err(e)
        }
      }
    }
  });

  let order_clock = clock.clone();
  pipeline.on("create_pending_order", move |ctx: ContextData<SubmissionContext>| {
    let store = store.clone();
    let clock = order_clock.clone();
    async move {
      let payment = validated(&ctx)?;
      let user_id = ctx.read().user_id;
      let order = new_order(&payment, user_id, clock.as_ref());
      let item_count = order.items.len();

      if let Err(e) = store.create(order).await {
        error!(error = %e, "Could not record the pending order; no authorization sent.");
        return Err(e.into());
      }
      ctx.write().order_recorded = true;
      info!(items = item_count, total = %payment.amount_text(), "Pending order recorded.");
      Ok(PipelineControl::Continue)
    }
  });

  pipeline.on("dispatch_gateway_request", move |ctx: ContextData<SubmissionContext>| {
    let gateway = gateway.clone();
    let replies = replies.clone();
    let clock = clock.clone();
    async move {
      let payment = validated(&ctx)?;
      match gateway.authorize(&payment).await {
        Ok(reply) => {
          ctx.write().gateway_status = Some(reply.status);
          let envelope = GatewayReplyEnvelope {
            order_id: payment.order_id,
            body: reply.body,
            received_at: clock.now(),
          };
          if let Err(e) = replies.try_publish(envelope) {
            error!(error = %e, "Processor reply could not be queued; order stays pending.");
          }
        }
        // The order stays pending; polling reports the outcome or times out.
        Err(e) => {
          let err = CheckoutError::from(e);
          warn!(error = %err, "Authorization request failed in transit.");
        }
      }
      Ok(PipelineControl::Continue)
    }
  });

  pipeline
}
