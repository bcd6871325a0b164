// core/src/gateway/client.rs

use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::gateway::form::{AuthorizationForm, GatewayCredentials};
use crate::gateway::transport::{GatewayError, GatewayReply, GatewayTransport};
use crate::validation::ValidatedPayment;

/// Sends one sale authorization per call. Retrying is left to callers: the
/// processor offers no idempotency key, so a blind retry may charge twice.
#[derive(Clone)]
pub struct PaymentGatewayClient {
  transport: Arc<dyn GatewayTransport>,
  credentials: GatewayCredentials,
}

impl PaymentGatewayClient {
  pub fn new(transport: Arc<dyn GatewayTransport>, credentials: GatewayCredentials) -> Self {
    Self { transport, credentials }
  }

  #[instrument(name = "gateway::authorize", skip_all, fields(order_id = %payment.order_id, amount = %payment.amount_text()))]
  pub async fn authorize(&self, payment: &ValidatedPayment) -> Result<GatewayReply, GatewayError> {
    let form = AuthorizationForm::for_sale(payment, &self.credentials);
    info!("Sending payment request to processor.");
    let started = Instant::now();

    match self.transport.post_form(&form).await {
      Ok(reply) => {
        info!(
          status = reply.status,
          elapsed_ms = started.elapsed().as_millis() as u64,
          "Payment request answered by processor."
        );
        Ok(reply)
      }
      Err(e) => {
        warn!(error = %e, elapsed_ms = started.elapsed().as_millis() as u64, "Payment request did not complete.");
        Err(e)
      }
    }
  }
}
