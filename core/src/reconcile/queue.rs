// core/src/reconcile/queue.rs

//! In-process outcome channel between the gateway dispatch and the reconciler.
//!
//! Processor replies travel as messages; the poller only ever observes their
//! effect through the store.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

use crate::error::{CheckoutError, CheckoutResult};
use crate::reconcile::reconciler::OrderReconciler;

pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub struct GatewayReplyEnvelope {
  pub order_id: Uuid,
  pub body: String,
  pub received_at: DateTime<Utc>,
}

/// Cloneable publishing side of the outcome channel.
#[derive(Debug, Clone)]
pub struct ReplySender {
  tx: mpsc::Sender<GatewayReplyEnvelope>,
}

impl ReplySender {
  /// A bare channel, for callers that consume envelopes themselves.
  pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<GatewayReplyEnvelope>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (Self { tx }, rx)
  }

  /// Waits for queue space. Fails only once the consumer is gone.
  pub async fn publish(&self, envelope: GatewayReplyEnvelope) -> CheckoutResult<()> {
    let order_id = envelope.order_id;
    self.tx.send(envelope).await.map_err(|_| {
      CheckoutError::Internal(format!("reconciliation queue closed; reply for order {} dropped", order_id))
    })?;
    debug!(order_id = %order_id, "Gateway reply queued for reconciliation.");
    Ok(())
  }

  /// Queues without waiting. A full or closed queue drops the envelope; the raw
  /// body is logged so the reply can be replayed by hand.
  pub fn try_publish(&self, envelope: GatewayReplyEnvelope) -> CheckoutResult<()> {
    match self.tx.try_send(envelope) {
      Ok(()) => {
        debug!("Gateway reply queued for reconciliation.");
        Ok(())
      }
      Err(TrySendError::Full(envelope)) => {
        error!(
          order_id = %envelope.order_id,
          raw_body = %envelope.body,
          received_at = %envelope.received_at,
          "Reconciliation queue full; reply dropped."
        );
        Err(CheckoutError::Internal(format!(
          "reconciliation queue full; reply for order {} dropped",
          envelope.order_id
        )))
      }
      Err(TrySendError::Closed(envelope)) => {
        error!(
          order_id = %envelope.order_id,
          raw_body = %envelope.body,
          received_at = %envelope.received_at,
          "Reconciliation queue closed; reply dropped."
        );
        Err(CheckoutError::Internal(format!(
          "reconciliation queue closed; reply for order {} dropped",
          envelope.order_id
        )))
      }
    }
  }
}

/// Owns the worker task that drains the channel into an [`OrderReconciler`].
pub struct ReconciliationQueue {
  sender: ReplySender,
  worker: JoinHandle<u64>,
}

impl ReconciliationQueue {
  /// Spawns the worker on the current tokio runtime.
  pub fn start(reconciler: Arc<OrderReconciler>, capacity: usize) -> Self {
    let (sender, rx) = ReplySender::channel(capacity);
    let worker = tokio::spawn(drain(reconciler, rx).instrument(tracing::info_span!("reconciliation_worker")));
    Self { sender, worker }
  }

  pub fn sender(&self) -> ReplySender {
    self.sender.clone()
  }

  /// Closes this handle's sender and waits for the worker to drain what is queued.
  ///
  /// The worker only stops once every cloned [`ReplySender`] is dropped as well.
  /// Returns the number of envelopes processed.
  pub async fn shutdown(self) -> u64 {
    let Self { sender, worker } = self;
    drop(sender);
    match worker.await {
      Ok(processed) => processed,
      Err(e) => {
        error!(error = %e, "Reconciliation worker ended abnormally.");
        0
      }
    }
  }
}

async fn drain(reconciler: Arc<OrderReconciler>, mut rx: mpsc::Receiver<GatewayReplyEnvelope>) -> u64 {
  let mut processed = 0;
  while let Some(envelope) = rx.recv().await {
    processed += 1;
    match reconciler.reconcile_reply(envelope.order_id, &envelope.body).await {
      Ok(report) => match report.failure() {
        None => info!(
          order_id = %report.order_id,
          applied = report.applied(),
          received_at = %envelope.received_at,
          "Gateway reply reconciled; payment approved."
        ),
        Some(failure) => warn!(
          order_id = %report.order_id,
          verdict = %report.verdict,
          applied = report.applied(),
          received_at = %envelope.received_at,
          failure = %failure,
          "Gateway reply reconciled; payment not taken."
        ),
      },
      // Already logged with the raw body by the reconciler; the submission has long returned.
      Err(e) => error!(order_id = %envelope.order_id, error = %e, "Gateway reply left unreconciled."),
    }
  }
  info!(processed, "Reconciliation worker stopped.");
  processed
}
