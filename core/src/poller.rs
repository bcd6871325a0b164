// core/src/poller.rs

//! Settlement watching for a submitted order.
//!
//! A poll session reads the stored order on a fixed cadence until it is `paid`
//! or `failed`, or until an overall ceiling passes. It only ever reads the store.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

use crate::model::PaymentStatus;
use crate::store::OrderStore;

pub const TIMEOUT_MESSAGE: &str = "Payment processing timeout";
pub const TIMEOUT_NAVIGATION_MESSAGE: &str = "Payment processing timed out. Please try again.";
pub const SUCCESS_NAVIGATION_MESSAGE: &str = "Your payment has been processed successfully.";
pub const FAILURE_FALLBACK_MESSAGE: &str = "There was an error processing your payment.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
  /// Wait before the first read.
  pub initial_delay: Duration,
  pub interval: Duration,
  /// Ceiling counted from the start of the session.
  pub timeout: Duration,
  /// Pause between a settled status and navigation.
  pub navigation_delay: Duration,
}

impl Default for PollerConfig {
  fn default() -> Self {
    Self {
      initial_delay: Duration::from_secs(4),
      interval: Duration::from_secs(4),
      timeout: Duration::from_secs(5 * 60),
      navigation_delay: Duration::from_secs(2),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
  PaymentSuccess { order_id: Uuid, message: String },
  PaymentError { order_id: Uuid, message: String },
}

/// Cart and view side effects, injected by the embedding application.
pub trait CheckoutNavigator: Send + Sync {
  fn clear_cart(&self);
  fn navigate(&self, destination: Destination);
}

/// Callbacks of one poll session. Never invoked after cancellation.
pub trait SettlementListener: Send + Sync {
  fn on_status_change(&self, order_id: Uuid, status: PaymentStatus, message: Option<&str>);
  fn on_timeout(&self, order_id: Uuid, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
  Resolved(PaymentStatus),
  TimedOut,
  Cancelled,
}

/// Cancellation handle of a running session. Dropping it cancels the session.
#[derive(Debug)]
pub struct PollHandle {
  cancel: watch::Sender<bool>,
  task: JoinHandle<PollOutcome>,
}

impl PollHandle {
  pub fn cancel(&self) {
    // An error only means the session already ended.
    let _ = self.cancel.send(true);
  }

  pub fn is_finished(&self) -> bool {
    self.task.is_finished()
  }

  /// Waits for the session to end, keeping it alive meanwhile.
  pub async fn outcome(self) -> PollOutcome {
    let PollHandle { cancel, task } = self;
    let outcome = task.await.unwrap_or(PollOutcome::Cancelled);
    drop(cancel);
    outcome
  }
}

#[derive(Clone)]
pub struct StatusPoller {
  store: Arc<dyn OrderStore>,
  navigator: Arc<dyn CheckoutNavigator>,
  config: PollerConfig,
}

impl StatusPoller {
  pub fn new(store: Arc<dyn OrderStore>, navigator: Arc<dyn CheckoutNavigator>, config: PollerConfig) -> Self {
    Self {
      store,
      navigator,
      config,
    }
  }

  pub fn config(&self) -> &PollerConfig {
    &self.config
  }

  /// Starts a session on the current tokio runtime.
  pub fn poll_order_status(&self, order_id: Uuid, listener: Arc<dyn SettlementListener>) -> PollHandle {
    let (cancel, cancelled) = watch::channel(false);
    let session = Session {
      order_id,
      store: self.store.clone(),
      navigator: self.navigator.clone(),
      listener,
      config: self.config,
      cancelled,
    };
    let span = tracing::info_span!("poll_order_status", order_id = %order_id);
    let task = tokio::spawn(session.run().instrument(span));
    PollHandle { cancel, task }
  }
}

struct Session {
  order_id: Uuid,
  store: Arc<dyn OrderStore>,
  navigator: Arc<dyn CheckoutNavigator>,
  listener: Arc<dyn SettlementListener>,
  config: PollerConfig,
  cancelled: watch::Receiver<bool>,
}

/// Resolves once the handle asks for cancellation or is dropped.
async fn cancellation(rx: &mut watch::Receiver<bool>) {
  if rx.wait_for(|cancel| *cancel).await.is_err() {
    debug!("Poll handle dropped.");
  }
}

impl Session {
  async fn run(mut self) -> PollOutcome {
    let deadline = Instant::now() + self.config.timeout;
    info!("Starting order status polling.");

    tokio::select! {
      biased;
      _ = cancellation(&mut self.cancelled) => return self.stopped(),
      _ = time::sleep_until(deadline) => return self.timed_out(),
      _ = time::sleep(self.config.initial_delay) => {}
    }

    let mut ticker = time::interval(self.config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
      tokio::select! {
        biased;
        _ = cancellation(&mut self.cancelled) => return self.stopped(),
        _ = time::sleep_until(deadline) => return self.timed_out(),
        _ = ticker.tick() => {}
      }

      let read = tokio::select! {
        biased;
        _ = cancellation(&mut self.cancelled) => return self.stopped(),
        _ = time::sleep_until(deadline) => return self.timed_out(),
        read = self.store.read(self.order_id) => read,
      };

      let order = match read {
        Ok(order) => order,
        Err(e) => {
          warn!(error = %e, "Failed to check order status.");
          continue;
        }
      };
      debug!(status = %order.payment_status, "Order status read.");
      if !order.payment_status.is_terminal() {
        continue;
      }

      let status = order.payment_status;
      self
        .listener
        .on_status_change(self.order_id, status, order.response_message.as_deref());

      let destination = if status == PaymentStatus::Paid {
        self.navigator.clear_cart();
        Destination::PaymentSuccess {
          order_id: self.order_id,
          message: SUCCESS_NAVIGATION_MESSAGE.to_string(),
        }
      } else {
        Destination::PaymentError {
          order_id: self.order_id,
          message: order
            .response_message
            .clone()
            .unwrap_or_else(|| FAILURE_FALLBACK_MESSAGE.to_string()),
        }
      };

      tokio::select! {
        biased;
        _ = cancellation(&mut self.cancelled) => return self.stopped(),
        _ = time::sleep(self.config.navigation_delay) => {}
      }
      info!(status = %status, "Order settled; leaving checkout.");
      self.navigator.navigate(destination);
      return PollOutcome::Resolved(status);
    }
  }

  fn stopped(&self) -> PollOutcome {
    debug!("Polling cancelled.");
    PollOutcome::Cancelled
  }

  fn timed_out(&self) -> PollOutcome {
    warn!(timeout_secs = self.config.timeout.as_secs(), "Payment status polling timed out.");
    self.listener.on_timeout(self.order_id, TIMEOUT_MESSAGE);
    self.navigator.navigate(Destination::PaymentError {
      order_id: self.order_id,
      message: TIMEOUT_NAVIGATION_MESSAGE.to_string(),
    });
    PollOutcome::TimedOut
  }
}
