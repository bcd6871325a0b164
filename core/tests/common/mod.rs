// tests/common/mod.rs
#![allow(dead_code)] // Not every test binary uses every helper

use async_trait::async_trait;
use checkout_core::gateway::AuthorizationForm;
use checkout_core::poller::{CheckoutNavigator, Destination, SettlementListener};
use checkout_core::{
  Address, CartLine, CheckoutOrchestrator, FixedClock, GatewayCredentials, GatewayError, GatewayReply,
  GatewayTransport, InMemoryOrderStore, OrderStore, PaymentGatewayClient, PaymentRequest, PaymentStatus, ReplySender,
};
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::Level;
use uuid::Uuid;

// --- Helper for Tracing Setup ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

/// 2026-10-18, the date every expiry check in these tests is measured against.
pub fn clock() -> Arc<FixedClock> {
  Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()))
}

pub fn credentials() -> GatewayCredentials {
  GatewayCredentials {
    account: "080880".to_string(),
    restrict_key: "test-restrict-key".to_string(),
  }
}

pub fn shipping_address() -> Address {
  Address {
    address: "1 Main St".to_string(),
    city: "Austin".to_string(),
    state: "TX".to_string(),
    zip_code: "78701".to_string(),
  }
}

/// The checkout of scenario A: 129.99 on a test Visa, expiring 09/2031.
pub fn valid_request(order_id: Uuid) -> PaymentRequest {
  PaymentRequest {
    order_id: Some(order_id.to_string()),
    card_number: Some("4111111111111111".to_string()),
    expiry_month: Some("9".to_string()),
    expiry_year: Some("2031".to_string()),
    cvv: Some("123".to_string()),
    name_on_card: Some("Pat Buyer".to_string()),
    amount: Some(dec!(129.99)),
    shipping_address: Some(shipping_address()),
    billing_address: None,
    items: vec![CartLine {
      product_id: "sku-1001".to_string(),
      quantity: 1,
      price: dec!(129.99),
      options: Default::default(),
    }],
    email: Some("buyer@example.com".to_string()),
    phone: None,
  }
}

// --- Gateway stub ---

/// Answers every form with a scripted reply and keeps what it was sent.
pub struct StubTransport {
  reply: Box<dyn Fn(&AuthorizationForm) -> Result<GatewayReply, GatewayError> + Send + Sync>,
  pub sent: Mutex<Vec<AuthorizationForm>>,
}

impl StubTransport {
  pub fn replying(reply: impl Fn(&AuthorizationForm) -> Result<GatewayReply, GatewayError> + Send + Sync + 'static) -> Arc<Self> {
    Arc::new(Self {
      reply: Box::new(reply),
      sent: Mutex::new(Vec::new()),
    })
  }

  pub fn with_body(body: &'static str) -> Arc<Self> {
    Self::replying(move |_| {
      Ok(GatewayReply {
        status: 200,
        body: body.to_string(),
      })
    })
  }

  /// Replies with `{"Success":"Y"}` echoing the order id found in the form.
  pub fn approving() -> Arc<Self> {
    Self::replying(|form| {
      let echo = form.get("Postback.OrderID").unwrap_or_default();
      Ok(GatewayReply {
        status: 200,
        body: format!(r#"{{"Success":"Y","Postback.OrderID":"{}"}}"#, echo),
      })
    })
  }

  pub fn unreachable() -> Arc<Self> {
    Self::replying(|_| Err(GatewayError::transport(anyhow::anyhow!("connection refused"))))
  }

  pub fn sent_count(&self) -> usize {
    self.sent.lock().len()
  }

  pub fn last_form(&self) -> Option<AuthorizationForm> {
    self.sent.lock().last().cloned()
  }
}

#[async_trait]
impl GatewayTransport for StubTransport {
  async fn post_form(&self, form: &AuthorizationForm) -> Result<GatewayReply, GatewayError> {
    self.sent.lock().push(form.clone());
    (self.reply)(form)
  }
}

// --- Orchestrator harness ---

pub struct Harness {
  pub store: Arc<InMemoryOrderStore>,
  pub transport: Arc<StubTransport>,
  pub orchestrator: CheckoutOrchestrator,
  pub replies: mpsc::Receiver<checkout_core::GatewayReplyEnvelope>,
}

impl Harness {
  pub fn new(transport: Arc<StubTransport>) -> Self {
    Self::with_queue_capacity(transport, 16)
  }

  pub fn with_queue_capacity(transport: Arc<StubTransport>, capacity: usize) -> Self {
    let store = Arc::new(InMemoryOrderStore::new());
    let (sender, replies) = ReplySender::channel(capacity);
    let gateway = PaymentGatewayClient::new(transport.clone(), credentials());
    let orchestrator = CheckoutOrchestrator::new(store.clone(), gateway, sender, clock());
    Self {
      store,
      transport,
      orchestrator,
      replies,
    }
  }

  pub fn store_dyn(&self) -> Arc<dyn OrderStore> {
    self.store.clone()
  }

  pub async fn status_of(&self, order_id: Uuid) -> PaymentStatus {
    self.store.read(order_id).await.unwrap().payment_status
  }
}

// --- Poller collaborators ---

#[derive(Default)]
pub struct RecordingNavigator {
  pub cart_cleared: Mutex<usize>,
  pub destinations: Mutex<Vec<Destination>>,
}

impl CheckoutNavigator for RecordingNavigator {
  fn clear_cart(&self) {
    *self.cart_cleared.lock() += 1;
  }

  fn navigate(&self, destination: Destination) {
    self.destinations.lock().push(destination);
  }
}

#[derive(Default)]
pub struct RecordingListener {
  pub changes: Mutex<Vec<(PaymentStatus, Option<String>)>>,
  pub timeouts: Mutex<Vec<String>>,
}

impl RecordingListener {
  pub fn callback_count(&self) -> usize {
    self.changes.lock().len() + self.timeouts.lock().len()
  }
}

impl SettlementListener for RecordingListener {
  fn on_status_change(&self, _order_id: Uuid, status: PaymentStatus, message: Option<&str>) {
    self.changes.lock().push((status, message.map(str::to_string)));
  }

  fn on_timeout(&self, _order_id: Uuid, message: &str) {
    self.timeouts.lock().push(message.to_string());
  }
}

/// A pending order written straight to the store, bypassing submission.
pub async fn seed_pending_order(store: &dyn OrderStore, order_id: Uuid) {
  let order = checkout_core::NewOrder {
    order_id,
    user_id: None,
    total_amount: dec!(129.99),
    shipping_address: shipping_address().formatted(),
    billing_address: shipping_address().formatted(),
    email: "buyer@example.com".to_string(),
    phone: None,
    items: Vec::new(),
    created_at: Utc::now(),
  };
  store.create(order).await.unwrap();
}
