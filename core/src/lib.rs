// core/src/lib.rs

//! Checkout core: order submission, card-gateway authorization, reply
//! reconciliation and settlement polling for the storefront.
//!
//! The moving parts, leaves first:
//!  - [`store::OrderStore`]: keyed record store for orders (create / update / read).
//!  - [`gateway`]: form encoding, HTTPS transport and reply parsing for the card processor.
//!  - [`reconcile::OrderReconciler`]: applies a parsed reply to the stored order, once.
//!  - [`checkout::CheckoutOrchestrator`]: validates, records the pending order, dispatches
//!    the authorization request and returns without waiting for settlement.
//!  - [`poller::StatusPoller`]: watches the stored order until it settles or times out.
//!
//! Both the orchestrator and the reconciler are built as named step [`pipeline::Pipeline`]s.

pub mod checkout;
pub mod clock;
pub mod error;
pub mod gateway;
pub mod model;
pub mod pipeline;
pub mod poller;
pub mod reconcile;
pub mod store;
pub mod validation;

// --- Re-exports for the public API ---

pub use crate::checkout::{link_order_to_user, CheckoutOrchestrator, CheckoutPlan, CheckoutStep, CurrentUser, Guest};
pub use crate::clock::{Clock, FixedClock, SystemClock};
pub use crate::error::{CheckoutError, CheckoutResult, StoreError};
pub use crate::gateway::{
  parse_reply, GatewayCredentials, GatewayError, GatewayOutcome, GatewayReply, GatewayTransport, HttpGatewayTransport,
  PaymentGatewayClient, PostbackVerifier, Verdict,
};
pub use crate::model::{
  Address, CartLine, NewOrder, Order, OrderLineItem, OrderPatch, PaymentReceipt, PaymentRequest, PaymentStatus,
};
pub use crate::pipeline::{ContextData, Pipeline, PipelineControl, PipelineResult};
pub use crate::poller::{CheckoutNavigator, Destination, PollHandle, PollOutcome, PollerConfig, SettlementListener, StatusPoller};
pub use crate::reconcile::{GatewayReplyEnvelope, OrderReconciler, ReconciliationQueue, ReconcileReport, ReplySender};
pub use crate::store::{InMemoryOrderStore, OrderStore, UpdateOutcome};
pub use crate::validation::{validate_payment, ValidatedPayment};
