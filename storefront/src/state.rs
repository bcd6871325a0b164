// storefront/src/state.rs

use checkout_core::{CheckoutOrchestrator, OrderStore, PostbackVerifier, ReplySender};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn OrderStore>,
  pub orchestrator: Arc<CheckoutOrchestrator>,
  /// Postbacks go through the same reconciliation queue as direct replies.
  pub replies: ReplySender,
  pub postback_verifier: PostbackVerifier,
}
