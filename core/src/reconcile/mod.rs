// core/src/reconcile/mod.rs

//! Applies processor replies to stored orders.

pub mod queue;
pub mod reconciler;

pub use queue::{GatewayReplyEnvelope, ReconciliationQueue, ReplySender};
pub use reconciler::{user_message, OrderReconciler, ReconcileReport};
