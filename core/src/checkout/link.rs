// core/src/checkout/link.rs

use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{CheckoutError, CheckoutResult};
use crate::model::OrderPatch;
use crate::store::OrderStore;

fn parse_id(value: &str, field: &str) -> CheckoutResult<Uuid> {
  Uuid::parse_str(value.trim()).map_err(|_| CheckoutError::validation(field, format!("{} must be a UUID", field)))
}

/// Backfills the owner of a guest order. Payment status is not looked at.
///
/// Linking to the user already on the order writes nothing; an order owned by a
/// different user is refused.
#[instrument(skip(store))]
pub async fn link_order_to_user(store: &dyn OrderStore, order_id: &str, user_id: &str) -> CheckoutResult<()> {
  let order_id = parse_id(order_id, "orderId")?;
  let user_id = parse_id(user_id, "userId")?;

  let order = store.read(order_id).await?;
  match order.user_id {
    Some(existing) if existing == user_id => {
      info!("Order already linked to this user.");
      Ok(())
    }
    Some(_) => Err(CheckoutError::validation("userId", "Order is linked to a different user")),
    None => {
      store.update(order_id, OrderPatch::link_user(user_id)).await?;
      info!("Order linked to user.");
      Ok(())
    }
  }
}
