// storefront/src/web/handlers/mod.rs

pub mod checkout_handlers;
pub mod order_handlers;
pub mod payment_handlers;
pub mod postback_handlers;

use uuid::Uuid;

use crate::errors::AppError;

pub(crate) fn parse_order_id(raw: &str) -> Result<Uuid, AppError> {
  Uuid::parse_str(raw.trim()).map_err(|_| AppError::Validation(format!("Invalid order id: {}", raw)))
}
