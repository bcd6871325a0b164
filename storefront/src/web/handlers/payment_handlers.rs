// storefront/src/web/handlers/payment_handlers.rs

use actix_web::{web, HttpResponse};
use checkout_core::PaymentRequest;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::auth::SessionUser;

#[instrument(
    name = "handler::submit_payment",
    skip(app_state, session, req_payload),
    fields(order_id = req_payload.order_id.as_deref().unwrap_or_default(), signed_in = session.user_id.is_some())
)]
pub async fn submit_payment_handler(
  app_state: web::Data<AppState>,
  session: SessionUser,
  req_payload: web::Json<PaymentRequest>,
) -> Result<HttpResponse, AppError> {
  let receipt = app_state
    .orchestrator
    .submit_payment(req_payload.into_inner(), &session)
    .await?;

  info!("Payment submission accepted; settlement pending.");
  Ok(HttpResponse::Ok().json(receipt))
}
