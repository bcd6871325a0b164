// storefront/src/web/handlers/postback_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use checkout_core::gateway::POSTBACK_KEY_HEADER;
use checkout_core::GatewayReplyEnvelope;
use chrono::Utc;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::handlers::parse_order_id;

/// Processor callback. Only postbacks carrying the merchant restrict key are
/// queued; parsing and correlation happen in the reconciliation worker so the
/// processor gets its acknowledgement quickly.
#[instrument(name = "handler::payment_postback", skip(app_state, req, path, body), fields(order_id = %path, body_len = body.len()))]
pub async fn payment_postback_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  path: web::Path<String>,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let order_id = parse_order_id(&path.into_inner())?;
  let body = String::from_utf8_lossy(&body).into_owned();

  let header_key = req
    .headers()
    .get(POSTBACK_KEY_HEADER)
    .and_then(|value| value.to_str().ok());
  if !app_state.postback_verifier.verify(header_key, &body) {
    warn!(has_header = header_key.is_some(), "Postback without a valid restrict key refused.");
    return Err(AppError::Unauthorized("Postback could not be authenticated".to_string()));
  }

  let envelope = GatewayReplyEnvelope {
    order_id,
    body,
    received_at: Utc::now(),
  };
  app_state.replies.publish(envelope).await?;

  info!("Processor postback queued.");
  Ok(HttpResponse::Ok().json(json!({"status": "received"})))
}
