// storefront/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use checkout_core::{link_order_to_user, PaymentStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::auth::SessionUser;
use crate::web::handlers::parse_order_id;

/// What polling clients see. Processor payloads stay server-side.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusView {
  pub order_id: String,
  pub payment_status: PaymentStatus,
  pub response_message: Option<String>,
  pub updated_at: DateTime<Utc>,
}

#[instrument(name = "handler::get_order_status", skip(app_state, path), fields(order_id = %path))]
pub async fn get_order_status_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let order_id = parse_order_id(&path.into_inner())?;
  let order = app_state.store.read(order_id).await?;

  Ok(HttpResponse::Ok().json(OrderStatusView {
    order_id: order.order_id.to_string(),
    payment_status: order.payment_status,
    response_message: order.response_message,
    updated_at: order.updated_at,
  }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkOrderRequestPayload {
  pub user_id: String,
}

/// Links a guest order to the signed-in account. The body names the account
/// and must agree with the session.
#[instrument(name = "handler::link_order", skip(app_state, session, path, req_payload), fields(order_id = %path))]
pub async fn link_order_handler(
  app_state: web::Data<AppState>,
  session: SessionUser,
  path: web::Path<String>,
  req_payload: web::Json<LinkOrderRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let session_user = session
    .user_id
    .ok_or_else(|| AppError::Unauthorized("Sign in to link an order".to_string()))?;
  let same_user = Uuid::parse_str(req_payload.user_id.trim()).is_ok_and(|id| id == session_user);
  if !same_user {
    return Err(AppError::Forbidden("Orders can only be linked to your own account".to_string()));
  }

  let order_id = path.into_inner();
  let user_id = session_user.to_string();
  link_order_to_user(app_state.store.as_ref(), &order_id, &user_id).await?;

  info!("Order linked to user account.");
  Ok(HttpResponse::Ok().json(json!({"orderId": order_id, "userId": user_id, "status": "linked"})))
}
