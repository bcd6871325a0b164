// storefront/src/errors.rs

use actix_web::{HttpResponse, ResponseError};
use checkout_core::{CheckoutError, StoreError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Unauthorized: {0}")]
  Unauthorized(String),

  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Checkout Error: {source}")]
  Checkout {
    #[from]
    source: CheckoutError,
  },
}

impl From<StoreError> for AppError {
  fn from(err: StoreError) -> Self {
    AppError::from(CheckoutError::from(err))
  }
}

impl ResponseError for AppError {
  fn error_response(&self) -> HttpResponse {
    match self {
      AppError::Validation(m) => {
        tracing::info!(error = %m, "Rejecting invalid request.");
        HttpResponse::BadRequest().json(json!({"error": m}))
      }
      AppError::Unauthorized(m) => {
        tracing::warn!(error = %m, "Rejecting unauthenticated request.");
        HttpResponse::Unauthorized().json(json!({"error": m}))
      }
      AppError::Forbidden(m) => {
        tracing::warn!(error = %m, "Rejecting forbidden request.");
        HttpResponse::Forbidden().json(json!({"error": m}))
      }
      AppError::Checkout { source } => checkout_error_response(source),
      other => {
        tracing::error!(application_error = %other, "Responding with error");
        HttpResponse::InternalServerError().json(json!({"error": "An internal error occurred"}))
      }
    }
  }
}

fn checkout_error_response(err: &CheckoutError) -> HttpResponse {
  match err {
    CheckoutError::Validation { field, message } => {
      tracing::info!(field = %field, error = %message, "Rejecting invalid checkout request.");
      HttpResponse::BadRequest().json(json!({"error": message, "field": field}))
    }
    CheckoutError::OrderNotFound(id) => HttpResponse::NotFound().json(json!({"error": format!("Order not found: {}", id)})),
    CheckoutError::DuplicateOrder(id) => {
      tracing::warn!(order_id = %id, "Order identifier reused.");
      HttpResponse::Conflict().json(json!({"error": "Order identifier already used"}))
    }
    other => {
      tracing::error!(checkout_error = %other, "Responding with error");
      HttpResponse::InternalServerError().json(json!({"error": "An internal error occurred"}))
    }
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
