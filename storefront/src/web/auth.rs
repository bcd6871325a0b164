// storefront/src/web/auth.rs

use actix_web::{http::header, FromRequest, HttpRequest};
use checkout_core::CurrentUser;
use futures_util::future::{ready, Ready};
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;

/// The signed-in user, if any, taken from `Authorization: Bearer <user id>`.
///
/// Session tokens are issued by the identity provider in front of this service;
/// by the time a request arrives here the bearer value is the user's id.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionUser {
  pub user_id: Option<Uuid>,
}

impl CurrentUser for SessionUser {
  fn user_id(&self) -> Option<Uuid> {
    self.user_id
  }
}

impl FromRequest for SessionUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    let Some(value) = req.headers().get(header::AUTHORIZATION) else {
      return ready(Ok(SessionUser::default()));
    };

    let user_id = value
      .to_str()
      .ok()
      .and_then(|v| v.strip_prefix("Bearer "))
      .and_then(|token| Uuid::parse_str(token.trim()).ok());

    match user_id {
      Some(user_id) => ready(Ok(SessionUser { user_id: Some(user_id) })),
      None => {
        warn!("SessionUser extractor: malformed Authorization header.");
        ready(Err(AppError::Validation("Malformed Authorization header".to_string())))
      }
    }
  }
}
