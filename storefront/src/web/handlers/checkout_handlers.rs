// storefront/src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use checkout_core::CheckoutPlan;
use serde::Deserialize;

use crate::errors::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPlanQuery {
  #[serde(default)]
  pub requires_ffl: bool,
  #[serde(default = "default_has_shippable")]
  pub has_shippable: bool,
}

fn default_has_shippable() -> bool {
  true
}

pub async fn checkout_plan_handler(query: web::Query<CheckoutPlanQuery>) -> Result<HttpResponse, AppError> {
  let plan = CheckoutPlan::for_cart(query.requires_ffl, query.has_shippable);
  Ok(HttpResponse::Ok().json(plan))
}
