// storefront/src/web/routes.rs

use actix_web::web;

use crate::web::handlers::{checkout_handlers, order_handlers, payment_handlers, postback_handlers};

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/payments")
          .route("", web::post().to(payment_handlers::submit_payment_handler))
          .route(
            "/postback/{order_id}",
            web::post().to(postback_handlers::payment_postback_handler),
          ),
      )
      .service(
        web::scope("/orders")
          .route("/{order_id}", web::get().to(order_handlers::get_order_status_handler))
          .route("/{order_id}/link", web::post().to(order_handlers::link_order_handler)),
      )
      .service(web::scope("/checkout").route("/plan", web::get().to(checkout_handlers::checkout_plan_handler))),
  );
}
