// storefront/src/main.rs

mod config;
mod errors;
mod models;
mod state;
mod store;
mod web;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::state::AppState;
use crate::store::PgOrderStore;

use actix_web::{web as actix_data, App, HttpServer};
use checkout_core::{
  CheckoutOrchestrator, HttpGatewayTransport, OrderReconciler, OrderStore, PaymentGatewayClient, PostbackVerifier,
  ReconciliationQueue, SystemClock,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env()) // RUST_LOG override
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting storefront server...");

  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      return Err(e.into());
    }
  };

  let db_pool = PgPool::connect(&app_config.database_url).await.map_err(|e| {
    tracing::error!(error = %e, "Failed to connect to the database.");
    AppError::from(e)
  })?;
  tracing::info!("Successfully connected to the database.");

  if app_config.apply_schema {
    sqlx::raw_sql(include_str!("../schema.sql"))
      .execute(&db_pool)
      .await
      .map_err(AppError::from)?;
    tracing::info!("Database schema applied.");
  }

  let store: Arc<dyn OrderStore> = Arc::new(PgOrderStore::new(db_pool));
  let clock = Arc::new(SystemClock);

  let reconciler = Arc::new(OrderReconciler::new(store.clone(), clock.clone()));
  let queue = ReconciliationQueue::start(reconciler, app_config.reconcile_queue_capacity);

  let transport = HttpGatewayTransport::new(
    &app_config.gateway_url,
    app_config.gateway_timeout,
    &app_config.gateway_user_agent,
  )?;
  let credentials = app_config.gateway_credentials();
  let postback_verifier = PostbackVerifier::new(&credentials);
  let gateway = PaymentGatewayClient::new(Arc::new(transport), credentials);
  let orchestrator = Arc::new(CheckoutOrchestrator::new(store.clone(), gateway, queue.sender(), clock));

  let app_state = AppState {
    store,
    orchestrator,
    replies: queue.sender(),
    postback_verifier,
  };

  let server_address = app_config.server_address();
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await?;

  tracing::info!("Server stopped; draining reconciliation queue.");
  match tokio::time::timeout(SHUTDOWN_GRACE, queue.shutdown()).await {
    Ok(processed) => tracing::info!(processed, "Shutdown complete."),
    Err(_) => tracing::warn!("Reconciliation queue did not drain in time; pending replies stay unreconciled."),
  }
  Ok(())
}
