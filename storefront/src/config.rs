// storefront/src/config.rs

use crate::errors::{AppError, Result};
use checkout_core::gateway::http::{DEFAULT_GATEWAY_URL, DEFAULT_USER_AGENT};
use checkout_core::gateway::GatewayCredentials;
use checkout_core::reconcile::queue::DEFAULT_QUEUE_CAPACITY;
use dotenvy::dotenv;
use std::env;
use std::fmt;
use std::time::Duration;

#[derive(Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  /// Runs `schema.sql` at startup.
  pub apply_schema: bool,

  pub gateway_url: String,
  pub gateway_account: String,
  pub gateway_restrict_key: String,
  pub gateway_timeout: Duration,
  pub gateway_user_agent: String,

  pub reconcile_queue_capacity: usize,
}

// The restrict key and database credentials stay out of the logs.
impl fmt::Debug for AppConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("AppConfig")
      .field("server_host", &self.server_host)
      .field("server_port", &self.server_port)
      .field("apply_schema", &self.apply_schema)
      .field("gateway_url", &self.gateway_url)
      .field("gateway_account", &self.gateway_account)
      .field("gateway_timeout", &self.gateway_timeout)
      .field("gateway_user_agent", &self.gateway_user_agent)
      .field("reconcile_queue_capacity", &self.reconcile_queue_capacity)
      .finish_non_exhaustive()
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };
    let parse_env = |var_name: &str, default: &str| -> Result<u64> {
      get_env(var_name)
        .unwrap_or_else(|_| default.to_string())
        .parse::<u64>()
        .map_err(|e| AppError::Config(format!("Invalid {}: {}", var_name, e)))
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let database_url = get_env("DATABASE_URL")?;
    let apply_schema = get_env("APPLY_SCHEMA")
      .unwrap_or_else(|_| "false".to_string())
      .parse::<bool>()
      .map_err(|e| AppError::Config(format!("Invalid APPLY_SCHEMA value: {}", e)))?;

    let gateway_url = get_env("EPN_API_URL").unwrap_or_else(|_| DEFAULT_GATEWAY_URL.to_string());
    let gateway_account = get_env("EPN_ACCOUNT_NUMBER")?;
    let gateway_restrict_key = get_env("EPN_X_TRAN")?;
    let gateway_timeout = Duration::from_secs(parse_env("GATEWAY_TIMEOUT_SECS", "30")?);
    let gateway_user_agent = get_env("GATEWAY_USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());

    let reconcile_queue_capacity = parse_env("RECONCILE_QUEUE_CAPACITY", &DEFAULT_QUEUE_CAPACITY.to_string())? as usize;
    if reconcile_queue_capacity == 0 {
      return Err(AppError::Config("RECONCILE_QUEUE_CAPACITY must be at least 1".to_string()));
    }

    let config = Self {
      server_host,
      server_port,
      database_url,
      apply_schema,
      gateway_url,
      gateway_account,
      gateway_restrict_key,
      gateway_timeout,
      gateway_user_agent,
      reconcile_queue_capacity,
    };
    tracing::info!(config = ?config, "Application configuration loaded successfully.");
    Ok(config)
  }

  pub fn gateway_credentials(&self) -> GatewayCredentials {
    GatewayCredentials {
      account: self.gateway_account.clone(),
      restrict_key: self.gateway_restrict_key.clone(),
    }
  }

  pub fn server_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}
