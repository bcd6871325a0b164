// core/src/gateway/transport.rs

use async_trait::async_trait;
use thiserror::Error;

use crate::gateway::form::AuthorizationForm;

/// What came back from the processor, before any interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayReply {
  pub status: u16,
  pub body: String,
}

#[derive(Debug, Error)]
pub enum GatewayError {
  #[error("transport failure: {source}")]
  Transport {
    #[source]
    source: anyhow::Error,
  },

  #[error("processor answered HTTP {status} with an empty body")]
  EmptyErrorResponse { status: u16 },

  #[error("gateway client misconfigured: {0}")]
  Configuration(String),
}

impl GatewayError {
  pub fn transport(source: impl Into<anyhow::Error>) -> Self {
    GatewayError::Transport { source: source.into() }
  }
}

/// One outbound POST of an authorization form. Implementations must not retry.
#[async_trait]
pub trait GatewayTransport: Send + Sync {
  async fn post_form(&self, form: &AuthorizationForm) -> Result<GatewayReply, GatewayError>;
}
