// core/src/gateway/http.rs

//! Reqwest-backed transport: TLS 1.2 or newer, explicit request timeout.

use async_trait::async_trait;
use reqwest::{header, tls, Client, Url};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::gateway::form::AuthorizationForm;
use crate::gateway::transport::{GatewayError, GatewayReply, GatewayTransport};

pub const DEFAULT_GATEWAY_URL: &str = "https://www.eprocessingnetwork.com/cgi-bin/epn/secure/tdbe/transact.pl";
pub const DEFAULT_USER_AGENT: &str = "Storefront/1.0";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpGatewayTransport {
  client: Client,
  endpoint: Url,
}

impl HttpGatewayTransport {
  pub fn new(endpoint: &str, timeout: Duration, user_agent: &str) -> Result<Self, GatewayError> {
    let endpoint = Url::parse(endpoint)
      .map_err(|e| GatewayError::Configuration(format!("invalid gateway url '{}': {}", endpoint, e)))?;
    let client = Client::builder()
      .min_tls_version(tls::Version::TLS_1_2)
      .timeout(timeout)
      .user_agent(user_agent)
      .build()
      .map_err(|e| GatewayError::Configuration(format!("cannot build HTTP client: {}", e)))?;
    Ok(Self { client, endpoint })
  }

  pub fn endpoint(&self) -> &Url {
    &self.endpoint
  }
}

#[async_trait]
impl GatewayTransport for HttpGatewayTransport {
  #[instrument(name = "gateway::post_form", skip_all, fields(endpoint = %self.endpoint, order_id = form.get("Postback.OrderID").unwrap_or_default()))]
  async fn post_form(&self, form: &AuthorizationForm) -> Result<GatewayReply, GatewayError> {
    let response = self
      .client
      .post(self.endpoint.clone())
      .header(header::ACCEPT, "*/*")
      .form(form.fields())
      .send()
      .await
      .map_err(GatewayError::transport)?;

    let status = response.status();
    let body = response.text().await.map_err(GatewayError::transport)?;
    debug!(status = status.as_u16(), body_len = body.len(), "Processor replied.");

    if !status.is_success() && body.trim().is_empty() {
      return Err(GatewayError::EmptyErrorResponse {
        status: status.as_u16(),
      });
    }
    Ok(GatewayReply {
      status: status.as_u16(),
      body,
    })
  }
}
