// core/src/gateway/mod.rs

//! Card processor integration: request encoding, HTTPS transport and reply parsing.

pub mod client;
pub mod form;
pub mod http;
pub mod parser;
pub mod postback;
pub mod transport;

pub use client::PaymentGatewayClient;
pub use form::{AuthorizationForm, GatewayCredentials};
pub use http::{HttpGatewayTransport, DEFAULT_GATEWAY_URL};
pub use parser::{parse_reply, GatewayOutcome, Verdict};
pub use postback::{PostbackVerifier, POSTBACK_KEY_HEADER};
pub use transport::{GatewayError, GatewayReply, GatewayTransport};
