//! Client for the payment gateway's REST API.
//!
//! Requests are authenticated with HTTP Basic auth: the secret key as the
//! user name and an empty password. Bodies use the gateway's JSON:API-style
//! envelope, `{"data":{"attributes":{...}}}`.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Status and body returned by the gateway, relayed as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResponse {
    pub status: StatusCode,
    pub body: Value,
}

#[derive(Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: String,
    secret_key: String,
}

impl std::fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayClient")
            .field("base_url", &self.base_url)
            .field("secret_key", &"[redacted]")
            .finish_non_exhaustive()
    }
}

impl GatewayClient {
    /// # Errors
    ///
    /// Returns [`GatewayError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, secret_key: &str, timeout_secs: u64) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            secret_key: secret_key.to_owned(),
        })
    }

    /// POSTs `attributes` wrapped in the gateway envelope to `path`.
    ///
    /// Non-2xx answers are not errors; they are returned for relaying. A
    /// body that is not JSON is relayed as `{"error": <text>}`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Http`] when the gateway cannot be reached.
    pub async fn post(&self, path: &str, attributes: Value) -> Result<GatewayResponse, GatewayError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.secret_key, Some(""))
            .json(&json!({ "data": { "attributes": attributes } }))
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let body = serde_json::from_str(&text).unwrap_or_else(|_| json!({ "error": text }));

        tracing::debug!(path, status = status.as_u16(), "gateway answered");
        Ok(GatewayResponse { status, body })
    }
}
