//! GCM gateway client.
//!
//! One call = one HTTP round trip carrying a batch of tokens. Retrying is the
//! dispatcher's job; nothing here loops.

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::Value;

use gcm_common::config::AppConfig;
use gcm_common::error::AppError;
use gcm_common::types::{GatewayResult, TokenOutcome};

use crate::error::GatewayError;
use crate::request::Payload;

/// Structured result of one gateway call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttemptResult {
    pub multicast_id: Option<i64>,
    /// One outcome per submitted token, in submission order.
    pub outcomes: Vec<TokenOutcome>,
}

/// HTTP 200 body returned by the gateway.
#[derive(Debug, Deserialize)]
struct GatewayResponse {
    #[serde(default)]
    multicast_id: Option<i64>,
    results: Vec<GatewayResult>,
}

impl From<GatewayResponse> for AttemptResult {
    fn from(response: GatewayResponse) -> Self {
        Self {
            multicast_id: response.multicast_id,
            outcomes: response.results.into_iter().map(TokenOutcome::from).collect(),
        }
    }
}

/// Sends one batch of tokens plus a payload to the gateway.
///
/// Implementations must be safe to share between concurrent deliveries and
/// must return outcomes in the order the tokens were submitted.
pub trait GatewayClient: Send + Sync {
    fn send(
        &self,
        tokens: &[String],
        payload: &Payload,
        api_key: &str,
    ) -> impl Future<Output = Result<AttemptResult, GatewayError>> + Send;
}

/// reqwest-backed gateway client. The inner `reqwest::Client` pools connections.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    url: reqwest::Url,
}

impl HttpGateway {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, AppError> {
        let url = reqwest::Url::parse(url).map_err(|_| {
            AppError::Config(format!(
                "'{}' is an illegal value for config parameter 'gcm_url'",
                url
            ))
        })?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, url })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        Self::new(
            &config.gcm_url,
            Duration::from_secs(config.gcm_http_timeout_secs),
        )
    }

    pub fn url(&self) -> &reqwest::Url {
        &self.url
    }
}

impl GatewayClient for HttpGateway {
    async fn send(
        &self,
        tokens: &[String],
        payload: &Payload,
        api_key: &str,
    ) -> Result<AttemptResult, GatewayError> {
        let mut body = payload.clone();
        body.insert(
            "registration_ids".to_string(),
            Value::Array(tokens.iter().cloned().map(Value::String).collect()),
        );

        tracing::debug!(url = %self.url, tokens = tokens.len(), "Sending POST to GCM");

        let response = self
            .client
            .post(self.url.clone())
            .header(AUTHORIZATION, format!("key={}", api_key))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if status != StatusCode::OK {
            tracing::error!(status = status.as_u16(), body = %text, "GCM error response");
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        tracing::debug!(body = %text, "GCM response");
        let parsed: GatewayResponse = serde_json::from_str(&text)?;
        Ok(parsed.into())
    }
}
