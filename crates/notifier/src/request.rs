//! Inbound request validation.
//!
//! Everything here runs before the first gateway call; a rejected request never
//! reaches GCM and is never retried.

use serde::Deserialize;
use serde_json::{Map, Value};

use gcm_common::config::AppConfig;
use gcm_common::error::AppError;

/// Notification fields forwarded verbatim to the gateway on every attempt.
pub type Payload = Map<String, Value>;

/// Raw request body as received from the caller.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundRequest {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub notification: Option<Map<String, Value>>,
}

/// Request-size ceilings applied during validation.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub registration_ids_limit: usize,
    pub max_seconds_to_live: u64,
}

impl From<&AppConfig> for Limits {
    fn from(config: &AppConfig) -> Self {
        Self {
            registration_ids_limit: config.registration_ids_limit,
            max_seconds_to_live: config.max_seconds_to_live,
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Limits::from(&AppConfig::default())
    }
}

/// A validated delivery request.
#[derive(Debug, Clone)]
pub struct DeliveryRequest {
    pub api_key: String,
    /// Recipient tokens in caller order, duplicates preserved
    pub tokens: Vec<String>,
    /// Notification body without `registration_ids`
    pub payload: Payload,
    pub time_to_live: Option<u64>,
}

impl DeliveryRequest {
    /// Validate an inbound request against the configured limits.
    pub fn from_inbound(inbound: InboundRequest, limits: &Limits) -> Result<Self, AppError> {
        let api_key = inbound.api_key.unwrap_or_default();
        if api_key.is_empty() {
            return Err(AppError::Validation(
                "Missing mandatory field 'api_key'".to_string(),
            ));
        }

        let mut payload = inbound.notification.ok_or_else(|| {
            AppError::Validation("Missing mandatory field 'notification'".to_string())
        })?;

        let time_to_live = match payload.get("time_to_live") {
            None | Some(Value::Null) => None,
            Some(value) => {
                let ttl = value.as_u64().ok_or_else(|| {
                    AppError::Validation(
                        "Field 'time_to_live' must be a non-negative integer".to_string(),
                    )
                })?;
                if ttl > limits.max_seconds_to_live {
                    return Err(AppError::Validation(format!(
                        "Max value of 'time_to_live' exceeded: {} > {}",
                        ttl, limits.max_seconds_to_live
                    )));
                }
                Some(ttl)
            }
        };

        let tokens = match payload.remove("registration_ids") {
            Some(Value::Array(ids)) if !ids.is_empty() => ids,
            _ => {
                return Err(AppError::Validation(
                    "Missing mandatory non-empty field 'registration_ids'".to_string(),
                ));
            }
        };
        if tokens.len() > limits.registration_ids_limit {
            return Err(AppError::Validation(format!(
                "Max size of 'registration_ids' exceeded: {} > {}",
                tokens.len(),
                limits.registration_ids_limit
            )));
        }

        let tokens = tokens
            .into_iter()
            .map(|id| match id {
                Value::String(s) if !s.is_empty() => Ok(s),
                _ => Err(AppError::Validation(
                    "Field 'registration_ids' must contain only non-empty strings".to_string(),
                )),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            api_key,
            tokens,
            payload,
            time_to_live,
        })
    }
}
