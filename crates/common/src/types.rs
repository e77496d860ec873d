use serde::{Deserialize, Serialize};

/// Gateway error code that marks a token as temporarily undeliverable.
pub const UNAVAILABLE: &str = "Unavailable";

/// One entry of the gateway's `results` array, as it appears on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// Canonical registration id the sender should switch to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Delivery outcome for a single token.
///
/// Serializes to (and parses from) the gateway's per-token result object, so a
/// summary's `results` array has the same shape the gateway itself returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "GatewayResult", into = "GatewayResult")]
pub enum TokenOutcome {
    Delivered {
        message_id: String,
        canonical_id: Option<String>,
    },
    PermanentFailure {
        error_code: String,
    },
    /// Only this variant is resubmitted.
    TransientFailure {
        error_code: String,
    },
}

impl TokenOutcome {
    pub fn is_transient(&self) -> bool {
        matches!(self, TokenOutcome::TransientFailure { .. })
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, TokenOutcome::Delivered { .. })
    }

    pub fn canonical_id(&self) -> Option<&str> {
        match self {
            TokenOutcome::Delivered { canonical_id, .. } => canonical_id.as_deref(),
            _ => None,
        }
    }
}

impl From<GatewayResult> for TokenOutcome {
    fn from(result: GatewayResult) -> Self {
        let non_empty = |s: Option<String>| s.filter(|s| !s.is_empty());

        if let Some(message_id) = non_empty(result.message_id) {
            return TokenOutcome::Delivered {
                message_id,
                canonical_id: non_empty(result.registration_id),
            };
        }

        let error_code = result.error.unwrap_or_default();
        if error_code.eq_ignore_ascii_case(UNAVAILABLE) {
            TokenOutcome::TransientFailure { error_code }
        } else {
            TokenOutcome::PermanentFailure { error_code }
        }
    }
}

impl From<TokenOutcome> for GatewayResult {
    fn from(outcome: TokenOutcome) -> Self {
        match outcome {
            TokenOutcome::Delivered {
                message_id,
                canonical_id,
            } => GatewayResult {
                message_id: Some(message_id),
                registration_id: canonical_id,
                error: None,
            },
            TokenOutcome::PermanentFailure { error_code }
            | TokenOutcome::TransientFailure { error_code } => GatewayResult {
                message_id: None,
                registration_id: None,
                error: (!error_code.is_empty()).then_some(error_code),
            },
        }
    }
}

/// Final result of one delivery operation, returned to the caller.
///
/// `results` is aligned index-for-index with the request's `registration_ids`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverySummary {
    /// First non-zero multicast id reported by the gateway (0 if none)
    pub multicast_id: i64,
    pub success: u32,
    pub failure: u32,
    pub canonical_ids: u32,
    pub results: Vec<TokenOutcome>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> TokenOutcome {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_message_id_means_delivered() {
        assert_eq!(
            parse(json!({"message_id": "1:0408"})),
            TokenOutcome::Delivered {
                message_id: "1:0408".to_string(),
                canonical_id: None,
            }
        );
    }

    #[test]
    fn test_registration_id_becomes_canonical_id() {
        let outcome = parse(json!({"message_id": "1:2342", "registration_id": "32"}));
        assert_eq!(outcome.canonical_id(), Some("32"));
        assert!(outcome.is_delivered());
    }

    #[test]
    fn test_unavailable_is_transient_case_insensitive() {
        assert!(parse(json!({"error": "Unavailable"})).is_transient());
        assert!(parse(json!({"error": "UNAVAILABLE"})).is_transient());
        assert!(parse(json!({"error": "unavailable"})).is_transient());
    }

    #[test]
    fn test_other_errors_are_permanent() {
        assert_eq!(
            parse(json!({"error": "InvalidRegistration"})),
            TokenOutcome::PermanentFailure {
                error_code: "InvalidRegistration".to_string(),
            }
        );
        assert!(!parse(json!({"error": "NotRegistered"})).is_transient());
    }

    #[test]
    fn test_empty_message_id_is_not_delivered() {
        let outcome = parse(json!({"message_id": "", "error": "MismatchSenderId"}));
        assert!(!outcome.is_delivered());
    }

    #[test]
    fn test_outcome_serializes_to_wire_shape() {
        let delivered = TokenOutcome::Delivered {
            message_id: "1:0408".to_string(),
            canonical_id: Some("99".to_string()),
        };
        assert_eq!(
            serde_json::to_value(&delivered).unwrap(),
            json!({"message_id": "1:0408", "registration_id": "99"})
        );

        let failed = TokenOutcome::PermanentFailure {
            error_code: "NotRegistered".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            json!({"error": "NotRegistered"})
        );
    }

    #[test]
    fn test_summary_shape() {
        let summary = DeliverySummary {
            multicast_id: 216,
            success: 1,
            failure: 1,
            canonical_ids: 0,
            results: vec![
                TokenOutcome::Delivered {
                    message_id: "1:0408".to_string(),
                    canonical_id: None,
                },
                TokenOutcome::TransientFailure {
                    error_code: "Unavailable".to_string(),
                },
            ],
        };
        assert_eq!(
            serde_json::to_value(&summary).unwrap(),
            json!({
                "multicast_id": 216,
                "success": 1,
                "failure": 1,
                "canonical_ids": 0,
                "results": [
                    {"message_id": "1:0408"},
                    {"error": "Unavailable"}
                ]
            })
        );
    }
}
