use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Common error types used across the application.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::UpstreamUnavailable(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::Protocol(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            AppError::Cancelled(msg) => (StatusCode::GATEWAY_TIMEOUT, msg.clone()),
            AppError::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = json!({ "error": message });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let response =
            AppError::Validation("Missing mandatory field 'api_key'".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_upstream_unavailable_maps_to_bad_gateway() {
        let response =
            AppError::UpstreamUnavailable("GCM is unavailable".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_protocol_keeps_prefix_in_message() {
        let err = AppError::Protocol("sizes do not match".to_string());
        assert_eq!(err.to_string(), "Protocol error: sizes do not match");
    }
}
