use thiserror::Error;

use gcm_common::error::AppError;

/// Message reported when no attempt ever reached the gateway successfully.
pub const GCM_UNAVAILABLE: &str = "GCM is unavailable";

/// Failure of a single gateway call. Every variant fails the whole attempt.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gateway returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed gateway response: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Terminal failure of a delivery operation. None of these carry a summary.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Every attempt failed at the transport level.
    #[error("GCM is unavailable")]
    UpstreamUnavailable,

    /// The gateway returned a result list whose length differs from the submitted batch.
    #[error("sizes do not match. regIds: {submitted}; returned: {returned}")]
    Protocol { submitted: usize, returned: usize },

    #[error("delivery cancelled")]
    Cancelled,
}

impl From<DispatchError> for AppError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::UpstreamUnavailable => {
                AppError::UpstreamUnavailable(GCM_UNAVAILABLE.to_string())
            }
            DispatchError::Protocol { .. } => AppError::Protocol(err.to_string()),
            DispatchError::Cancelled => AppError::Cancelled(err.to_string()),
        }
    }
}
