//! Shared application state for the Axum API server.

use std::sync::Arc;
use std::time::Duration;

use gcm_common::config::AppConfig;
use gcm_common::error::AppError;
use gcm_notifier::backoff::RetrySettings;
use gcm_notifier::{Dispatcher, HttpGateway, Limits};

/// Application state shared across all route handlers via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher<HttpGateway>>,
    pub limits: Limits,
    /// Deadline for one delivery, retries included
    pub request_timeout: Option<Duration>,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher<HttpGateway>, config: &AppConfig) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            limits: Limits::from(config),
            request_timeout: config.request_timeout_secs.map(Duration::from_secs),
        }
    }

    /// Build the gateway client and dispatcher described by `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let gateway = HttpGateway::from_config(config)?;
        let dispatcher = Dispatcher::new(gateway, RetrySettings::from(config));
        Ok(Self::new(dispatcher, config))
    }
}
