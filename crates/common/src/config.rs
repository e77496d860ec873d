use std::net::SocketAddr;
use std::str::FromStr;

use serde::Deserialize;

const DEFAULT_GCM_URL: &str = "https://android.googleapis.com/gcm/send";

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// GCM send endpoint
    pub gcm_url: String,

    /// Maximum number of registration ids accepted in one request (GCM default: 1000)
    pub registration_ids_limit: usize,

    /// Ceiling for a notification's `time_to_live` in seconds (GCM default: 4 weeks)
    pub max_seconds_to_live: u64,

    /// Number of retries allowed after the first attempt
    pub backoff_retries: u32,

    /// Initial backoff delay in milliseconds
    pub min_backoff_delay_ms: u64,

    /// Backoff delay ceiling in milliseconds
    pub max_backoff_delay_ms: u64,

    /// Timeout for a single gateway HTTP call
    pub gcm_http_timeout_secs: u64,

    /// Optional deadline for a whole delivery operation, retries included
    pub request_timeout_secs: Option<u64>,

    /// Address the API server binds to
    pub bind_addr: SocketAddr,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gcm_url: DEFAULT_GCM_URL.to_string(),
            registration_ids_limit: 1000,
            max_seconds_to_live: 2_419_200,
            backoff_retries: 5,
            min_backoff_delay_ms: 1000,
            max_backoff_delay_ms: 1_024_000,
            gcm_http_timeout_secs: 30,
            request_timeout_secs: None,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            gcm_url: lookup("GCM_URL").unwrap_or(defaults.gcm_url),
            registration_ids_limit: parse_or(
                &lookup,
                "GCM_REGISTRATION_IDS_LIMIT",
                defaults.registration_ids_limit,
            )?,
            max_seconds_to_live: parse_or(
                &lookup,
                "GCM_MAX_SECONDS_TO_LIVE",
                defaults.max_seconds_to_live,
            )?,
            backoff_retries: parse_or(&lookup, "GCM_BACKOFF_RETRIES", defaults.backoff_retries)?,
            min_backoff_delay_ms: parse_or(
                &lookup,
                "GCM_MIN_BACKOFF_DELAY_MS",
                defaults.min_backoff_delay_ms,
            )?,
            max_backoff_delay_ms: parse_or(
                &lookup,
                "GCM_MAX_BACKOFF_DELAY_MS",
                defaults.max_backoff_delay_ms,
            )?,
            gcm_http_timeout_secs: parse_or(
                &lookup,
                "GCM_HTTP_TIMEOUT_SECS",
                defaults.gcm_http_timeout_secs,
            )?,
            request_timeout_secs: match lookup("RELAY_REQUEST_TIMEOUT_SECS") {
                Some(raw) => Some(raw.parse().map_err(|_| {
                    anyhow::anyhow!("RELAY_REQUEST_TIMEOUT_SECS must be a valid u64")
                })?),
                None => None,
            },
            bind_addr: parse_or(&lookup, "RELAY_BIND_ADDR", defaults.bind_addr)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject combinations the delivery engine cannot work with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if reqwest::Url::parse(&self.gcm_url).is_err() {
            anyhow::bail!(
                "'{}' is an illegal value for config parameter 'gcm_url'",
                self.gcm_url
            );
        }
        if self.min_backoff_delay_ms == 0 {
            anyhow::bail!("GCM_MIN_BACKOFF_DELAY_MS must be at least 1");
        }
        if self.min_backoff_delay_ms > self.max_backoff_delay_ms {
            anyhow::bail!(
                "GCM_MIN_BACKOFF_DELAY_MS ({}) must not exceed GCM_MAX_BACKOFF_DELAY_MS ({})",
                self.min_backoff_delay_ms,
                self.max_backoff_delay_ms
            );
        }
        if self.registration_ids_limit == 0 {
            anyhow::bail!("GCM_REGISTRATION_IDS_LIMIT must be at least 1");
        }
        Ok(())
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| {
            anyhow::anyhow!(
                "{} must be a valid {}",
                key,
                std::any::type_name::<T>().rsplit("::").next().unwrap_or("value")
            )
        }),
        None => Ok(default),
    }
}
