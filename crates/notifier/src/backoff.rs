//! Backoff scheduling for resubmitted batches.
//!
//! The scheduler only computes how long to wait; the dispatcher does the
//! (non-blocking) waiting.

use std::time::Duration;

use gcm_common::config::AppConfig;

/// Retry ceiling and backoff bounds for one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySettings {
    /// Attempts allowed after the first one
    pub max_retries: u32,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl From<&AppConfig> for RetrySettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_retries: config.backoff_retries,
            min_delay_ms: config.min_backoff_delay_ms,
            max_delay_ms: config.max_backoff_delay_ms,
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        RetrySettings::from(&AppConfig::default())
    }
}

/// Jittered exponential backoff.
///
/// Each draw is uniform in `[delay/2, delay*3/2)`. After a draw the base delay
/// doubles unless that would reach `max_delay_ms`.
#[derive(Debug)]
pub struct Backoff {
    delay_ms: u64,
    max_delay_ms: u64,
    rng: fastrand::Rng,
}

impl Backoff {
    pub fn new(min_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self::with_rng(min_delay_ms, max_delay_ms, fastrand::Rng::new())
    }

    pub fn with_rng(min_delay_ms: u64, max_delay_ms: u64, rng: fastrand::Rng) -> Self {
        Self {
            delay_ms: min_delay_ms,
            max_delay_ms,
            rng,
        }
    }

    /// Base delay the next draw is centred on.
    pub fn current_delay_ms(&self) -> u64 {
        self.delay_ms
    }

    pub fn next_delay(&mut self) -> Duration {
        let delay = self.delay_ms;
        let jitter = if delay == 0 { 0 } else { self.rng.u64(0..delay) };
        let sleep_ms = delay / 2 + jitter;

        let doubled = delay.saturating_mul(2);
        if doubled < self.max_delay_ms {
            self.delay_ms = doubled;
        }

        Duration::from_millis(sleep_ms)
    }
}

/// Per-delivery retry bookkeeping, owned by the dispatch loop.
#[derive(Debug)]
pub struct RetryState {
    /// Zero-based index of the attempt currently in flight
    attempt: u32,
    max_retries: u32,
    backoff: Backoff,
}

impl RetryState {
    pub fn new(settings: &RetrySettings) -> Self {
        Self::with_backoff(
            settings.max_retries,
            Backoff::new(settings.min_delay_ms, settings.max_delay_ms),
        )
    }

    pub fn with_backoff(max_retries: u32, backoff: Backoff) -> Self {
        Self {
            attempt: 0,
            max_retries,
            backoff,
        }
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Whether another attempt should follow the one just completed.
    ///
    /// A failed gateway call always wants a retry (the whole batch is still
    /// pending); a successful one only if some tokens came back transient.
    pub fn should_retry(
        &self,
        retry_tokens_non_empty: bool,
        gateway_call_succeeded: bool,
    ) -> bool {
        should_retry(
            self.attempt,
            self.max_retries,
            retry_tokens_non_empty,
            gateway_call_succeeded,
        )
    }

    /// Move to the next attempt, returning how long to wait before it.
    pub fn advance(&mut self) -> Duration {
        let delay = self.backoff.next_delay();
        self.attempt += 1;
        delay
    }
}

/// `attempt` is the zero-based index of the attempt just completed, so at most
/// `1 + max_retries` attempts are made.
pub fn should_retry(
    attempt: u32,
    max_retries: u32,
    retry_tokens_non_empty: bool,
    gateway_call_succeeded: bool,
) -> bool {
    attempt < max_retries && (!gateway_call_succeeded || retry_tokens_non_empty)
}
