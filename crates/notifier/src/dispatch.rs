//! Dispatch driver.
//!
//! Runs the attempt loop for one delivery:
//! 1. Send the current batch to the gateway
//! 2. Reconcile the results into the outcome map (or keep the whole batch
//!    pending if the call itself failed)
//! 3. Ask the retry state whether to go again, and wait out the backoff
//! 4. Build the summary in original token order
//!
//! All per-delivery state lives on this function's stack, so any number of
//! deliveries can run concurrently against one shared `Dispatcher`.

use std::future::Future;

use gcm_common::types::{DeliverySummary, TokenOutcome, UNAVAILABLE};

use crate::backoff::{RetrySettings, RetryState};
use crate::error::DispatchError;
use crate::gateway::GatewayClient;
use crate::reconciler::{OutcomeMap, reconcile};
use crate::request::DeliveryRequest;

/// Delivers notifications through a gateway, retrying transient failures.
#[derive(Debug, Clone)]
pub struct Dispatcher<G> {
    gateway: G,
    settings: RetrySettings,
}

impl<G: GatewayClient> Dispatcher<G> {
    pub fn new(gateway: G, settings: RetrySettings) -> Self {
        Self { gateway, settings }
    }

    pub fn settings(&self) -> &RetrySettings {
        &self.settings
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Deliver `request`, retrying until every token is final or the retry
    /// ceiling is reached.
    ///
    /// Dropping the returned future abandons the delivery between attempts or
    /// mid-call; no summary is produced in that case.
    pub async fn dispatch(
        &self,
        request: &DeliveryRequest,
    ) -> Result<DeliverySummary, DispatchError> {
        self.dispatch_with_state(request, RetryState::new(&self.settings))
            .await
    }

    /// Like [`dispatch`](Self::dispatch), but gives up with
    /// [`DispatchError::Cancelled`] as soon as `cancel` completes.
    pub async fn dispatch_until<F>(
        &self,
        request: &DeliveryRequest,
        cancel: F,
    ) -> Result<DeliverySummary, DispatchError>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            result = self.dispatch(request) => result,
            _ = cancel => {
                tracing::warn!(tokens = request.tokens.len(), "Delivery cancelled by caller");
                Err(DispatchError::Cancelled)
            }
        }
    }

    /// Run the attempt loop with an explicit retry state.
    pub async fn dispatch_with_state(
        &self,
        request: &DeliveryRequest,
        mut retry: RetryState,
    ) -> Result<DeliverySummary, DispatchError> {
        let mut outcomes = OutcomeMap::new();
        let mut multicast_id: Option<i64> = None;
        let mut submitted = request.tokens.clone();

        loop {
            tracing::debug!(
                attempt = retry.attempt() + 1,
                tokens = ?submitted,
                "Sending notification to registration ids"
            );

            let sent = self
                .gateway
                .send(&submitted, &request.payload, &request.api_key)
                .await;

            let (pending, call_succeeded) = match sent {
                Ok(result) => {
                    if multicast_id.is_none() {
                        multicast_id = result.multicast_id.filter(|id| *id != 0);
                    }
                    (reconcile(&submitted, &result, &mut outcomes)?, true)
                }
                Err(e) => {
                    tracing::warn!(
                        attempt = retry.attempt() + 1,
                        tokens = submitted.len(),
                        error = %e,
                        "Gateway call failed, batch stays pending"
                    );
                    (std::mem::take(&mut submitted), false)
                }
            };

            if !retry.should_retry(!pending.is_empty(), call_succeeded) {
                if !pending.is_empty() {
                    tracing::warn!(
                        attempts = retry.attempt() + 1,
                        pending = pending.len(),
                        "Retry ceiling reached with tokens still pending"
                    );
                }
                break;
            }

            let delay = retry.advance();
            tracing::info!(
                next_attempt = retry.attempt() + 1,
                pending = pending.len(),
                delay_ms = delay.as_millis() as u64,
                "Backing off before resubmitting"
            );
            tokio::time::sleep(delay).await;
            submitted = pending;
        }

        if outcomes.is_empty() {
            tracing::error!(attempts = retry.attempt() + 1, "All gateway calls failed");
            return Err(DispatchError::UpstreamUnavailable);
        }

        let summary = summarize(&request.tokens, &outcomes, multicast_id.unwrap_or(0));
        tracing::info!(
            multicast_id = summary.multicast_id,
            success = summary.success,
            failure = summary.failure,
            canonical_ids = summary.canonical_ids,
            attempts = retry.attempt() + 1,
            "Delivery complete"
        );
        Ok(summary)
    }
}

/// Build the caller-facing summary, one result per original token.
pub fn summarize(tokens: &[String], outcomes: &OutcomeMap, multicast_id: i64) -> DeliverySummary {
    let mut success = 0;
    let mut failure = 0;
    let mut canonical_ids = 0;

    let results = tokens
        .iter()
        .map(|token| {
            // The first structured result covers the whole original batch, so
            // every token has an entry once the map is non-empty.
            let outcome = outcomes
                .get(token)
                .cloned()
                .unwrap_or_else(|| TokenOutcome::TransientFailure {
                    error_code: UNAVAILABLE.to_string(),
                });

            if outcome.is_delivered() {
                success += 1;
                if outcome.canonical_id().is_some() {
                    canonical_ids += 1;
                }
            } else {
                failure += 1;
            }
            outcome
        })
        .collect();

    DeliverySummary {
        multicast_id,
        success,
        failure,
        canonical_ids,
        results,
    }
}
