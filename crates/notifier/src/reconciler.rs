//! Batch reconciliation.
//!
//! Folds one attempt's per-token results into the running [`OutcomeMap`] and
//! works out which tokens go into the next, smaller batch.

use std::collections::{HashMap, HashSet};

use gcm_common::types::TokenOutcome;

use crate::error::DispatchError;
use crate::gateway::AttemptResult;

/// Latest known outcome per original token.
///
/// A final (non-transient) outcome is never overwritten.
#[derive(Debug, Clone, Default)]
pub struct OutcomeMap {
    outcomes: HashMap<String, TokenOutcome>,
}

impl OutcomeMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, token: &str, outcome: TokenOutcome) {
        self.outcomes.insert(token.to_string(), outcome);
    }

    pub fn get(&self, token: &str) -> Option<&TokenOutcome> {
        self.outcomes.get(token)
    }

    pub fn is_final(&self, token: &str) -> bool {
        self.get(token).is_some_and(|o| !o.is_transient())
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }
}

/// Reconcile one attempt against the tokens that were submitted for it.
///
/// Returns the tokens to resubmit, in submission order. A result list whose
/// length differs from `submitted` is a gateway contract breach and fails the
/// whole delivery.
pub fn reconcile(
    submitted: &[String],
    result: &AttemptResult,
    outcomes: &mut OutcomeMap,
) -> Result<Vec<String>, DispatchError> {
    if result.outcomes.len() != submitted.len() {
        return Err(DispatchError::Protocol {
            submitted: submitted.len(),
            returned: result.outcomes.len(),
        });
    }

    let settled: HashSet<&str> = submitted
        .iter()
        .map(String::as_str)
        .filter(|token| outcomes.is_final(token))
        .collect();

    // Reverse order: for duplicated tokens the earliest position is written last.
    for (token, outcome) in submitted.iter().zip(&result.outcomes).rev() {
        if !settled.contains(token.as_str()) {
            outcomes.insert(token, outcome.clone());
        }
    }

    let retry = submitted
        .iter()
        .zip(&result.outcomes)
        .filter(|(token, outcome)| outcome.is_transient() && !outcomes.is_final(token))
        .map(|(token, _)| token.clone())
        .collect();

    Ok(retry)
}
