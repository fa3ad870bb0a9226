//! Per-category bucket filling: generate, validate, accept, retry until the quota is met
//! or the attempt budget runs out.

use crate::exercise::{Category, CategoryQuota, Exercise, ValidationOutcome};
use crate::oracle::OracleAdapter;
use crate::progress::ProgressEmitter;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketState {
    Filling,
    Satisfied,
    Exhausted,
    /// Stopped at an iteration checkpoint because the caller went away.
    Cancelled,
}

/// Accumulator for one category while it is being filled.
#[derive(Debug)]
pub struct CategoryBucket {
    quota: CategoryQuota,
    max_attempts: usize,
    accepted: Vec<Exercise>,
    attempts: usize,
    rejected: usize,
    cancelled: bool,
}

impl CategoryBucket {
    pub fn new(quota: CategoryQuota, max_attempts: usize) -> Self {
        Self {
            quota,
            max_attempts,
            accepted: Vec::with_capacity(quota.quota),
            attempts: 0,
            rejected: 0,
            cancelled: false,
        }
    }

    pub fn category(&self) -> Category {
        self.quota.category
    }

    pub fn needed(&self) -> usize {
        self.quota.quota.saturating_sub(self.accepted.len())
    }

    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn accepted(&self) -> &[Exercise] {
        &self.accepted
    }

    pub fn state(&self) -> BucketState {
        if self.accepted.len() >= self.quota.quota {
            BucketState::Satisfied
        } else if self.cancelled {
            BucketState::Cancelled
        } else if self.attempts >= self.max_attempts {
            BucketState::Exhausted
        } else {
            BucketState::Filling
        }
    }

    pub fn record_attempt(&mut self) {
        self.attempts += 1;
    }

    /// Apply outcomes to candidates by position. Returns how many were accepted.
    ///
    /// A batch whose outcome count differs from its candidate count is rejected whole.
    /// Acceptance stops at the quota.
    pub fn absorb(&mut self, candidates: Vec<Exercise>, outcomes: &[ValidationOutcome]) -> usize {
        let category = self.category();
        if candidates.len() != outcomes.len() {
            warn!(
                category = %category,
                candidates = candidates.len(),
                outcomes = outcomes.len(),
                "validation misaligned with batch; rejecting all"
            );
            self.rejected += candidates.len();
            return 0;
        }
        let before = self.accepted.len();
        for (candidate, outcome) in candidates.into_iter().zip(outcomes) {
            if !outcome.is_valid {
                self.rejected += 1;
                info!(
                    category = %category,
                    reason = outcome.reason.as_deref().unwrap_or("unspecified"),
                    "rejected candidate"
                );
            } else if self.accepted.len() < self.quota.quota {
                self.accepted.push(candidate);
            } else {
                debug!(category = %category, "quota already met; discarding surplus candidate");
            }
        }
        self.accepted.len() - before
    }

    fn into_outcome(self) -> BucketOutcome {
        let state = self.state();
        BucketOutcome {
            category: self.quota.category,
            quota: self.quota.quota,
            attempts: self.attempts,
            rejected: self.rejected,
            state,
            accepted: self.accepted,
        }
    }
}

/// What a finished bucket hands back to the session.
#[derive(Debug, Clone)]
pub struct BucketOutcome {
    pub category: Category,
    pub quota: usize,
    pub accepted: Vec<Exercise>,
    pub attempts: usize,
    pub rejected: usize,
    pub state: BucketState,
}

/// Drives one [`CategoryBucket`] against the oracle adapter, reporting through the emitter.
pub struct BucketFiller<'a> {
    adapter: &'a OracleAdapter,
    emitter: &'a ProgressEmitter,
    max_attempts: usize,
}

impl<'a> BucketFiller<'a> {
    pub fn new(adapter: &'a OracleAdapter, emitter: &'a ProgressEmitter, max_attempts: usize) -> Self {
        Self {
            adapter,
            emitter,
            max_attempts,
        }
    }

    pub async fn fill(&self, topic: &str, quota: CategoryQuota) -> BucketOutcome {
        let mut bucket = CategoryBucket::new(quota, self.max_attempts);
        let category = quota.category;

        while bucket.state() == BucketState::Filling {
            if self.emitter.is_cancelled() {
                info!(category = %category, attempts = bucket.attempts(), "caller gone; stopping bucket");
                bucket.cancelled = true;
                break;
            }

            let needed = bucket.needed();
            if bucket.attempts() > 0 {
                self.emitter.status(format!(
                    "Retry {}/{}: Need {} more {}...",
                    bucket.attempts(),
                    self.max_attempts,
                    needed,
                    category
                ));
            }

            let candidates = self.adapter.generate(topic, category, needed).await;
            if candidates.is_empty() {
                bucket.record_attempt();
                continue;
            }
            // The whole batch is validated; `absorb` keeps valid items in order up to the quota.
            if candidates.len() > needed {
                debug!(
                    category = %category,
                    requested = needed,
                    returned = candidates.len(),
                    "oracle over-generated"
                );
            }

            self.emitter.status(format!(
                "Validating {} {} candidates...",
                candidates.len(),
                category
            ));
            let outcomes = self.adapter.validate(topic, &candidates).await;
            let accepted = bucket.absorb(candidates, &outcomes);
            bucket.record_attempt();
            debug!(
                category = %category,
                attempt = bucket.attempts(),
                accepted,
                total = bucket.accepted().len(),
                "batch absorbed"
            );
        }

        bucket.into_outcome()
    }
}
