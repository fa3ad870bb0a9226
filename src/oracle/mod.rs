//! Oracle boundary.
//!
//! [`ExerciseOracle`] is the raw, fallible contract of the external content services.
//! [`OracleAdapter`] wraps one and never fails: generation degrades to an empty batch (or
//! deterministic mocks under the fault-injection topic), validation fails open, answer
//! checks and session feedback fall back to local answers. Failure detail goes to the log.

mod llm;
mod schema;

pub use llm::{LlmOracle, LlmOracleFactory, PromptSettings};

use crate::error::ApiError;
use crate::exercise::{mock_exercises, Category, Exercise, ValidationOutcome};
use crate::review::{
    fallback_verdict, AnswerCheck, AnswerVerdict, SessionFeedback, FALLBACK_SESSION_FEEDBACK,
};
use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Reason attached to candidates accepted because validation was unavailable.
pub const VALIDATION_SKIP_REASON: &str = "Validation Error Skip";

/// Reason attached to every candidate of a batch whose validation did not line up.
pub const VALIDATION_MISMATCH_REASON: &str = "Validation result count mismatch";

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(90);

/// External content services. Implementations may fail in any way; callers go through
/// [`OracleAdapter`].
#[async_trait]
pub trait ExerciseOracle: Send + Sync {
    async fn generate_batch(
        &self,
        topic: &str,
        category: Category,
        count: usize,
    ) -> Result<Vec<Exercise>, ApiError>;

    /// One outcome per candidate, in input order.
    async fn validate_batch(
        &self,
        topic: &str,
        candidates: &[Exercise],
    ) -> Result<Vec<ValidationOutcome>, ApiError>;

    async fn check_answer(&self, _check: &AnswerCheck) -> Result<AnswerVerdict, ApiError> {
        Err(ApiError::ProviderError(
            "answer checking not supported by this oracle".to_string(),
        ))
    }

    async fn session_feedback(&self, _results: &Value) -> Result<SessionFeedback, ApiError> {
        Err(ApiError::ProviderError(
            "session feedback not supported by this oracle".to_string(),
        ))
    }
}

/// Builds an oracle bound to a caller-supplied credential.
pub trait OracleFactory: Send + Sync {
    fn oracle_for(&self, credential: &str) -> Arc<dyn ExerciseOracle>;
}

/// Infallible, timeout-bounded front of an [`ExerciseOracle`]. Cheap to clone.
#[derive(Clone)]
pub struct OracleAdapter {
    oracle: Arc<dyn ExerciseOracle>,
    call_timeout: Duration,
    fault_injection_topic: Option<String>,
}

impl OracleAdapter {
    pub fn new(oracle: Arc<dyn ExerciseOracle>) -> Self {
        Self {
            oracle,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            fault_injection_topic: None,
        }
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn with_fault_injection_topic(mut self, topic: Option<String>) -> Self {
        self.fault_injection_topic = topic;
        self
    }

    /// At most `count` candidates, all tagged with `category` and conforming to its shape.
    pub async fn generate(&self, topic: &str, category: Category, count: usize) -> Vec<Exercise> {
        if count == 0 {
            return Vec::new();
        }
        let started = Instant::now();
        match self
            .bounded(self.oracle.generate_batch(topic, category, count))
            .await
        {
            Ok(batch) => {
                let returned = batch.len();
                let conforming = conform_batch(batch, category);
                debug!(
                    category = %category,
                    requested = count,
                    returned,
                    conforming = conforming.len(),
                    duration_ms = started.elapsed().as_millis(),
                    "generation batch received"
                );
                conforming
            }
            Err(err) => {
                warn!(category = %category, error = %err, "batch generation failed");
                if self.fault_injection_topic.as_deref() == Some(topic) {
                    info!(category = %category, count, "returning mock exercises for fault-injection topic");
                    return mock_exercises(category, count);
                }
                Vec::new()
            }
        }
    }

    /// One outcome per candidate. Fails open when the oracle is unavailable and closed
    /// when it answers with the wrong number of results.
    pub async fn validate(&self, topic: &str, candidates: &[Exercise]) -> Vec<ValidationOutcome> {
        if candidates.is_empty() {
            return Vec::new();
        }
        match self
            .bounded(self.oracle.validate_batch(topic, candidates))
            .await
        {
            Ok(outcomes) if outcomes.len() == candidates.len() => outcomes,
            Ok(outcomes) => {
                let err = ApiError::ValidationMismatch {
                    expected: candidates.len(),
                    actual: outcomes.len(),
                };
                warn!(error = %err, "rejecting batch");
                vec![ValidationOutcome::invalid(VALIDATION_MISMATCH_REASON); candidates.len()]
            }
            Err(err) => {
                warn!(error = %err, candidates = candidates.len(), "batch validation failed; accepting batch unvalidated");
                vec![
                    ValidationOutcome {
                        is_valid: true,
                        reason: Some(VALIDATION_SKIP_REASON.to_string()),
                    };
                    candidates.len()
                ]
            }
        }
    }

    pub async fn check_answer(&self, check: &AnswerCheck) -> AnswerVerdict {
        match self.bounded(self.oracle.check_answer(check)).await {
            Ok(verdict) => verdict,
            Err(err) => {
                warn!(error = %err, "answer check failed; using string comparison");
                fallback_verdict(&check.user_answer, &check.correct_answer)
            }
        }
    }

    pub async fn session_feedback(&self, results: &Value) -> String {
        match self.bounded(self.oracle.session_feedback(results)).await {
            Ok(feedback) => feedback.message(),
            Err(err) => {
                warn!(error = %err, "session feedback failed; using generic message");
                FALLBACK_SESSION_FEEDBACK.to_string()
            }
        }
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, ApiError>>,
    ) -> Result<T, ApiError> {
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::ProviderTimeout(self.call_timeout.as_millis())),
        }
    }
}

fn conform_batch(batch: Vec<Exercise>, category: Category) -> Vec<Exercise> {
    batch
        .into_iter()
        .map(|mut exercise| {
            exercise.category = category;
            exercise
        })
        .filter(|exercise| match category.shape().check(exercise) {
            Ok(()) => true,
            Err(violation) => {
                warn!(category = %category, id = exercise.id, violation = %violation, "dropping malformed candidate");
                false
            }
        })
        .collect()
}
