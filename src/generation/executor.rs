//! Session executor: fills each category bucket in plan order and closes the stream with
//! exactly one terminal event.

use crate::exercise::{Category, Exercise};
use crate::generation::bucket::{BucketFiller, BucketOutcome, BucketState};
use crate::generation::plan::GenerationPlan;
use crate::oracle::OracleAdapter;
use crate::progress::{new_session_id, ProgressEmitter, ProgressEvent, SessionStatus};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{info, info_span, warn, Instrument};

pub const NO_EXERCISES_MESSAGE: &str =
    "Failed to generate any valid exercises. Please try a different topic.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryReport {
    pub category: Category,
    pub quota: usize,
    pub accepted: usize,
    pub attempts: usize,
    pub rejected: usize,
    pub state: BucketState,
}

impl From<&BucketOutcome> for CategoryReport {
    fn from(outcome: &BucketOutcome) -> Self {
        Self {
            category: outcome.category,
            quota: outcome.quota,
            accepted: outcome.accepted.len(),
            attempts: outcome.attempts,
            rejected: outcome.rejected,
            state: outcome.state,
        }
    }
}

/// Summary of one finished session. The exercises are the ones delivered in the `result`
/// event, if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_id: String,
    pub topic: String,
    pub status: SessionStatus,
    pub categories: Vec<CategoryReport>,
    pub exercises: Vec<Exercise>,
}

impl SessionReport {
    pub fn total_target(&self) -> usize {
        self.categories.iter().map(|c| c.quota).sum()
    }
}

/// Runs generation sessions against one oracle adapter.
pub struct SessionExecutor {
    adapter: OracleAdapter,
    plan: GenerationPlan,
}

impl SessionExecutor {
    pub fn new(adapter: OracleAdapter, plan: GenerationPlan) -> Self {
        Self { adapter, plan }
    }

    pub async fn run(&self, topic: &str, emitter: &ProgressEmitter) -> SessionReport {
        let session_id = new_session_id();
        let span = info_span!("generation_session", session_id = %session_id, topic = %topic);
        self.run_inner(session_id, topic, emitter)
            .instrument(span)
            .await
    }

    async fn run_inner(
        &self,
        session_id: String,
        topic: &str,
        emitter: &ProgressEmitter,
    ) -> SessionReport {
        let started = Instant::now();
        info!(categories = self.plan.categories.len(), target = self.plan.total_target(), "session started");
        emitter.status("Initializing generation...");

        let filler = BucketFiller::new(&self.adapter, emitter, self.plan.max_attempts);
        let mut categories = Vec::with_capacity(self.plan.categories.len());
        let mut exercises: Vec<Exercise> = Vec::new();
        let mut cancelled = false;

        for quota in &self.plan.categories {
            if emitter.is_cancelled() {
                cancelled = true;
                break;
            }
            emitter.status(format!(
                "Generating {} {} exercises...",
                quota.quota,
                quota.category.label()
            ));

            let outcome = filler.fill(topic, *quota).await;
            categories.push(CategoryReport::from(&outcome));
            match outcome.state {
                BucketState::Satisfied => emitter.status(format!(
                    "Successfully generated {} {} exercises.",
                    outcome.quota, outcome.category
                )),
                BucketState::Cancelled => {
                    cancelled = true;
                    break;
                }
                _ => {
                    warn!(
                        category = %outcome.category,
                        accepted = outcome.accepted.len(),
                        quota = outcome.quota,
                        attempts = outcome.attempts,
                        "quota not met"
                    );
                    emitter.status(format!(
                        "Warning: Could not generate full {} {} exercises.",
                        outcome.quota, outcome.category
                    ));
                }
            }
            exercises.extend(outcome.accepted);
        }

        let target = self.plan.total_target();
        let status = if cancelled {
            info!(collected = exercises.len(), "session cancelled by caller");
            SessionStatus::Cancelled
        } else if exercises.is_empty() {
            emitter.emit_best_effort(ProgressEvent::error(NO_EXERCISES_MESSAGE));
            SessionStatus::Failed
        } else {
            renumber(&mut exercises);
            if exercises.len() < target {
                info!("Generated partial session: {}/{}", exercises.len(), target);
            }
            emitter.emit_best_effort(ProgressEvent::Result {
                exercises: exercises.clone(),
            });
            if exercises.len() < target {
                SessionStatus::Partial
            } else {
                SessionStatus::Completed
            }
        };

        info!(
            status = status.as_str(),
            delivered = exercises.len(),
            target,
            duration_ms = started.elapsed().as_millis(),
            "session finished"
        );

        SessionReport {
            session_id,
            topic: topic.to_string(),
            status,
            categories,
            exercises: if status == SessionStatus::Cancelled {
                Vec::new()
            } else {
                exercises
            },
        }
    }
}

/// Ids in a delivered result run 1..=N in result order.
fn renumber(exercises: &mut [Exercise]) {
    for (index, exercise) in exercises.iter_mut().enumerate() {
        exercise.id = index as i64 + 1;
    }
}
