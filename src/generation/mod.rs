//! Exercise generation: per-category bucket filling and the session that sequences it.

pub mod bucket;
pub mod executor;
pub mod plan;

pub use bucket::{BucketFiller, BucketOutcome, BucketState, CategoryBucket};
pub use executor::{CategoryReport, SessionExecutor, SessionReport, NO_EXERCISES_MESSAGE};
pub use plan::{GenerationPlan, DEFAULT_MAX_ATTEMPTS};
