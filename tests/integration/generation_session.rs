//! End-to-end generation sessions against scripted oracles.

use std::sync::Arc;

use exercise_forge::config::ForgeConfig;
use exercise_forge::error::ApiError;
use exercise_forge::exercise::{mock_exercises, Category, ValidationOutcome};
use exercise_forge::generation::{BucketState, GenerationPlan, SessionExecutor, NO_EXERCISES_MESSAGE};
use exercise_forge::oracle::OracleAdapter;
use exercise_forge::progress::{drain, ProgressEmitter, ProgressEvent, SessionStatus};

use crate::integration::StubOracle;

fn executor(oracle: Arc<StubOracle>) -> SessionExecutor {
    SessionExecutor::new(OracleAdapter::new(oracle), GenerationPlan::default())
}

#[tokio::test]
async fn colors_session_fills_every_bucket_first_try() {
    let oracle = StubOracle::cooperative();
    let (emitter, mut rx) = ProgressEmitter::channel();

    let report = executor(oracle.clone()).run("Colors", &emitter).await;
    let events = drain(&mut rx);

    assert_eq!(report.status, SessionStatus::Completed);
    assert_eq!(oracle.request_count(), 3);
    assert!(report
        .categories
        .iter()
        .all(|c| c.accepted == 4 && c.attempts == 1 && c.state == BucketState::Satisfied));

    let results: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, ProgressEvent::Result { .. }))
        .collect();
    assert_eq!(results.len(), 1);
    assert!(!events.iter().any(|e| matches!(e, ProgressEvent::Error { .. })));
    assert!(!events.iter().any(|e| matches!(
        e,
        ProgressEvent::Status { message } if message.starts_with("Retry")
    )));

    let ProgressEvent::Result { exercises } = results[0] else {
        unreachable!()
    };
    assert_eq!(exercises.len(), 12);
    for category in Category::ALL {
        assert_eq!(exercises.iter().filter(|e| e.category == category).count(), 4);
    }
}

#[tokio::test]
async fn barren_oracle_exhausts_every_bucket() {
    let oracle = StubOracle::barren();
    let (emitter, mut rx) = ProgressEmitter::channel();

    let report = executor(oracle.clone()).run("Colors", &emitter).await;
    let events = drain(&mut rx);

    assert_eq!(report.status, SessionStatus::Failed);
    assert_eq!(oracle.request_count(), 15);
    assert!(report
        .categories
        .iter()
        .all(|c| c.attempts == 5 && c.state == BucketState::Exhausted));
    assert_eq!(events.last(), Some(&ProgressEvent::error(NO_EXERCISES_MESSAGE)));
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
}

#[tokio::test]
async fn over_generation_never_exceeds_quota() {
    let oracle = StubOracle::new(
        |category, count| Ok(mock_exercises(category, count * 3)),
        |candidates| Ok(vec![ValidationOutcome::valid(); candidates.len()]),
    );
    let (emitter, _rx) = ProgressEmitter::channel();

    let report = executor(oracle).run("Getallen", &emitter).await;
    assert_eq!(report.exercises.len(), 12);
    assert!(report.categories.iter().all(|c| c.accepted == c.quota));
}

#[tokio::test]
async fn failing_validator_accepts_everything() {
    let oracle = StubOracle::new(
        |category, count| Ok(mock_exercises(category, count)),
        |_| Err(ApiError::ProviderRateLimit("slow down".to_string())),
    );
    let (emitter, _rx) = ProgressEmitter::channel();

    let report = executor(oracle).run("Eten", &emitter).await;
    assert_eq!(report.status, SessionStatus::Completed);
    assert_eq!(report.exercises.len(), 12);
}

#[tokio::test]
async fn fault_injection_topic_yields_mock_session() {
    let oracle = StubOracle::new(
        |_, _| Err(ApiError::ProviderAuthFailed("invalid key".to_string())),
        |_| Err(ApiError::ProviderAuthFailed("invalid key".to_string())),
    );
    let config = ForgeConfig::default();
    let adapter = config.oracle.adapter(oracle.clone());
    let plan = config.generation.plan();
    let (emitter, mut rx) = ProgressEmitter::channel();

    let report = SessionExecutor::new(adapter.clone(), plan.clone())
        .run("TEST_CRASH", &emitter)
        .await;
    assert_eq!(report.status, SessionStatus::Completed);
    assert!(matches!(
        drain(&mut rx).last(),
        Some(ProgressEvent::Result { exercises }) if exercises.len() == 12
    ));

    let (emitter, _rx) = ProgressEmitter::channel();
    let report = SessionExecutor::new(adapter, plan)
        .run("Kleuren", &emitter)
        .await;
    assert_eq!(report.status, SessionStatus::Failed);
}

#[tokio::test]
async fn concurrent_sessions_do_not_share_state() {
    let cooperative = executor(StubOracle::cooperative());
    let barren = executor(StubOracle::barren());
    let (ok_emitter, mut ok_rx) = ProgressEmitter::channel();
    let (bad_emitter, mut bad_rx) = ProgressEmitter::channel();

    let (ok, bad) = tokio::join!(
        cooperative.run("Colors", &ok_emitter),
        barren.run("Colors", &bad_emitter)
    );

    assert_eq!(ok.status, SessionStatus::Completed);
    assert_eq!(bad.status, SessionStatus::Failed);
    assert_ne!(ok.session_id, bad.session_id);
    assert!(matches!(drain(&mut ok_rx).last(), Some(ProgressEvent::Result { .. })));
    assert!(matches!(drain(&mut bad_rx).last(), Some(ProgressEvent::Error { .. })));
}
