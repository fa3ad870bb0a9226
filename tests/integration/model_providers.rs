//! LLM-backed oracle against a local chat-completions stand-in.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use exercise_forge::config::{ForgeConfig, ProviderSettings};
use exercise_forge::exercise::{mock_exercises, Category, Exercise};
use exercise_forge::generation::SessionExecutor;
use exercise_forge::oracle::{LlmOracleFactory, OracleFactory};
use exercise_forge::progress::{ProgressEmitter, SessionStatus};
use exercise_forge::provider::{ModelProvider, ProviderFactory, ProviderType};
use exercise_forge::review::AnswerCheck;
use serde_json::{json, Value};

const FAKE_KEY: &str = "sk-fake";

#[derive(Clone, Default)]
struct FakeCompletions {
    calls: Arc<AtomicUsize>,
}

fn user_prompt(body: &Value) -> &str {
    body["messages"]
        .as_array()
        .and_then(|messages| messages.iter().find(|m| m["role"] == "user"))
        .and_then(|m| m["content"].as_str())
        .unwrap_or_default()
}

fn between<'a>(text: &'a str, start: &str, end: &str) -> &'a str {
    let from = text.find(start).map(|i| i + start.len()).unwrap_or(0);
    let rest = &text[from..];
    &rest[..rest.find(end).unwrap_or(rest.len())]
}

fn content_for(body: &Value) -> Value {
    let prompt = user_prompt(body);
    match body["response_format"]["json_schema"]["name"].as_str() {
        Some("exercise_batch") => {
            let count: usize = between(prompt, "EXACTLY ", " ").parse().unwrap();
            let category: Category =
                serde_json::from_value(json!(between(prompt, "Type: \"", "\""))).unwrap();
            json!({ "exercises": mock_exercises(category, count) })
        }
        Some("validation_batch") => {
            let exercises: Vec<Exercise> =
                serde_json::from_str(between(prompt, "Exercises:\n", "\n\nCheck")).unwrap();
            let results: Vec<Value> = exercises
                .iter()
                .map(|_| json!({"is_valid": true, "reason": null}))
                .collect();
            json!({ "results": results })
        }
        Some("answer_verdict") => json!({"is_correct": false, "feedback": "Bijna goed!"}),
        _ => json!({"summary": "Goed gedaan.", "recommendations": "Oefen de kleuren."}),
    }
}

async fn chat_completions(
    State(fake): State<FakeCompletions>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    fake.calls.fetch_add(1, Ordering::SeqCst);
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", FAKE_KEY))
        .unwrap_or(false);
    if !authorized {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": {"message": "Incorrect API key provided"}})),
        ));
    }
    Ok(Json(json!({
        "id": "chatcmpl-test",
        "model": body["model"],
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content_for(&body).to_string()},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 10, "completion_tokens": 20, "total_tokens": 30}
    })))
}

async fn start_fake() -> (SocketAddr, FakeCompletions) {
    let fake = FakeCompletions::default();
    let app = Router::new()
        .route("/v1/chat/completions", post(chat_completions))
        .with_state(fake.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, fake)
}

fn factory_for(addr: SocketAddr) -> LlmOracleFactory {
    let mut config = ForgeConfig::default();
    config.provider = ProviderSettings {
        provider_type: ProviderType::OpenAI,
        model: "gpt-test".to_string(),
        endpoint: Some(format!("http://{}/v1", addr)),
        ..ProviderSettings::default()
    };
    LlmOracleFactory::from_config(&config).unwrap()
}

#[test]
fn test_provider_factory_names_clients() {
    let http = reqwest::Client::new();
    let openai = ProviderFactory::create_client(
        &ModelProvider::OpenAI {
            model: "gpt-4o".to_string(),
            api_key: "k".to_string(),
            base_url: None,
        },
        http.clone(),
    );
    assert_eq!(openai.provider_name(), "openai");
    assert_eq!(openai.model_name(), "gpt-4o");

    let local = ProviderFactory::create_client(
        &ModelProvider::LocalCustom {
            model: "llama3".to_string(),
            endpoint: "http://localhost:8080/v1".to_string(),
            api_key: None,
        },
        http,
    );
    assert_eq!(local.provider_name(), "local");
    assert_eq!(local.model_name(), "llama3");
}

#[tokio::test]
async fn full_session_over_the_wire() {
    let (addr, fake) = start_fake().await;
    let config = ForgeConfig::default();
    let adapter = config.oracle.adapter(factory_for(addr).oracle_for(FAKE_KEY));
    let (emitter, _rx) = ProgressEmitter::channel();

    let report = SessionExecutor::new(adapter, config.generation.plan())
        .run("Kleuren", &emitter)
        .await;

    assert_eq!(report.status, SessionStatus::Completed);
    assert_eq!(report.exercises.len(), 12);
    // one generation and one validation round-trip per category
    assert_eq!(fake.calls.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn rejected_credential_degrades_to_failure() {
    let (addr, _fake) = start_fake().await;
    let config = ForgeConfig::default();
    let adapter = config.oracle.adapter(factory_for(addr).oracle_for("sk-wrong"));
    let (emitter, _rx) = ProgressEmitter::channel();

    let report = SessionExecutor::new(adapter.clone(), config.generation.plan())
        .run("Kleuren", &emitter)
        .await;
    assert_eq!(report.status, SessionStatus::Failed);

    let verdict = adapter
        .check_answer(&AnswerCheck {
            question: "Wat is 'blue'?".to_string(),
            user_answer: "blauw".to_string(),
            correct_answer: "Blauw".to_string(),
        })
        .await;
    assert!(verdict.is_correct, "falls back to string comparison");
}

#[tokio::test]
async fn review_calls_use_the_oracle_when_it_answers() {
    let (addr, _fake) = start_fake().await;
    let config = ForgeConfig::default();
    let adapter = config.oracle.adapter(factory_for(addr).oracle_for(FAKE_KEY));

    let verdict = adapter
        .check_answer(&AnswerCheck {
            question: "Wat is 'red'?".to_string(),
            user_answer: "rod".to_string(),
            correct_answer: "rood".to_string(),
        })
        .await;
    assert!(!verdict.is_correct);
    assert_eq!(verdict.feedback, "Bijna goed!");

    let feedback = adapter
        .session_feedback(&json!([{"question": "q", "is_correct": true}]))
        .await;
    assert_eq!(feedback, "Goed gedaan.\n\nOefen de kleuren.");
}
