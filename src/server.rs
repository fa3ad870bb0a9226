//! HTTP transport: generation streamed as newline-delimited JSON, answer checks, session
//! feedback and client error logging.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::header::{self, HeaderName};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use crate::config::{ForgeConfig, OracleSettings};
use crate::generation::{GenerationPlan, SessionExecutor};
use crate::oracle::{OracleAdapter, OracleFactory};
use crate::progress::{ProgressEmitter, ProgressEvent};
use crate::review::AnswerCheck;

pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";
pub const SESSION_ABORTED_MESSAGE: &str = "Server Error: generation aborted";

/// Shared by every request. Holds no per-session state.
#[derive(Clone)]
pub struct AppState {
    factory: Arc<dyn OracleFactory>,
    oracle: OracleSettings,
    plan: GenerationPlan,
}

impl AppState {
    pub fn new(factory: Arc<dyn OracleFactory>, config: &ForgeConfig) -> Self {
        Self {
            factory,
            oracle: config.oracle.clone(),
            plan: config.generation.plan(),
        }
    }

    fn adapter_for(&self, credential: &str) -> OracleAdapter {
        self.oracle.adapter(self.factory.oracle_for(credential))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default, alias = "credential")]
    pub api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CheckRequest {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub user_answer: Option<String>,
    #[serde(default)]
    pub correct_answer: Option<String>,
    #[serde(default, alias = "credential")]
    pub api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FeedbackRequest {
    #[serde(default)]
    pub results: Option<Value>,
    #[serde(default, alias = "credential")]
    pub api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ClientErrorReport {
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    stack: Option<Value>,
    #[serde(default, rename = "componentStack")]
    component_stack: Option<Value>,
}

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/generate", post(generate_exercises))
        .route("/api/generate/", post(generate_exercises))
        .route("/api/check", post(check_answer))
        .route("/api/check/", post(check_answer))
        .route("/api/feedback", post(session_feedback))
        .route("/api/feedback/", post(session_feedback))
        .route("/api/log_error", post(log_client_error))
        .route("/api/log_error/", post(log_client_error))
        .layer(cors)
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let app = app_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "exercise server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("exercise server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Answers are passed on verbatim; only an absent or empty string counts as missing.
fn given(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}

async fn generate_exercises(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Response {
    let (Some(topic), Some(credential)) = (present(&request.topic), present(&request.api_key))
    else {
        return bad_request("Topic and API Key are required");
    };

    let executor = SessionExecutor::new(state.adapter_for(credential), state.plan.clone());
    let (emitter, receiver) = ProgressEmitter::channel();
    spawn_session(executor, topic.to_string(), emitter);

    let lines = UnboundedReceiverStream::new(receiver)
        .map(|event| Ok::<_, Infallible>(event.to_ndjson()));
    (
        [
            (header::CONTENT_TYPE, NDJSON_CONTENT_TYPE),
            (HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        Body::from_stream(lines),
    )
        .into_response()
}

/// Run one session detached from the request. If the task dies before the stream was
/// closed with a terminal event, a final error line is sent in its place.
fn spawn_session(executor: SessionExecutor, topic: String, emitter: ProgressEmitter) {
    let watchdog = emitter.clone();
    let task = tokio::spawn(async move { executor.run(&topic, &emitter).await });
    tokio::spawn(async move {
        match task.await {
            Ok(report) => info!(
                session_id = %report.session_id,
                status = report.status.as_str(),
                exercises = report.exercises.len(),
                "generation request finished"
            ),
            Err(err) => {
                error!(error = %err, "generation task aborted");
                if !watchdog.is_terminated() {
                    watchdog.emit_best_effort(ProgressEvent::error(SESSION_ABORTED_MESSAGE));
                }
            }
        }
    });
}

async fn check_answer(
    State(state): State<AppState>,
    Json(request): Json<CheckRequest>,
) -> Response {
    let (Some(question), Some(user_answer), Some(correct_answer)) = (
        given(&request.question),
        given(&request.user_answer),
        given(&request.correct_answer),
    ) else {
        return bad_request("Missing required fields");
    };
    let Some(credential) = present(&request.api_key) else {
        return bad_request("API Key is required");
    };

    let check = AnswerCheck {
        question: question.to_string(),
        user_answer: user_answer.to_string(),
        correct_answer: correct_answer.to_string(),
    };
    let verdict = state.adapter_for(credential).check_answer(&check).await;
    Json(verdict).into_response()
}

fn has_results(results: &Option<Value>) -> bool {
    match results {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::Bool(true)) => true,
        Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(fields)) => !fields.is_empty(),
        Some(Value::String(text)) => !text.is_empty(),
    }
}

async fn session_feedback(
    State(state): State<AppState>,
    Json(request): Json<FeedbackRequest>,
) -> Response {
    let Some(credential) = present(&request.api_key).filter(|_| has_results(&request.results))
    else {
        return bad_request("Missing results or API key");
    };
    let results = request.results.unwrap_or(Value::Null);
    let feedback = state.adapter_for(credential).session_feedback(&results).await;
    Json(json!({ "feedback": feedback })).into_response()
}

// Accepts any body: a broken report is still worth a log line.
async fn log_client_error(body: Bytes) -> Json<Value> {
    let report: ClientErrorReport = serde_json::from_slice(&body).unwrap_or_default();
    let message = report.error.unwrap_or(Value::Null);
    let stack = report.stack.unwrap_or(Value::Null);
    let component_stack = report.component_stack.unwrap_or(Value::Null);
    error!(
        error = %message,
        stack = %stack,
        component_stack = %component_stack,
        "FRONTEND ERROR"
    );
    Json(json!({ "status": "logged" }))
}
