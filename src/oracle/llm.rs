//! LLM-backed oracle: prompts, structured output and response parsing.

use super::{schema, ExerciseOracle, OracleFactory};
use crate::config::{ForgeConfig, ProviderSettings};
use crate::error::ApiError;
use crate::exercise::{Category, Exercise, MatchingPair, ValidationOutcome};
use crate::provider::{
    build_provider_http_client, ChatMessage, CompletionOptions, ModelProvider,
    ModelProviderClient, ProviderFactory, ProviderType, ResponseFormat,
};
use crate::review::{AnswerCheck, AnswerVerdict, SessionFeedback};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const GENERATION_TEMPERATURE: f32 = 0.7;
const VALIDATION_TEMPERATURE: f32 = 0.1;
const CHECK_TEMPERATURE: f32 = 0.3;
const FEEDBACK_TEMPERATURE: f32 = 0.7;

const DEFAULT_LOCAL_ENDPOINT: &str = "http://localhost:8080/v1";

/// Language and level the prompts are written for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptSettings {
    pub target_language: String,
    pub level: String,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            target_language: "Dutch".to_string(),
            level: "A1/A2".to_string(),
        }
    }
}

#[derive(Deserialize)]
struct RawExercise {
    #[serde(default)]
    id: i64,
    question: String,
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    options: Option<Vec<String>>,
    #[serde(default)]
    pairs: Option<Vec<MatchingPair>>,
}

#[derive(Deserialize)]
struct ExerciseBatch {
    exercises: Vec<RawExercise>,
}

#[derive(Deserialize)]
struct ValidationBatch {
    results: Vec<ValidationOutcome>,
}

/// Oracle that talks to a chat-completion model.
pub struct LlmOracle {
    client: Arc<dyn ModelProviderClient>,
    prompts: PromptSettings,
}

impl LlmOracle {
    pub fn new(client: Arc<dyn ModelProviderClient>, prompts: PromptSettings) -> Self {
        Self { client, prompts }
    }

    async fn structured<T: DeserializeOwned>(
        &self,
        system: String,
        user: String,
        temperature: f32,
        schema_name: &str,
        schema: Value,
    ) -> Result<T, ApiError> {
        let response = self
            .client
            .complete(
                vec![ChatMessage::system(system), ChatMessage::user(user)],
                CompletionOptions::structured(
                    temperature,
                    ResponseFormat::strict_schema(schema_name, schema),
                ),
            )
            .await?;
        debug!(
            provider = self.client.provider_name(),
            model = %response.model,
            total_tokens = response.usage.total_tokens,
            schema = schema_name,
            "structured completion received"
        );
        serde_json::from_str(&response.content).map_err(|e| {
            ApiError::MalformedResponse(format!("{} does not match schema: {}", schema_name, e))
        })
    }
}

#[async_trait]
impl ExerciseOracle for LlmOracle {
    async fn generate_batch(
        &self,
        topic: &str,
        category: Category,
        count: usize,
    ) -> Result<Vec<Exercise>, ApiError> {
        let language = &self.prompts.target_language;
        let prompt = format!(
            "Generate EXACTLY {count} {language} exercises for topic \"{topic}\".\n\
             Type: \"{category}\".\n\
             Format: {hint}\n\
             Level: {level}. Native-like {language}.",
            hint = category.format_hint(),
            level = self.prompts.level,
        );
        let batch: ExerciseBatch = self
            .structured(
                format!(
                    "You are a native {language} tutor. You generate strictly structured exercises."
                ),
                prompt,
                GENERATION_TEMPERATURE,
                "exercise_batch",
                schema::exercise_batch(),
            )
            .await?;
        Ok(batch
            .exercises
            .into_iter()
            .map(|raw| Exercise {
                id: raw.id,
                category,
                question: raw.question,
                answer: raw.answer,
                options: raw.options,
                pairs: raw.pairs,
            })
            .collect())
    }

    async fn validate_batch(
        &self,
        topic: &str,
        candidates: &[Exercise],
    ) -> Result<Vec<ValidationOutcome>, ApiError> {
        let exercises_json = serde_json::to_string(candidates)?;
        let language = &self.prompts.target_language;
        let prompt = format!(
            "Review these {language} exercises for the topic \"{topic}\".\n\n\
             Exercises:\n{exercises_json}\n\n\
             Check each exercise for:\n\
             1. Strict Relevance: Is it clearly about \"{topic}\"?\n\
             2. Perfect Grammar: Is the {language} 100% correct?\n\
             3. Correct Answer: Is the answer accurate?\n\n\
             Return a validation result for EACH exercise in order."
        );
        let batch: ValidationBatch = self
            .structured(
                "You are a strict Quality Control Auditor. You validate each exercise individually."
                    .to_string(),
                prompt,
                VALIDATION_TEMPERATURE,
                "validation_batch",
                schema::validation_batch(),
            )
            .await?;
        Ok(batch.results)
    }

    async fn check_answer(&self, check: &AnswerCheck) -> Result<AnswerVerdict, ApiError> {
        let prompt = format!(
            "Question: \"{}\"\nCorrect Answer: \"{}\"\nUser Answer: \"{}\"\n\n\
             Evaluate the user's answer. Is it correct? (Ignore case and minor punctuation differences).\n\
             Provide specific feedback in {} or English (keep it encouraging).",
            check.question, check.correct_answer, check.user_answer, self.prompts.target_language
        );
        self.structured(
            format!(
                "You are a helpful {} language tutor.",
                self.prompts.target_language
            ),
            prompt,
            CHECK_TEMPERATURE,
            "answer_verdict",
            schema::answer_verdict(),
        )
        .await
    }

    async fn session_feedback(&self, results: &Value) -> Result<SessionFeedback, ApiError> {
        let language = &self.prompts.target_language;
        let prompt = format!(
            "Here are the results of a {language} practice session:\n{results}\n\n\
             Based on these results:\n\
             1. Write a brief summary of performance.\n\
             2. Provide specific study recommendations.\n\
             Talk directly to the user."
        );
        self.structured(
            format!("You are an encouraging {language} language coach."),
            prompt,
            FEEDBACK_TEMPERATURE,
            "session_feedback",
            schema::session_feedback(),
        )
        .await
    }
}

/// Builds [`LlmOracle`]s for caller credentials over one shared HTTP client.
pub struct LlmOracleFactory {
    http: Client,
    provider_type: ProviderType,
    model: String,
    endpoint: Option<String>,
    prompts: PromptSettings,
}

impl LlmOracleFactory {
    pub fn new(http: Client, settings: &ProviderSettings, prompts: PromptSettings) -> Self {
        Self {
            http,
            provider_type: settings.provider_type,
            model: settings.model.clone(),
            endpoint: settings.endpoint.clone(),
            prompts,
        }
    }

    pub fn from_config(config: &ForgeConfig) -> Result<Self, ApiError> {
        let http = build_provider_http_client(
            Duration::from_secs(config.provider.connect_timeout_secs),
            Duration::from_secs(config.provider.request_timeout_secs),
        )?;
        Ok(Self::new(
            http,
            &config.provider,
            config.oracle.prompt_settings(),
        ))
    }

    fn model_provider(&self, credential: &str) -> ModelProvider {
        match self.provider_type {
            ProviderType::OpenAI => ModelProvider::OpenAI {
                model: self.model.clone(),
                api_key: credential.to_string(),
                base_url: self.endpoint.clone(),
            },
            ProviderType::LocalCustom => ModelProvider::LocalCustom {
                model: self.model.clone(),
                endpoint: self
                    .endpoint
                    .clone()
                    .unwrap_or_else(|| DEFAULT_LOCAL_ENDPOINT.to_string()),
                api_key: Some(credential.to_string()),
            },
        }
    }
}

impl OracleFactory for LlmOracleFactory {
    fn oracle_for(&self, credential: &str) -> Arc<dyn ExerciseOracle> {
        let client = ProviderFactory::create_client(&self.model_provider(credential), self.http.clone());
        Arc::new(LlmOracle::new(Arc::from(client), self.prompts.clone()))
    }
}
