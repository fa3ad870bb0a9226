//! CLI route: single route table and run context. Dispatches to the generation core, the
//! oracle adapter and the HTTP server.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::cli::parse::{Commands, ConfigCommands};
use crate::config::{ConfigLoader, ForgeConfig};
use crate::error::ApiError;
use crate::generation::SessionExecutor;
use crate::oracle::{LlmOracleFactory, OracleAdapter, OracleFactory};
use crate::progress::{ProgressEmitter, ProgressEvent};
use crate::review::AnswerCheck;
use crate::server::{serve, AppState};

/// Exit code returned when a command ran but its outcome was a failure.
pub const EXIT_FAILURE: i32 = 1;

/// Runtime context for CLI execution: effective config and the oracle factory.
pub struct RunContext {
    config: ForgeConfig,
    factory: Arc<dyn OracleFactory>,
}

impl RunContext {
    /// Load config (explicit file or layered sources) and build the LLM oracle factory.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = match config_path {
            Some(path) => ConfigLoader::load_from_file(&path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        let factory = Arc::new(LlmOracleFactory::from_config(&config)?);
        Ok(Self::with_factory(config, factory))
    }

    pub fn with_factory(config: ForgeConfig, factory: Arc<dyn OracleFactory>) -> Self {
        Self { config, factory }
    }

    pub fn config(&self) -> &ForgeConfig {
        &self.config
    }

    /// Run a command, writing its user-facing output to `out`. Returns the process exit code.
    pub async fn execute(&self, command: &Commands, out: &mut dyn Write) -> Result<i32, ApiError> {
        match command {
            Commands::Config { command } => self.handle_config(command, out),
            Commands::Serve { bind } => {
                self.config.ensure_valid()?;
                self.handle_serve(bind.as_deref()).await
            }
            Commands::Generate { topic, api_key } => {
                self.config.ensure_valid()?;
                self.handle_generate(topic, api_key.as_deref(), out).await
            }
            Commands::Check {
                question,
                user_answer,
                correct_answer,
                api_key,
            } => {
                let adapter = self.adapter(api_key.as_deref())?;
                let verdict = adapter
                    .check_answer(&AnswerCheck {
                        question: question.clone(),
                        user_answer: user_answer.clone(),
                        correct_answer: correct_answer.clone(),
                    })
                    .await;
                writeln!(out, "{}", serde_json::to_string_pretty(&verdict)?)?;
                Ok(0)
            }
            Commands::Feedback { results, api_key } => {
                let results: Value = serde_json::from_str(results).map_err(|e| {
                    ApiError::InvalidRequest(format!("results must be JSON: {}", e))
                })?;
                let adapter = self.adapter(api_key.as_deref())?;
                writeln!(out, "{}", adapter.session_feedback(&results).await)?;
                Ok(0)
            }
        }
    }

    fn adapter(&self, api_key: Option<&str>) -> Result<OracleAdapter, ApiError> {
        let credential = api_key
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ApiError::InvalidRequest("API Key is required".to_string()))?;
        Ok(self.config.oracle.adapter(self.factory.oracle_for(credential)))
    }

    fn handle_config(&self, command: &ConfigCommands, out: &mut dyn Write) -> Result<i32, ApiError> {
        match command {
            ConfigCommands::Show => {
                let text = toml::to_string_pretty(&self.config)
                    .map_err(|e| ApiError::ConfigError(format!("Failed to render config: {}", e)))?;
                write!(out, "{}", text)?;
                Ok(0)
            }
            ConfigCommands::Validate => match self.config.validate() {
                Ok(()) => {
                    writeln!(out, "Configuration is valid")?;
                    Ok(0)
                }
                Err(errors) => {
                    for error in errors {
                        writeln!(out, "{}", error)?;
                    }
                    Ok(EXIT_FAILURE)
                }
            },
        }
    }

    async fn handle_serve(&self, bind: Option<&str>) -> Result<i32, ApiError> {
        let mut server = self.config.server.clone();
        if let Some(bind) = bind {
            server.bind = bind.to_string();
        }
        let addr = server.socket_addr()?;
        let state = AppState::new(self.factory.clone(), &self.config);
        serve(addr, state)
            .await
            .map_err(|e| ApiError::ServerError(e.to_string()))?;
        Ok(0)
    }

    /// Stream one session to `out` as it runs. Exit code 1 when it ended in `error`.
    async fn handle_generate(
        &self,
        topic: &str,
        api_key: Option<&str>,
        out: &mut dyn Write,
    ) -> Result<i32, ApiError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(ApiError::InvalidRequest(
                "Topic and API Key are required".to_string(),
            ));
        }
        let adapter = self.adapter(api_key).map_err(|_| {
            ApiError::InvalidRequest("Topic and API Key are required".to_string())
        })?;

        let executor = SessionExecutor::new(adapter, self.config.generation.plan());
        let (emitter, mut receiver) = ProgressEmitter::channel();
        let session_topic = topic.to_string();
        let session =
            tokio::spawn(async move { executor.run(&session_topic, &emitter).await });

        let mut failed = false;
        while let Some(event) = receiver.recv().await {
            failed |= matches!(event, ProgressEvent::Error { .. });
            out.write_all(event.to_ndjson().as_bytes())?;
            out.flush()?;
        }

        let report = session
            .await
            .map_err(|e| ApiError::GenerationFailed(format!("session task aborted: {}", e)))?;
        info!(
            session_id = %report.session_id,
            status = report.status.as_str(),
            exercises = report.exercises.len(),
            "generate command finished"
        );
        Ok(if failed { EXIT_FAILURE } else { 0 })
    }
}
