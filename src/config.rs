//! Configuration System
//!
//! Layered configuration built on the `config` crate. Precedence, lowest to highest:
//! built-in defaults, the global user file, workspace files (`config/config.toml`, then
//! `config/{FORGE_ENV}.toml`), then `FORGE__SECTION__KEY` environment variables.

use crate::error::ApiError;
use crate::exercise::{default_quotas, CategoryQuota};
use crate::generation::{GenerationPlan, DEFAULT_MAX_ATTEMPTS};
use crate::logging::{validate_logging_config, LoggingConfig};
use crate::oracle::{ExerciseOracle, OracleAdapter, PromptSettings, DEFAULT_CALL_TIMEOUT};
use crate::provider::{ProviderType, PROVIDER_HTTP_CONNECT_TIMEOUT, PROVIDER_HTTP_REQUEST_TIMEOUT};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

mod merge {
    pub mod merge_policy;
}

mod sources {
    pub mod global_file;
    pub mod workspace_file;
}

pub const DEFAULT_BIND: &str = "127.0.0.1:8000";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini-2024-07-18";
pub const DEFAULT_FAULT_INJECTION_TOPIC: &str = "TEST_CRASH";
pub const ENV_PREFIX: &str = "FORGE";

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForgeConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub provider: ProviderSettings,

    #[serde(default)]
    pub oracle: OracleSettings,

    #[serde(default)]
    pub generation: GenerationSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address, `host:port`
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ApiError> {
        self.bind
            .parse()
            .map_err(|e| ApiError::ConfigError(format!("Invalid bind address '{}': {}", self.bind, e)))
    }
}

/// Which chat-completion backend the oracle talks to. The credential is never configured
/// here; it arrives with each request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_provider_type")]
    pub provider_type: ProviderType,

    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL override (OpenAI) or server endpoint (local)
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_provider_type() -> ProviderType {
    ProviderType::OpenAI
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_connect_timeout_secs() -> u64 {
    PROVIDER_HTTP_CONNECT_TIMEOUT.as_secs()
}

fn default_request_timeout_secs() -> u64 {
    PROVIDER_HTTP_REQUEST_TIMEOUT.as_secs()
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            provider_type: default_provider_type(),
            model: default_model(),
            endpoint: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ProviderSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("Model name cannot be empty".to_string());
        }
        if let Some(endpoint) = &self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(format!("Endpoint must be an http(s) URL: {}", endpoint));
            }
        }
        if self.connect_timeout_secs == 0 || self.request_timeout_secs == 0 {
            return Err("HTTP timeouts must be at least one second".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleSettings {
    /// Upper bound on any single oracle call
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,

    /// Topic that turns generation failures into mock exercises. Empty disables it.
    #[serde(default = "default_fault_injection_topic")]
    pub fault_injection_topic: String,

    #[serde(default = "default_target_language")]
    pub target_language: String,

    #[serde(default = "default_level")]
    pub level: String,
}

fn default_call_timeout_secs() -> u64 {
    DEFAULT_CALL_TIMEOUT.as_secs()
}

fn default_fault_injection_topic() -> String {
    DEFAULT_FAULT_INJECTION_TOPIC.to_string()
}

fn default_target_language() -> String {
    PromptSettings::default().target_language
}

fn default_level() -> String {
    PromptSettings::default().level
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            call_timeout_secs: default_call_timeout_secs(),
            fault_injection_topic: default_fault_injection_topic(),
            target_language: default_target_language(),
            level: default_level(),
        }
    }
}

impl OracleSettings {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    pub fn fault_injection_topic(&self) -> Option<String> {
        let topic = self.fault_injection_topic.trim();
        (!topic.is_empty()).then(|| topic.to_string())
    }

    pub fn prompt_settings(&self) -> PromptSettings {
        PromptSettings {
            target_language: self.target_language.clone(),
            level: self.level.clone(),
        }
    }

    /// Wrap a raw oracle with this section's timeout and fault-injection topic.
    pub fn adapter(&self, oracle: Arc<dyn ExerciseOracle>) -> OracleAdapter {
        OracleAdapter::new(oracle)
            .with_call_timeout(self.call_timeout())
            .with_fault_injection_topic(self.fault_injection_topic())
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.call_timeout_secs == 0 {
            return Err("call_timeout_secs must be at least 1".to_string());
        }
        if self.target_language.trim().is_empty() {
            return Err("target_language cannot be empty".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationSettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    /// Processed in list order
    #[serde(default = "default_quotas")]
    pub categories: Vec<CategoryQuota>,
}

fn default_max_attempts() -> usize {
    DEFAULT_MAX_ATTEMPTS
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            categories: default_quotas(),
        }
    }
}

impl GenerationSettings {
    pub fn plan(&self) -> GenerationPlan {
        GenerationPlan::new(self.categories.clone(), self.max_attempts)
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Server(String),
    Provider(String),
    Oracle(String),
    Generation(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Server(msg) => write!(f, "Server: {}", msg),
            ValidationError::Provider(msg) => write!(f, "Provider: {}", msg),
            ValidationError::Oracle(msg) => write!(f, "Oracle: {}", msg),
            ValidationError::Generation(msg) => write!(f, "Generation: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ForgeConfig {
    /// Validate the entire configuration, collecting every problem
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.server.socket_addr() {
            errors.push(ValidationError::Server(e.to_string()));
        }
        if let Err(e) = self.provider.validate() {
            errors.push(ValidationError::Provider(e));
        }
        if let Err(e) = self.oracle.validate() {
            errors.push(ValidationError::Oracle(e));
        }
        if let Err(e) = self.generation.plan().validate() {
            errors.push(ValidationError::Generation(e.to_string()));
        }
        if let Err(e) = validate_logging_config(&self.logging) {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Like [`ForgeConfig::validate`], folded into a single error.
    pub fn ensure_valid(&self) -> Result<(), ApiError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })
    }
}

/// Builds a [`ForgeConfig`] from its layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load defaults, global file, workspace files and environment overrides.
    pub fn load(workspace_root: &Path) -> Result<ForgeConfig, ApiError> {
        Self::load_with_global(workspace_root, Self::global_config_path().as_deref())
    }

    /// [`ConfigLoader::load`] with an explicit global file location (or none).
    pub fn load_with_global(
        workspace_root: &Path,
        global_path: Option<&Path>,
    ) -> Result<ForgeConfig, ApiError> {
        let mut builder = merge::merge_policy::builder_with_defaults()?;
        builder = sources::global_file::add_to_builder(builder, global_path)?;
        builder = sources::workspace_file::add_to_builder(builder, workspace_root)?;
        let config: ForgeConfig = builder
            .add_source(Self::environment())
            .build()?
            .try_deserialize()?;
        debug!(workspace_root = %workspace_root.display(), "configuration loaded");
        Ok(config)
    }

    /// Load a single explicit file in place of the global and workspace files.
    /// Environment overrides still apply.
    pub fn load_from_file(path: &Path) -> Result<ForgeConfig, ApiError> {
        if !path.exists() {
            return Err(ApiError::ConfigError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let config: ForgeConfig = merge::merge_policy::builder_with_defaults()?
            .add_source(File::from(path.to_path_buf()).required(true))
            .add_source(Self::environment())
            .build()?
            .try_deserialize()?;
        debug!(config_path = %path.display(), "configuration loaded from file");
        Ok(config)
    }

    pub fn global_config_path() -> Option<PathBuf> {
        sources::global_file::global_config_path()
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
    }
}

/// Parse a config document from TOML text without touching the filesystem or environment.
pub fn from_toml_str(text: &str) -> Result<ForgeConfig, ApiError> {
    let config: ForgeConfig = Config::builder()
        .add_source(File::from_str(text, config::FileFormat::Toml))
        .build()?
        .try_deserialize()?;
    Ok(config)
}
