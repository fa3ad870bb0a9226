//! Error types for exercise generation and the oracle boundary.

use thiserror::Error;

/// Errors raised inside the crate.
///
/// Provider and oracle variants never reach a caller of the generation core: the oracle
/// adapter turns them into empty batches, fail-open validations or local fallbacks.
/// Only `InvalidRequest` is meant to be shown to clients verbatim.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Provider request failed: {0}")]
    ProviderRequestFailed(String),

    #[error("Provider authentication failed: {0}")]
    ProviderAuthFailed(String),

    #[error("Provider rate limit exceeded: {0}")]
    ProviderRateLimit(String),

    #[error("Provider model not found: {0}")]
    ProviderModelNotFound(String),

    #[error("Provider call timed out after {0} ms")]
    ProviderTimeout(u128),

    #[error("Malformed oracle response: {0}")]
    MalformedResponse(String),

    #[error("Validation returned {actual} results for {expected} candidates")]
    ValidationMismatch { expected: usize, actual: usize },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::MalformedResponse(err.to_string())
    }
}
