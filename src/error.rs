//! Error types for the block engine.
//!

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("Invalid block spec: {0}")]
    InvalidSpec(String),
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),
    #[error("Narrative generation failed for block {block_id}: {reason}")]
    NarrativeGenerationFailed { block_id: String, reason: String },
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Timeout error: {0}")]
    Timeout(String),
    #[error("Circuit breaker open: {0}")]
    CircuitBreakerOpen(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn invalid_spec(reason: impl Into<String>) -> Self {
        Self::InvalidSpec(reason.into())
    }

    pub fn provider_unavailable(reason: impl Into<String>) -> Self {
        Self::ProviderUnavailable(reason.into())
    }

    /// Whether the resolver may absorb this error through its fallback chain.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvalidSpec(_) | Self::Configuration(_))
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(error: serde_json::Error) -> Self {
        EngineError::Serialization(format!("JSON serialization error: {error}"))
    }
}

impl From<config::ConfigError> for EngineError {
    fn from(error: config::ConfigError) -> Self {
        EngineError::Configuration(error.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
