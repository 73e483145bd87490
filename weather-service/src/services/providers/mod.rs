//! Text generation provider abstractions and implementations.
//!
//! Recommendations and chat answers come from a local language model. The
//! model can be reached by running its CLI (`ollama run llama2`), through the
//! Ollama HTTP API, or replaced by a mock.

pub mod command;
pub mod mock;
pub mod ollama;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub use command::CommandTextProvider;
pub use mock::MockTextProvider;
pub use ollama::{OllamaConfig, OllamaTextProvider};

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    /// The generator could not be reached or started.
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Provider timed out after {0:?}")]
    Timeout(Duration),

    /// The generator ran and reported failure (non-zero exit, HTTP error).
    #[error("Generation failed: {0}")]
    Failed(String),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// True when the generator was invoked and itself reported failure, as
    /// opposed to never having run.
    pub fn is_generation_failure(&self) -> bool {
        matches!(
            self,
            ProviderError::Failed(_) | ProviderError::InvalidResponse(_)
        )
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured(_) => "not_configured",
            ProviderError::Unavailable(_) => "unavailable",
            ProviderError::Timeout(_) => "timeout",
            ProviderError::Failed(_) => "failed",
            ProviderError::InvalidResponse(_) => "invalid_response",
        }
    }
}

/// Trait for prompt-in, text-out generators.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Provider name used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Generate a response for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;

    /// Health check.
    async fn health_check(&self) -> Result<(), ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_completed_runs_count_as_generation_failures() {
        assert!(ProviderError::Failed("exit status 1".into()).is_generation_failure());
        assert!(!ProviderError::Unavailable("No such file".into()).is_generation_failure());
        assert!(!ProviderError::Timeout(Duration::from_secs(1)).is_generation_failure());
        assert!(!ProviderError::NotConfigured("off".into()).is_generation_failure());
    }
}
