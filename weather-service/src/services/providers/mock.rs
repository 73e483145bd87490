//! Mock provider for tests and local development.

use super::{ProviderError, TextProvider};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Default canned output: a preamble and five numbered recommendations.
pub const MOCK_RESPONSE: &str = "Here are some safety recommendations:\n\
1. Stay hydrated and avoid strenuous outdoor activity\n\
2. Secure loose outdoor objects\n\
3. Keep an emergency kit with water and flashlights\n\
4. Monitor local weather alerts\n\
5. Check on elderly neighbours";

pub struct MockTextProvider {
    enabled: bool,
    response: String,
    calls: AtomicUsize,
}

impl MockTextProvider {
    pub fn new(enabled: bool) -> Self {
        Self::with_response(enabled, MOCK_RESPONSE)
    }

    pub fn with_response(enabled: bool, response: impl Into<String>) -> Self {
        Self {
            enabled,
            response: response.into(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `generate` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if !self.enabled {
            return Err(ProviderError::NotConfigured(
                "Mock text provider not enabled".to_string(),
            ));
        }

        Ok(self.response.clone())
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.enabled {
            Ok(())
        } else {
            Err(ProviderError::NotConfigured(
                "Mock text provider not enabled".to_string(),
            ))
        }
    }
}
