//! Local CLI provider: runs e.g. `ollama run llama2` with the prompt on stdin
//! and returns its stdout.

use super::{ProviderError, TextProvider};
use crate::services::executor::{CommandError, CommandExecutor};
use async_trait::async_trait;
use std::time::Duration;

pub struct CommandTextProvider {
    program: String,
    args: Vec<String>,
    executor: CommandExecutor,
}

impl CommandTextProvider {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            executor: CommandExecutor::new(timeout),
        }
    }
}

impl From<CommandError> for ProviderError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Spawn { .. } => ProviderError::Unavailable(err.to_string()),
            CommandError::Timeout(timeout) => ProviderError::Timeout(timeout),
            CommandError::Io(e) => ProviderError::Unavailable(e.to_string()),
            CommandError::Failed { .. } => ProviderError::Failed(err.to_string()),
        }
    }
}

#[async_trait]
impl TextProvider for CommandTextProvider {
    fn name(&self) -> &'static str {
        "command"
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        if self.program.trim().is_empty() {
            return Err(ProviderError::NotConfigured(
                "GENERATOR_PROGRAM is empty".to_string(),
            ));
        }

        let output = self
            .executor
            .execute(&self.program, &self.args, Some(prompt.as_bytes()))
            .await?;

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.program.trim().is_empty() {
            return Err(ProviderError::NotConfigured(
                "GENERATOR_PROGRAM is empty".to_string(),
            ));
        }
        Ok(())
    }
}
