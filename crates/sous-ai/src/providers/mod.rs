//! LLM Provider implementations

pub mod anthropic;
pub mod openai;

use std::sync::Arc;
use std::time::Duration;

use crate::stream::collect_text;
use crate::{Api, Completion, CompletionRequest, Error, MessageEventStream, Model, Result};
use async_trait::async_trait;

/// Deadline for a whole completion, streaming included.
pub const DEFAULT_COMPLETION_TIMEOUT: Duration = Duration::from_secs(60);

/// Trait for LLM providers
///
/// Providers are stateless apart from their credentials and HTTP client, and
/// are shared between sessions behind an `Arc`.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Stream a response from the LLM
    async fn stream(&self, request: &CompletionRequest) -> Result<MessageEventStream>;

    /// The model this provider talks to
    fn model(&self) -> &Model;

    /// Deadline applied by [`LlmProvider::complete`]
    fn timeout(&self) -> Duration {
        DEFAULT_COMPLETION_TIMEOUT
    }

    /// Run a request to completion and return the full text.
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        let timeout = self.timeout();
        let run = async {
            let stream = self.stream(request).await?;
            collect_text(stream).await
        };
        tokio::time::timeout(timeout, run)
            .await
            .map_err(|_| Error::Timeout(timeout))?
    }
}

/// Get an API key from a provided value or the environment
pub fn get_api_key(provided: Option<&str>, env_var: &str) -> Result<String> {
    if let Some(key) = provided {
        return Ok(key.to_string());
    }

    std::env::var(env_var).map_err(|_| Error::InvalidApiKey)
}

/// Build the provider matching a model's API.
pub fn create_provider(
    model: Model,
    api_key: Option<&str>,
    timeout: Duration,
) -> Result<Arc<dyn LlmProvider>> {
    match model.api {
        Api::AnthropicMessages => {
            let key = get_api_key(api_key, "ANTHROPIC_API_KEY")?;
            Ok(Arc::new(
                anthropic::AnthropicProvider::new(key, model).with_timeout(timeout),
            ))
        }
        Api::OpenAICompletions => {
            let env_var = model.provider.api_key_env_var();
            let key = match (api_key, env_var) {
                (Some(key), _) => key.to_string(),
                (None, Some(var)) => get_api_key(None, var)?,
                // Local endpoints (Ollama, custom) may not need a key at all.
                (None, None) => String::new(),
            };
            Ok(Arc::new(
                openai::OpenAIProvider::new(key, model).with_timeout(timeout),
            ))
        }
    }
}
