//! Model registry with public lookup API.

use crate::{Api, Model, Provider};

/// Default model used when nothing else is configured.
pub const DEFAULT_MODEL_ID: &str = "gpt-4.1-mini";

struct ModelEntry {
    id: &'static str,
    name: &'static str,
    api: Api,
    provider: Provider,
    base_url: &'static str,
    max_tokens: u32,
}

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

static MODEL_ENTRIES: &[ModelEntry] = &[
    ModelEntry {
        id: "gpt-4.1-mini",
        name: "GPT-4.1 mini",
        api: Api::OpenAICompletions,
        provider: Provider::OpenAI,
        base_url: OPENAI_BASE_URL,
        max_tokens: 32768,
    },
    ModelEntry {
        id: "gpt-4.1",
        name: "GPT-4.1",
        api: Api::OpenAICompletions,
        provider: Provider::OpenAI,
        base_url: OPENAI_BASE_URL,
        max_tokens: 32768,
    },
    ModelEntry {
        id: "gpt-4o-mini",
        name: "GPT-4o mini",
        api: Api::OpenAICompletions,
        provider: Provider::OpenAI,
        base_url: OPENAI_BASE_URL,
        max_tokens: 16384,
    },
    ModelEntry {
        id: "claude-sonnet-4-5-20250929",
        name: "Claude Sonnet 4.5",
        api: Api::AnthropicMessages,
        provider: Provider::Anthropic,
        base_url: ANTHROPIC_BASE_URL,
        max_tokens: 64000,
    },
    ModelEntry {
        id: "claude-haiku-4-5-20251001",
        name: "Claude Haiku 4.5",
        api: Api::AnthropicMessages,
        provider: Provider::Anthropic,
        base_url: ANTHROPIC_BASE_URL,
        max_tokens: 64000,
    },
];

impl ModelEntry {
    fn to_model(&self) -> Model {
        Model {
            id: self.id.to_string(),
            name: self.name.to_string(),
            api: self.api,
            provider: self.provider,
            base_url: self.base_url.to_string(),
            max_tokens: self.max_tokens,
            headers: Default::default(),
        }
    }
}

/// Look up a model by provider and ID.
pub fn get_model(provider: Provider, id: &str) -> Option<Model> {
    MODEL_ENTRIES
        .iter()
        .find(|e| e.id == id && e.provider == provider)
        .map(|e| e.to_model())
}

/// Look up a model by ID only (first match across all providers).
pub fn get_model_by_id(id: &str) -> Option<Model> {
    MODEL_ENTRIES
        .iter()
        .find(|e| e.id == id)
        .map(|e| e.to_model())
}

/// Build a model for an ID the registry does not know.
///
/// OpenAI-compatible endpoints are assumed for everything except Anthropic.
pub fn custom_model(provider: Provider, id: &str) -> Model {
    let (api, base_url) = match provider {
        Provider::Anthropic => (Api::AnthropicMessages, ANTHROPIC_BASE_URL),
        Provider::OpenAI => (Api::OpenAICompletions, OPENAI_BASE_URL),
        Provider::Groq => (Api::OpenAICompletions, "https://api.groq.com/openai/v1"),
        Provider::OpenRouter => (Api::OpenAICompletions, "https://openrouter.ai/api/v1"),
        Provider::Ollama => (Api::OpenAICompletions, "http://localhost:11434/v1"),
        Provider::Custom => (Api::OpenAICompletions, ""),
    };

    Model {
        id: id.to_string(),
        name: id.to_string(),
        api,
        provider,
        base_url: base_url.to_string(),
        max_tokens: 8192,
        headers: Default::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_model_is_registered() {
        let model = get_model_by_id(DEFAULT_MODEL_ID).unwrap();
        assert_eq!(model.provider, Provider::OpenAI);
        assert_eq!(model.api, Api::OpenAICompletions);
    }

    #[test]
    fn test_get_model_requires_matching_provider() {
        assert!(get_model(Provider::Anthropic, "gpt-4.1-mini").is_none());
        assert!(get_model(Provider::OpenAI, "gpt-4.1-mini").is_some());
    }

    #[test]
    fn test_custom_model_defaults() {
        let model = custom_model(Provider::Ollama, "llama3");
        assert_eq!(model.base_url, "http://localhost:11434/v1");
        assert_eq!(model.api, Api::OpenAICompletions);
        assert_eq!(model.id, "llama3");
    }
}
