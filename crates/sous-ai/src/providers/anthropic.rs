//! Anthropic Claude API provider

use std::time::Duration;

use crate::{
    error::{Error, Result},
    stream::{MessageEvent, MessageEventStream},
    types::{CompletionRequest, Model, StopReason, Usage},
};
use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest_eventsource::{Event, EventSource};
use serde::{Deserialize, Serialize};

use super::{DEFAULT_COMPLETION_TIMEOUT, LlmProvider};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic API client
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
    model: Model,
    timeout: Duration,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider with an API key
    pub fn new(api_key: impl Into<String>, model: Model) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model,
            timeout: DEFAULT_COMPLETION_TIMEOUT,
        }
    }

    /// Override the completion deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn build_request(&self, request: &CompletionRequest) -> AnthropicRequest {
        AnthropicRequest {
            model: self.model.id.clone(),
            max_tokens: request.max_tokens.unwrap_or(self.model.max_tokens.min(8192)),
            system: if request.system_prompt.is_empty() {
                None
            } else {
                Some(request.system_prompt.clone())
            },
            messages: vec![AnthropicMessage {
                role: "user",
                content: request.prompt.clone(),
            }],
            stream: true,
            temperature: request.temperature,
        }
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    async fn stream(&self, request: &CompletionRequest) -> Result<MessageEventStream> {
        let body = self.build_request(request);
        let url = format!("{}/v1/messages", self.model.base_url);

        tracing::debug!(model = %self.model.id, url = %url, "Anthropic completion request");

        let mut headers = reqwest::header::HeaderMap::new();
        let key = self
            .api_key
            .parse::<reqwest::header::HeaderValue>()
            .map_err(|_| Error::InvalidApiKey)?;
        headers.insert("x-api-key", key);
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            "anthropic-version",
            reqwest::header::HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        // Add model-specific headers
        for (key, value) in &self.model.headers {
            if let (Ok(name), Ok(val)) = (
                key.parse::<reqwest::header::HeaderName>(),
                value.parse::<reqwest::header::HeaderValue>(),
            ) {
                headers.insert(name, val);
            }
        }

        let request_builder = self.client.post(&url).headers(headers).json(&body);

        let event_source = EventSource::new(request_builder)
            .map_err(|e| Error::Sse(format!("Failed to create event source: {}", e)))?;

        Ok(Box::pin(create_stream(event_source, self.model.id.clone())))
    }

    fn model(&self) -> &Model {
        &self.model
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Create the event stream from SSE events
fn create_stream(
    mut event_source: EventSource,
    model_id: String,
) -> impl futures::Stream<Item = MessageEvent> {
    stream! {
        let mut usage = Usage::default();
        let mut stop_reason = StopReason::Stop;
        let mut text = String::new();
        let mut failure: Option<MessageEvent> = None;

        yield MessageEvent::Start { model: model_id };

        while let Some(event_result) = event_source.next().await {
            match event_result {
                Ok(Event::Open) => {}
                Ok(Event::Message(message)) => match message.event.as_str() {
                    "message_start" => {
                        if let Ok(data) = serde_json::from_str::<MessageStartEvent>(&message.data) {
                            usage.input = data.message.usage.input_tokens;
                            usage.output = data.message.usage.output_tokens;
                        }
                    }
                    "content_block_delta" => {
                        if let Ok(data) = serde_json::from_str::<ContentBlockDeltaEvent>(&message.data) {
                            if data.delta.delta_type == "text_delta" {
                                let delta = data.delta.text.unwrap_or_default();
                                text.push_str(&delta);
                                yield MessageEvent::TextDelta { delta };
                            }
                        }
                    }
                    "message_delta" => {
                        if let Ok(data) = serde_json::from_str::<MessageDeltaEvent>(&message.data) {
                            if let Some(reason) = data.delta.stop_reason {
                                stop_reason = map_stop_reason(&reason);
                            }
                            usage.output = data.usage.output_tokens;
                        }
                    }
                    "message_stop" => break,
                    "error" => {
                        let detail = match serde_json::from_str::<ErrorEvent>(&message.data) {
                            Ok(data) => format!("{}: {}", data.error.error_type, data.error.message),
                            Err(_) => message.data.clone(),
                        };
                        failure = Some(MessageEvent::Error { message: detail });
                        break;
                    }
                    _ => {}
                },
                Err(reqwest_eventsource::Error::StreamEnded) => break,
                Err(reqwest_eventsource::Error::InvalidStatusCode(status, response)) => {
                    let body = response.text().await.unwrap_or_default();
                    failure = Some(MessageEvent::HttpError {
                        status: status.as_u16(),
                        body,
                    });
                    break;
                }
                Err(e) => {
                    failure = Some(MessageEvent::Error {
                        message: e.to_string(),
                    });
                    break;
                }
            }
        }
        event_source.close();

        if let Some(event) = failure {
            yield event;
        } else {
            yield MessageEvent::Done {
                text,
                stop_reason,
                usage,
            };
        }
    }
}

fn map_stop_reason(reason: &str) -> StopReason {
    match reason {
        "max_tokens" => StopReason::Length,
        _ => StopReason::Stop,
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessageStartEvent {
    message: MessageInfo,
}

#[derive(Debug, Deserialize)]
struct MessageInfo {
    usage: UsageInfo,
}

#[derive(Debug, Default, Deserialize)]
struct UsageInfo {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ContentBlockDeltaEvent {
    delta: DeltaInfo,
}

#[derive(Debug, Deserialize)]
struct DeltaInfo {
    #[serde(rename = "type")]
    delta_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageDeltaEvent {
    delta: MessageDelta,
    #[serde(default)]
    usage: UsageInfo,
}

#[derive(Debug, Deserialize)]
struct MessageDelta {
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEvent {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models;

    fn provider() -> AnthropicProvider {
        AnthropicProvider::new(
            "sk-ant-test",
            models::get_model_by_id("claude-haiku-4-5-20251001").unwrap(),
        )
    }

    #[test]
    fn test_build_request_puts_system_at_top_level() {
        let req = provider().build_request(&CompletionRequest::new("persona", "prompt"));
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["system"], "persona");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "prompt");
        assert_eq!(json["max_tokens"], 8192);
        assert_eq!(json["stream"], true);
    }

    #[test]
    fn test_map_stop_reason() {
        assert_eq!(map_stop_reason("end_turn"), StopReason::Stop);
        assert_eq!(map_stop_reason("max_tokens"), StopReason::Length);
    }

    #[test]
    fn test_parse_text_delta() {
        let data = r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"찌개"}}"#;
        let event: ContentBlockDeltaEvent = serde_json::from_str(data).unwrap();
        assert_eq!(event.delta.delta_type, "text_delta");
        assert_eq!(event.delta.text.as_deref(), Some("찌개"));
    }

    #[test]
    fn test_parse_error_event() {
        let data = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        let event: ErrorEvent = serde_json::from_str(data).unwrap();
        assert_eq!(event.error.error_type, "overloaded_error");
    }
}
