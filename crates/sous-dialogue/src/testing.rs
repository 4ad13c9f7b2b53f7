//! Scripted fakes for the external services.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use sous_ai::models::custom_model;
use sous_ai::stream::MessageEvent;
use sous_ai::{
    CompletionRequest, Error as AiError, LlmProvider, Locale, MessageEventStream,
    Model, Provider, Result as AiResult, SearchProvider, SearchResult, StopReason,
};

use crate::error::Result;
use crate::store::{RecipePayload, RecipeStore, SaveOutcome};

/// One scripted model reply
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Fail,
}

/// LLM that answers from a script and records every request.
///
/// Running out of script is a failure, so tests notice unexpected calls.
pub struct ScriptedLlm {
    model: Model,
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLlm {
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            model: custom_model(Provider::Custom, "scripted"),
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(vec![]),
        })
    }

    pub fn texts<I, S>(replies: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(replies.into_iter().map(|s| Reply::Text(s.into())).collect())
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.requests.lock().last().map(|r| r.prompt.clone())
    }

    fn next_reply(&self, request: &CompletionRequest) -> AiResult<String> {
        self.requests.lock().push(request.clone());
        match self.replies.lock().pop_front() {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Fail) => Err(AiError::Timeout(std::time::Duration::from_secs(60))),
            None => Err(AiError::UnexpectedResponse("script exhausted".into())),
        }
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn stream(&self, request: &CompletionRequest) -> AiResult<MessageEventStream> {
        let text = self.next_reply(request)?;
        let events = vec![
            MessageEvent::TextDelta { delta: text.clone() },
            MessageEvent::Done {
                text,
                stop_reason: StopReason::Stop,
                usage: Default::default(),
            },
        ];
        Ok(Box::pin(futures::stream::iter(events)))
    }

    fn model(&self) -> &Model {
        &self.model
    }
}

/// Search that returns fixed results and records queries.
pub struct StaticSearch {
    results: Vec<SearchResult>,
    configured: bool,
    fail: bool,
    queries: Mutex<Vec<(String, Locale)>>,
}

impl StaticSearch {
    pub fn new(results: Vec<SearchResult>) -> Arc<Self> {
        Arc::new(Self {
            results,
            configured: true,
            fail: false,
            queries: Mutex::new(vec![]),
        })
    }

    pub fn unconfigured() -> Arc<Self> {
        Arc::new(Self {
            results: vec![],
            configured: false,
            fail: false,
            queries: Mutex::new(vec![]),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            results: vec![],
            configured: true,
            fail: true,
            queries: Mutex::new(vec![]),
        })
    }

    pub fn queries(&self) -> Vec<(String, Locale)> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl SearchProvider for StaticSearch {
    async fn search(&self, query: &str, locale: Locale) -> AiResult<Vec<SearchResult>> {
        self.queries.lock().push((query.to_string(), locale));
        if self.fail {
            return Err(AiError::from_status(503, "unavailable"));
        }
        Ok(self.results.clone())
    }

    fn is_configured(&self) -> bool {
        self.configured
    }
}

pub fn search_result(title: &str) -> SearchResult {
    SearchResult {
        title: Some(title.to_string()),
        link: Some(format!("https://example.com/{}", title)),
        snippet: Some(format!("{} snippet", title)),
        date: None,
    }
}

/// Store that records payloads and answers with a fixed outcome.
pub struct RecordingStore {
    outcome: Option<SaveOutcome>,
    saved: Mutex<Vec<RecipePayload>>,
}

impl RecordingStore {
    pub fn succeeding(id: &str) -> Arc<Self> {
        Arc::new(Self {
            outcome: Some(SaveOutcome::saved(Some(id.to_string()))),
            saved: Mutex::new(vec![]),
        })
    }

    /// Reports failure without erroring
    pub fn rejecting() -> Arc<Self> {
        Arc::new(Self {
            outcome: Some(SaveOutcome::failed()),
            saved: Mutex::new(vec![]),
        })
    }

    /// Errors on every save
    pub fn broken() -> Arc<Self> {
        Arc::new(Self {
            outcome: None,
            saved: Mutex::new(vec![]),
        })
    }

    pub fn saved(&self) -> Vec<RecipePayload> {
        self.saved.lock().clone()
    }
}

#[async_trait]
impl RecipeStore for RecordingStore {
    async fn save(&self, payload: &RecipePayload) -> Result<SaveOutcome> {
        self.saved.lock().push(payload.clone());
        self.outcome
            .clone()
            .ok_or_else(|| crate::error::Error::Store("connection refused".into()))
    }
}
