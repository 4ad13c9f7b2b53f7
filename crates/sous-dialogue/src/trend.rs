//! Trend augmentation: model-written queries, one web search, a model
//! summary of the results.
//!
//! The pipeline never fails. Every problem ends the run early with an empty
//! summary and generation carries on without trends.

use std::sync::Arc;

use sous_ai::{CompletionRequest, LlmProvider, Locale, SearchProvider, SearchResult};
use tokio::sync::broadcast;

use crate::events::DialogueEvent;
use crate::extract::parse_json_array;
use crate::locale::locale_for;
use crate::prompts::{
    SYSTEM_PROMPT, TREND_SUMMARY_SYSTEM_PROMPT, fill_search_results, trend_query_prompt,
    trend_summary_template,
};
use crate::trend_log::{TrendLogger, TrendRecord};

/// Inputs the pipeline reads from the conversation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrendRequest<'a> {
    pub trend_enabled: bool,
    pub country: Option<&'a str>,
    pub base_recipe: Option<&'a str>,
    pub constraints: Option<&'a str>,
}

/// Why a run was skipped before any external call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The user opted out of trends
    Disabled,
    /// The country has no search locale
    UnsupportedCountry(String),
    /// No search credential
    NoSearchCredential,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Disabled => write!(f, "trend search disabled"),
            SkipReason::UnsupportedCountry(c) => write!(f, "unsupported country: {}", c),
            SkipReason::NoSearchCredential => write!(f, "no search credential"),
        }
    }
}

pub struct TrendPipeline {
    llm: Arc<dyn LlmProvider>,
    search: Arc<dyn SearchProvider>,
    logger: Option<TrendLogger>,
    events: broadcast::Sender<DialogueEvent>,
}

impl TrendPipeline {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        search: Arc<dyn SearchProvider>,
        logger: Option<TrendLogger>,
        events: broadcast::Sender<DialogueEvent>,
    ) -> Self {
        Self {
            llm,
            search,
            logger,
            events,
        }
    }

    /// The three-way gate: trends on, a searchable country, a credential.
    pub fn gate<'a>(&self, request: &TrendRequest<'a>) -> Result<(&'a str, Locale), SkipReason> {
        if !request.trend_enabled {
            return Err(SkipReason::Disabled);
        }
        let country = request.country.unwrap_or_default();
        let locale =
            locale_for(country).ok_or_else(|| SkipReason::UnsupportedCountry(country.to_string()))?;
        if !self.search.is_configured() {
            return Err(SkipReason::NoSearchCredential);
        }
        Ok((country, locale))
    }

    /// Produce a trend summary, or an empty string.
    pub async fn run(&self, request: &TrendRequest<'_>) -> String {
        let (country, locale) = match self.gate(request) {
            Ok(target) => target,
            Err(reason) => {
                tracing::info!(%reason, "trend search skipped");
                let _ = self.events.send(DialogueEvent::TrendSearchSkipped {
                    reason: reason.to_string(),
                });
                return String::new();
            }
        };
        tracing::info!(country, "trend search enabled");

        let queries = self.generate_queries(country, request).await;
        let _ = self.events.send(DialogueEvent::TrendQueriesGenerated {
            country: country.to_string(),
            queries: queries.clone(),
        });
        let Some(query) = queries.first() else {
            tracing::info!(country, "no usable trend queries");
            return String::new();
        };

        let results = match self.search.search(query, locale).await {
            Ok(results) => results,
            Err(e) => {
                log_degraded("search", &e);
                return String::new();
            }
        };
        tracing::info!(query = %query, count = results.len(), "trend search results");
        let _ = self.events.send(DialogueEvent::TrendResultsFetched {
            query: query.clone(),
            count: results.len(),
        });
        if results.is_empty() {
            return String::new();
        }

        let summary = self.summarize(country, &results).await;
        // Fetched results are recorded even when summarizing failed
        if let Some(logger) = &self.logger {
            logger.log(&TrendRecord {
                country: country.to_string(),
                queries,
                results,
                summary: summary.clone(),
            });
        }
        if !summary.is_empty() {
            let _ = self.events.send(DialogueEvent::TrendSummaryReady {
                country: country.to_string(),
                chars: summary.chars().count(),
            });
        }
        summary
    }

    async fn generate_queries(&self, country: &str, request: &TrendRequest<'_>) -> Vec<String> {
        let prompt = trend_query_prompt(country, request.base_recipe, request.constraints);
        match self
            .llm
            .complete(&CompletionRequest::new(SYSTEM_PROMPT, prompt))
            .await
        {
            Ok(completion) => {
                let queries = parse_json_array(&completion.text);
                tracing::debug!(?queries, "parsed trend queries");
                queries
            }
            Err(e) => {
                log_degraded("query generation", &e);
                vec![]
            }
        }
    }

    async fn summarize(&self, country: &str, results: &[SearchResult]) -> String {
        let payload = match serde_json::to_string_pretty(results) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode search results");
                return String::new();
            }
        };
        tracing::debug!(bytes = payload.len(), "summarizing trend results");

        let prompt = fill_search_results(&trend_summary_template(country), &payload);
        match self
            .llm
            .complete(&CompletionRequest::new(TREND_SUMMARY_SYSTEM_PROMPT, prompt))
            .await
        {
            Ok(completion) => completion.text.trim().to_string(),
            Err(e) => {
                log_degraded("trend summary", &e);
                String::new()
            }
        }
    }
}

fn log_degraded(stage: &str, error: &sous_ai::Error) {
    if error.is_transient() {
        tracing::warn!(stage, error = %error, "trend pipeline degraded");
    } else {
        tracing::error!(stage, error = %error, "trend pipeline degraded");
    }
}
