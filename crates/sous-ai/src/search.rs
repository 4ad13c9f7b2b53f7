//! Web search adapter.
//!
//! Only the first few organic results are used, so the adapter caps what it
//! returns instead of exposing paging.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of organic results requested and returned.
pub const MAX_RESULTS: usize = 3;

/// Deadline for one search request.
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(15);

const SERPAPI_URL: &str = "https://serpapi.com/search.json";

/// A single organic search hit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: Option<String>,
    pub link: Option<String>,
    pub snippet: Option<String>,
    pub date: Option<String>,
}

/// Interface language and region used to localize a search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locale {
    /// Interface language (`hl`), e.g. "ko"
    pub language: &'static str,
    /// Result region (`gl`), e.g. "kr"
    pub region: &'static str,
}

impl Locale {
    pub const fn new(language: &'static str, region: &'static str) -> Self {
        Self { language, region }
    }
}

/// Trait for web search backends
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Search and return at most [`MAX_RESULTS`] hits in ranking order.
    async fn search(&self, query: &str, locale: Locale) -> Result<Vec<SearchResult>>;

    /// Whether a credential is available. Unconfigured providers return no results.
    fn is_configured(&self) -> bool;
}

/// SerpApi (Google engine) search client
pub struct SerpApiSearch {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
    timeout: Duration,
}

impl SerpApiSearch {
    /// Create a client; `None` or an empty key leaves search disabled.
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("search client: {}", e)))?;
        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            endpoint: SERPAPI_URL.to_string(),
            timeout,
        })
    }

    /// Point the client at another endpoint (self-hosted proxies)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl SearchProvider for SerpApiSearch {
    async fn search(&self, query: &str, locale: Locale) -> Result<Vec<SearchResult>> {
        let Some(ref api_key) = self.api_key else {
            tracing::warn!("SERPAPI_API_KEY not set, skipping search");
            return Ok(vec![]);
        };

        tracing::info!(
            query = %query,
            hl = locale.language,
            gl = locale.region,
            "serpapi search"
        );

        let num = MAX_RESULTS.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("engine", "google"),
                ("q", query),
                ("hl", locale.language),
                ("gl", locale.region),
                ("num", num.as_str()),
                ("api_key", api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(self.timeout)
                } else {
                    Error::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::from_status(status.as_u16(), body));
        }

        let payload: SerpApiResponse = response.json().await?;
        if let Some(message) = payload.error {
            return Err(Error::api("serpapi_error", message));
        }
        Ok(take_organic(payload.organic_results))
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Search backend that is never configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledSearch;

#[async_trait]
impl SearchProvider for DisabledSearch {
    async fn search(&self, _query: &str, _locale: Locale) -> Result<Vec<SearchResult>> {
        Ok(vec![])
    }

    fn is_configured(&self) -> bool {
        false
    }
}

fn take_organic(organic: Vec<SearchResult>) -> Vec<SearchResult> {
    organic.into_iter().take(MAX_RESULTS).collect()
}

#[derive(Debug, Deserialize)]
struct SerpApiResponse {
    #[serde(default)]
    organic_results: Vec<SearchResult>,
    error: Option<String>,
}
