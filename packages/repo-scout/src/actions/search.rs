//! Tavily-backed search action.
//!
//! Best-effort: results may be stale or incomplete. Provider failures come
//! back as text, never as errors.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::credentials::SecretString;
use crate::traits::action::Capability;

const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";

const SEARCH_TIMEOUT: Duration = Duration::from_secs(15);

const MAX_RESULTS: usize = 10;

/// Web search through the Tavily API.
pub struct TavilySearch {
    api_key: SecretString,
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

/// One ranked hit.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct SearchHit {
    pub url: String,
    pub title: Option<String>,
    pub content: Option<String>,
}

impl TavilySearch {
    pub fn new(api_key: SecretString) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(SEARCH_TIMEOUT).build()?;

        Ok(Self {
            api_key,
            client,
            endpoint: TAVILY_SEARCH_URL.to_string(),
            timeout: SEARCH_TIMEOUT,
        })
    }

    /// Point at a different endpoint (proxies, tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Give up on a request after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, String> {
        #[derive(serde::Serialize)]
        struct Request<'a> {
            query: &'a str,
            search_depth: &'a str,
            max_results: usize,
        }

        #[derive(serde::Deserialize)]
        struct Response {
            results: Vec<SearchHit>,
        }

        let request = Request {
            query,
            search_depth: "basic",
            max_results: MAX_RESULTS,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key.expose()))
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    format!("no response within {}s", self.timeout.as_secs_f32())
                } else {
                    e.to_string()
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("Tavily API error: {} {}", status, body.trim()));
        }

        let parsed: Response = response.json().await.map_err(|e| e.to_string())?;
        Ok(parsed.results)
    }
}

#[async_trait]
impl Capability for TavilySearch {
    async fn invoke(&self, argument: &str) -> String {
        let query = argument.trim();
        if query.is_empty() {
            return "Search query was empty; provide some search terms.".to_string();
        }

        match self.search(query).await {
            Ok(hits) => {
                debug!(query = %query, hits = hits.len(), "Search complete");
                format_hits(query, &hits)
            }
            Err(e) => {
                warn!(query = %query, error = %e, "Search failed");
                format!("Search failed for '{}': {}", query, e)
            }
        }
    }
}

/// Render hits as ranked text for the engine.
pub fn format_hits(query: &str, hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return format!("No results found for '{}'.", query);
    }

    hits.iter()
        .enumerate()
        .map(|(i, hit)| {
            let mut entry = format!(
                "{}. {}\n   URL: {}",
                i + 1,
                hit.title.as_deref().unwrap_or("(untitled)"),
                hit.url
            );
            if let Some(content) = hit.content.as_deref().map(str::trim) {
                if !content.is_empty() {
                    entry.push_str("\n   ");
                    entry.push_str(content);
                }
            }
            entry
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
