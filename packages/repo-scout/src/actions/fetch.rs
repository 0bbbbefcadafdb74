//! HTTP fetch action: one URL in, cleaned visible text out.
//!
//! Uses reqwest for the request and the scraper crate for HTML parsing.
//! Script, style and noscript content is dropped, whitespace is collapsed and
//! the result is cut to [`MAX_PAGE_CHARS`] characters. At most
//! [`MAX_BODY_BYTES`] of the body are read.

use std::time::Duration;

use async_trait::async_trait;
use scraper::Html;
use tracing::{debug, warn};
use url::Url;

use crate::traits::action::Capability;

/// Upper bound on the text handed back to the engine.
pub const MAX_PAGE_CHARS: usize = 5000;

/// Bytes of a response body read before the rest is dropped unread.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Elements whose text is never visible.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Fetches pages over HTTP and returns their visible text.
pub struct HttpFetch {
    client: reqwest::Client,
}

impl HttpFetch {
    pub fn new() -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client })
    }

    async fn fetch_html(&self, url: &Url) -> Result<String, String> {
        let mut response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {} for {}", status, url));
        }

        // Stop reading at the cap; the rest of the body is dropped
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| e.to_string())? {
            let room = MAX_BODY_BYTES - body.len();
            if chunk.len() >= room {
                body.extend_from_slice(&chunk[..room]);
                break;
            }
            body.extend_from_slice(&chunk);
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

#[async_trait]
impl Capability for HttpFetch {
    async fn invoke(&self, argument: &str) -> String {
        let raw = argument.trim();

        let url = match Url::parse(raw) {
            Ok(url) => url,
            Err(e) => return format!("Error: '{}' is not a valid URL ({}).", raw, e),
        };
        if url.scheme() != "http" && url.scheme() != "https" {
            return format!(
                "Error: unsupported URL scheme '{}'; only http and https pages can be fetched.",
                url.scheme()
            );
        }

        debug!(url = %url, "Fetching page");
        let html = match self.fetch_html(&url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(url = %url, error = %e, "Fetch failed");
                return format!("Error during web request: {}", e);
            }
        };

        let text = visible_text(&html);
        if text.is_empty() {
            return format!("The page at {} has no visible text.", url);
        }

        let text = truncate_chars(&text, MAX_PAGE_CHARS);
        debug!(url = %url, text_len = text.len(), "Page fetched");
        text
    }
}

/// Visible text of an HTML document with whitespace collapsed.
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut text = String::new();

    for node in document.root_element().descendants() {
        let Some(fragment) = node.value().as_text() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map(|el| HIDDEN_ELEMENTS.contains(&el.name()))
                .unwrap_or(false)
        });

        if !hidden {
            text.push_str(fragment);
            text.push(' ');
        }
    }

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
