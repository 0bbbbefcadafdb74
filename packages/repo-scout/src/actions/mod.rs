//! The closed set of actions available to the orchestration loop.
//!
//! The reasoning engine names an action by tag; the loop resolves the tag
//! against [`ActionKind`] and dispatches through [`Actions`]. Unknown tags are
//! never invoked.

pub mod fetch;
pub mod search;

use std::fmt;

use tracing::{debug, info};

use crate::traits::action::Capability;

pub use fetch::{visible_text, HttpFetch, MAX_PAGE_CHARS};
pub use search::TavilySearch;

/// Tag of an action the engine may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Free-text web search returning ranked snippets and URLs
    Search,

    /// Fetch one URL and return its cleaned, bounded visible text
    Fetch,
}

impl ActionKind {
    /// Every action, in the order they are advertised to the engine.
    pub const ALL: [ActionKind; 2] = [ActionKind::Search, ActionKind::Fetch];

    /// Wire name used by the engine.
    pub fn name(self) -> &'static str {
        match self {
            Self::Search => "web_search",
            Self::Fetch => "fetch_page",
        }
    }

    /// Name of the single argument the action takes.
    pub fn parameter(self) -> &'static str {
        match self {
            Self::Search => "query",
            Self::Fetch => "url",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Search => {
                "Search the web. Returns ranked results with titles, snippets and URLs. \
                 Use it to find candidate repositories or curated lists."
            }
            Self::Fetch => {
                "Fetch a single URL and return the visible text of the page, limited to \
                 the first 5000 characters. Use it after web_search has found a relevant URL."
            }
        }
    }

    /// Resolve a wire name back to its tag.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name.trim())
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One capability per [`ActionKind`].
pub struct Actions {
    search: Box<dyn Capability>,
    fetch: Box<dyn Capability>,
}

impl Actions {
    pub fn new(search: impl Capability + 'static, fetch: impl Capability + 'static) -> Self {
        Self {
            search: Box::new(search),
            fetch: Box::new(fetch),
        }
    }

    /// The tags this set can dispatch.
    pub fn kinds(&self) -> &'static [ActionKind] {
        &ActionKind::ALL
    }

    /// Invoke the capability behind `kind`.
    pub async fn invoke(&self, kind: ActionKind, argument: &str) -> String {
        info!(action = %kind, argument = %argument, "Invoking action");

        let result = match kind {
            ActionKind::Search => self.search.invoke(argument).await,
            ActionKind::Fetch => self.fetch.invoke(argument).await,
        };

        debug!(
            action = %kind,
            result_len = result.len(),
            result_preview = %truncate_for_log(&result, 200),
            "Action complete"
        );

        result
    }
}

/// Truncate a string for logging purposes.
pub(crate) fn truncate_for_log(s: &str, max_chars: usize) -> String {
    let total = s.chars().count();
    if total <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars).collect();
        format!("{}...[truncated {} chars]", head, total - max_chars)
    }
}
