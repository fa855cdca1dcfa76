//! Research tools for ScholarLoop.
//!
//! The model is offered two tools: a date-filterable paper search and a
//! full-text article fetch. Each sits behind an adapter that normalizes the
//! provider payload, records the attempt in the session log, and turns
//! provider faults into values the conversation can carry on with.

pub mod exa;
pub mod fetch;
pub mod firecrawl;
pub mod format;
pub mod manifest;
pub mod results;
pub mod search;

use std::sync::Arc;

use scholarloop_core::capability::{ContentFetch, PaperSearch};
use scholarloop_core::progress::ProgressSink;

pub use exa::ExaSearch;
pub use fetch::{FETCH_UNAVAILABLE, FetchAdapter, MAX_CONTENT_CHARS, normalize_fetch_response};
pub use firecrawl::FirecrawlFetch;
pub use format::format_search_results;
pub use manifest::{GET_ARTICLE_CONTENT, ResearchToolCall, WEB_SEARCH, research_tools};
pub use results::{Article, FetchedDocument, ResultEntry, SearchResultSet};
pub use search::{SearchAdapter, normalize_search_response};

/// The search and fetch adapters a research run works with.
pub struct ResearchTools {
    pub search: SearchAdapter,
    pub fetch: FetchAdapter,
}

impl ResearchTools {
    pub fn new(
        search: Arc<dyn PaperSearch>,
        fetch: Arc<dyn ContentFetch>,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            search: SearchAdapter::new(search, progress.clone()),
            fetch: FetchAdapter::new(fetch, progress),
        }
    }
}
