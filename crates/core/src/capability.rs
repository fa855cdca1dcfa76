//! Search and fetch capabilities: the external literature providers.
//!
//! Implementations return the provider's raw JSON payload. Turning that
//! payload into fixed result types is the job of the adapters in
//! `scholarloop-tools`; nothing past the adapter boundary sees a raw shape.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{FetchError, SearchError};

/// Parameters for one paper search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    pub num_results: u32,
    /// ISO-8601 lower bound on publication date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    /// ISO-8601 upper bound on publication date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

/// A scientific-paper index.
#[async_trait]
pub trait PaperSearch: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, query: &SearchQuery) -> Result<serde_json::Value, SearchError>;
}

/// A scraper that returns the full text of a page.
#[async_trait]
pub trait ContentFetch: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self, url: &str) -> Result<serde_json::Value, FetchError>;
}
