//! Exa neural search client.
//!
//! Returns the raw JSON payload; shape checking happens in
//! [`normalize_search_response`](crate::search::normalize_search_response).

use async_trait::async_trait;
use scholarloop_config::{ProviderConfig, SearchConfig};
use scholarloop_core::capability::{PaperSearch, SearchQuery};
use scholarloop_core::error::SearchError;
use serde::Serialize;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://api.exa.ai";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub struct ExaSearch {
    base_url: String,
    api_key: String,
    settings: SearchConfig,
    client: reqwest::Client,
}

impl ExaSearch {
    pub fn new(api_key: impl Into<String>, settings: SearchConfig) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            settings,
            client: build_client(),
        }
    }

    /// Build from the `[exa]` and `[search]` config sections.
    pub fn from_config(provider: &ProviderConfig, settings: &SearchConfig) -> Self {
        let search = Self::new(provider.api_key.clone().unwrap_or_default(), settings.clone());
        match &provider.base_url {
            Some(url) => search.with_base_url(url.as_str()),
            None => search,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn build_body<'a>(&'a self, query: &'a SearchQuery) -> ExaSearchRequest<'a> {
        ExaSearchRequest {
            query: &query.query,
            search_type: &self.settings.search_type,
            category: &self.settings.category,
            num_results: query.num_results,
            contents: ExaContents {
                text: ExaTextConfig {
                    max_characters: self.settings.max_characters,
                },
            },
            start_published_date: query.start_date.as_deref(),
            end_published_date: query.end_date.as_deref(),
        }
    }
}

fn build_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

#[async_trait]
impl PaperSearch for ExaSearch {
    fn name(&self) -> &str {
        "exa"
    }

    async fn search(&self, query: &SearchQuery) -> Result<serde_json::Value, SearchError> {
        if self.api_key.is_empty() {
            return Err(SearchError::NotConfigured("EXA_API_KEY is not set".into()));
        }

        let url = format!("{}/search", self.base_url);
        debug!(provider = "exa", query = %query.query, num_results = query.num_results, "Sending search request");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&self.build_body(query))
            .send()
            .await
            .map_err(|e| SearchError::Provider(e.to_string()))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            warn!(status, body = %body, "Exa API error");
            return Err(SearchError::Provider(format!("HTTP {status}: {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| SearchError::UnexpectedShape(format!("Response is not JSON: {e}")))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExaSearchRequest<'a> {
    query: &'a str,
    #[serde(rename = "type")]
    search_type: &'a str,
    category: &'a str,
    num_results: u32,
    contents: ExaContents,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_published_date: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_published_date: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ExaContents {
    text: ExaTextConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExaTextConfig {
    max_characters: u32,
}
