//! Firecrawl scrape client.

use async_trait::async_trait;
use scholarloop_config::ProviderConfig;
use scholarloop_core::capability::ContentFetch;
use scholarloop_core::error::FetchError;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://api.firecrawl.dev";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

pub struct FirecrawlFetch {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl FirecrawlFetch {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    pub fn from_config(provider: &ProviderConfig) -> Self {
        let fetch = Self::new(provider.api_key.clone().unwrap_or_default());
        match &provider.base_url {
            Some(url) => fetch.with_base_url(url.as_str()),
            None => fetch,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

fn scrape_body(url: &str) -> serde_json::Value {
    serde_json::json!({
        "url": url,
        "formats": ["markdown"],
    })
}

#[async_trait]
impl ContentFetch for FirecrawlFetch {
    fn name(&self) -> &str {
        "firecrawl"
    }

    async fn fetch(&self, url: &str) -> Result<serde_json::Value, FetchError> {
        if self.api_key.is_empty() {
            return Err(FetchError::NotConfigured("FIRECRAWL_API_KEY is not set".into()));
        }

        debug!(provider = "firecrawl", url, "Sending scrape request");

        let response = self
            .client
            .post(format!("{}/v1/scrape", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&scrape_body(url))
            .send()
            .await
            .map_err(|e| FetchError::Provider(e.to_string()))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            warn!(status, url, "Firecrawl API error");
            return Err(FetchError::Provider(format!("HTTP {status}: {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| FetchError::Provider(format!("Response is not JSON: {e}")))
    }
}
