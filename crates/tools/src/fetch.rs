//! Article content adapter.

use std::sync::Arc;

use scholarloop_core::capability::ContentFetch;
use scholarloop_core::error::FetchError;
use scholarloop_core::progress::{ProgressEvent, ProgressSink};
use scholarloop_core::session::ResearchLog;
use serde_json::Value;
use tracing::{debug, warn};

use crate::results::FetchedDocument;

/// Characters of article text handed to the model.
pub const MAX_CONTENT_CHARS: usize = 100_000;

/// Content returned when retrieval failed.
pub const FETCH_UNAVAILABLE: &str = "Error retrieving content";

pub struct FetchAdapter {
    provider: Arc<dyn ContentFetch>,
    progress: Arc<dyn ProgressSink>,
}

impl FetchAdapter {
    pub fn new(provider: Arc<dyn ContentFetch>, progress: Arc<dyn ProgressSink>) -> Self {
        Self { provider, progress }
    }

    /// Retrieve `url` as markdown and record the attempt in `log`.
    ///
    /// Never fails: a provider fault yields a document whose content is
    /// [`FETCH_UNAVAILABLE`].
    pub async fn fetch(&self, log: &mut ResearchLog, url: &str) -> FetchedDocument {
        self.progress
            .emit(ProgressEvent::content(format!("Retrieving content from: {url}")));
        debug!(provider = self.provider.name(), url, "Fetching article");

        match self.try_fetch(url).await {
            Ok(mut text) => {
                let original_length = text.chars().count();
                if let Some((cut, _)) = text.char_indices().nth(MAX_CONTENT_CHARS) {
                    text.truncate(cut);
                }
                log.record_fetch(url, Ok(original_length));
                self.progress.emit(ProgressEvent::content(format!(
                    "Retrieved {original_length} characters from article"
                )));
                FetchedDocument {
                    url: url.to_string(),
                    content: text,
                    success: true,
                    original_length,
                }
            }
            Err(e) => {
                warn!(url, error = %e, "Content retrieval failed");
                log.record_fetch(url, Err(e.to_string()));
                self.progress
                    .emit(ProgressEvent::error(format!("Content retrieval error: {e}")));
                FetchedDocument {
                    url: url.to_string(),
                    content: FETCH_UNAVAILABLE.to_string(),
                    success: false,
                    original_length: 0,
                }
            }
        }
    }

    async fn try_fetch(&self, url: &str) -> Result<String, FetchError> {
        let raw = self.provider.fetch(url).await?;
        normalize_fetch_response(raw, url)
    }
}

/// Pull the markdown body out of a scrape payload.
///
/// Accepts `{"markdown": ..}` and `{"data": {"markdown": ..}}`.
pub fn normalize_fetch_response(raw: Value, url: &str) -> Result<String, FetchError> {
    let markdown = raw
        .get("markdown")
        .or_else(|| raw.get("data").and_then(|d| d.get("markdown")))
        .and_then(Value::as_str);

    match markdown {
        Some(text) => Ok(text.to_string()),
        None => Err(FetchError::ContentMissing {
            url: url.to_string(),
        }),
    }
}
