//! Paper search adapter.
//!
//! Wraps a [`PaperSearch`] provider so that a search never fails past this
//! point: every attempt is logged as a [`SearchRecord`](scholarloop_core::SearchRecord),
//! and a provider fault turns into an empty result set the model can still
//! be shown.

use std::sync::Arc;

use scholarloop_core::capability::{PaperSearch, SearchQuery};
use scholarloop_core::error::SearchError;
use scholarloop_core::progress::{ProgressEvent, ProgressSink};
use scholarloop_core::session::ResearchLog;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::results::{Article, ResultEntry, SearchResultSet};

pub struct SearchAdapter {
    provider: Arc<dyn PaperSearch>,
    progress: Arc<dyn ProgressSink>,
}

impl SearchAdapter {
    pub fn new(provider: Arc<dyn PaperSearch>, progress: Arc<dyn ProgressSink>) -> Self {
        Self { provider, progress }
    }

    /// Run one search and record it in `log`.
    pub async fn search(
        &self,
        log: &mut ResearchLog,
        query: &str,
        max_results: u32,
        start_date: Option<String>,
        end_date: Option<String>,
    ) -> SearchResultSet {
        let request = SearchQuery {
            query: query.to_string(),
            num_results: max_results,
            start_date,
            end_date,
        };

        self.progress
            .emit(ProgressEvent::search(format!("Searching for: {query}")));
        debug!(provider = self.provider.name(), query, max_results, "Searching");

        match self.try_search(&request).await {
            Ok(results) => {
                log.record_search(&request, results.len(), None);
                self.progress.emit(ProgressEvent::search(format!(
                    "Found {} results for '{query}'",
                    results.len()
                )));
                results
            }
            Err(e) => {
                warn!(query, error = %e, "Search failed");
                log.record_search(&request, 0, Some(e.to_string()));
                self.progress
                    .emit(ProgressEvent::error(format!("Search error: {e}")));
                SearchResultSet::empty()
            }
        }
    }

    async fn try_search(&self, request: &SearchQuery) -> Result<SearchResultSet, SearchError> {
        let raw = self.provider.search(request).await?;
        normalize_search_response(raw)
    }
}

/// Translate a raw provider payload into a [`SearchResultSet`].
///
/// Accepted shapes: `{"results": [..]}`, `{"data": {"results": [..]}}`, or a
/// bare array. Anything else is an [`SearchError::UnexpectedShape`]. Entries
/// that are not objects are kept as [`ResultEntry::Malformed`].
pub fn normalize_search_response(raw: Value) -> Result<SearchResultSet, SearchError> {
    let items = match raw {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("results") {
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(SearchError::UnexpectedShape(format!(
                    "'results' is {}, expected an array",
                    json_type(&other)
                )));
            }
            None => nested_results(map.remove("data"))?,
        },
        other => {
            return Err(SearchError::UnexpectedShape(format!(
                "response is {}, expected an object or array",
                json_type(&other)
            )));
        }
    };

    Ok(SearchResultSet {
        results: items.into_iter().map(normalize_entry).collect(),
    })
}

fn nested_results(data: Option<Value>) -> Result<Vec<Value>, SearchError> {
    match data {
        Some(Value::Object(mut data)) => match data.remove("results") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(SearchError::UnexpectedShape(
                "'data' has no 'results' array".into(),
            )),
        },
        _ => Err(SearchError::UnexpectedShape(
            "response has no 'results' array".into(),
        )),
    }
}

fn normalize_entry(item: Value) -> ResultEntry {
    match item {
        Value::Object(map) => ResultEntry::Article(Article {
            title: field(&map, &["title"]),
            url: field(&map, &["url", "id"]),
            published_date: field(&map, &["publishedDate", "published_date"]),
            author: field(&map, &["author"]),
            text: field(&map, &["text"]),
        }),
        other => ResultEntry::Malformed {
            reason: format!("expected an object, got {}", json_type(&other)),
        },
    }
}

/// First present, renderable value among `keys`.
fn field(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match map.get(*key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        Value::Null | Value::Object(_) => None,
    })
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
