//! Normalized search and fetch results.
//!
//! These are the only result shapes the driver and formatter ever see.

use serde::{Deserialize, Serialize};

/// One article returned by a paper search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: Option<String>,
    pub url: Option<String>,
    pub published_date: Option<String>,
    pub author: Option<String>,
    pub text: Option<String>,
}

/// A search result entry, kept in provider order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultEntry {
    Article(Article),
    /// The provider returned something that is not an article record.
    Malformed { reason: String },
}

/// The normalized outcome of one search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResultSet {
    pub results: Vec<ResultEntry>,
}

impl SearchResultSet {
    /// The sentinel returned when a search failed.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn articles(&self) -> impl Iterator<Item = &Article> {
        self.results.iter().filter_map(|entry| match entry {
            ResultEntry::Article(article) => Some(article),
            ResultEntry::Malformed { .. } => None,
        })
    }
}

/// Full text recovered for one URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchedDocument {
    pub url: String,
    /// Markdown text, or the "content unavailable" marker on failure
    pub content: String,
    /// Whether text was actually recovered
    pub success: bool,
    /// Characters recovered before truncation
    pub original_length: usize,
}

impl FetchedDocument {
    pub fn truncated(&self) -> bool {
        self.success && self.original_length > self.content.chars().count()
    }
}
