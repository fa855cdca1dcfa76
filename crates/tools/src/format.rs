//! Render search results as a bounded text block for the model.

use scholarloop_core::error::FormatError;
use tracing::warn;

use crate::results::{Article, ResultEntry, SearchResultSet};

/// Characters of article text included per result.
pub const EXCERPT_MAX_CHARS: usize = 2000;

/// Rendered in place of an empty result set.
pub const NO_RESULTS: &str = "No results found for the given query.";

/// Rendered in place of a result that could not be formatted.
pub const ENTRY_PLACEHOLDER: &str = "[Error formatting this result]";

const MISSING: &str = "N/A";

/// Format a result set for the model.
///
/// Never fails and never returns an empty string. A malformed entry is
/// replaced by a placeholder block; the other entries are unaffected.
pub fn format_search_results(results: &SearchResultSet) -> String {
    if results.is_empty() {
        return NO_RESULTS.to_string();
    }

    results
        .results
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            let ordinal = idx + 1;
            format_entry(ordinal, entry).unwrap_or_else(|e| {
                warn!(ordinal, error = %e, "Skipping malformed search result");
                format!("--- Article {ordinal} ---\n{ENTRY_PLACEHOLDER}\n\n")
            })
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_entry(ordinal: usize, entry: &ResultEntry) -> Result<String, FormatError> {
    match entry {
        ResultEntry::Article(article) => Ok(format_article(ordinal, article)),
        ResultEntry::Malformed { reason } => Err(FormatError::MalformedEntry(reason.clone())),
    }
}

fn format_article(ordinal: usize, article: &Article) -> String {
    let field = |value: &Option<String>| value.clone().unwrap_or_else(|| MISSING.to_string());
    let excerpt = article
        .text
        .as_deref()
        .map(excerpt)
        .unwrap_or_else(|| MISSING.to_string());

    format!(
        "--- Article {ordinal} ---\n\
         Title: {}\n\
         URL: {}\n\
         Published: {}\n\
         Author: {}\n\
         Content excerpt:\n{excerpt}\n\n",
        field(&article.title),
        field(&article.url),
        field(&article.published_date),
        field(&article.author),
    )
}

/// Cap `text` at [`EXCERPT_MAX_CHARS`] characters, marking the cut with `...`.
pub fn excerpt(text: &str) -> String {
    match text.char_indices().nth(EXCERPT_MAX_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
