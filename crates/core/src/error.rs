//! Error types for the ScholarLoop domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each external capability has its own error enum; the research loop
//! decides at which boundary each one is contained.

use thiserror::Error;

/// Failures that abort a research iteration.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Conversation error: {0}")]
    Conversation(#[from] ConversationError),
}

/// A conversation-completion call failed.
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("Model not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// The paper-search provider failed or returned an unusable payload.
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    #[error("Search provider failed: {0}")]
    Provider(String),

    #[error("Unexpected search response shape: {0}")]
    UnexpectedShape(String),

    #[error("Search provider not configured: {0}")]
    NotConfigured(String),
}

/// The content-fetch provider failed or returned no usable text.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Fetch provider failed: {0}")]
    Provider(String),

    #[error("No markdown content in response for {url}")]
    ContentMissing { url: String },

    #[error("Fetch provider not configured: {0}")]
    NotConfigured(String),
}

/// A single search result entry could not be rendered.
#[derive(Debug, Clone, Error)]
pub enum FormatError {
    #[error("Malformed result entry: {0}")]
    MalformedEntry(String),
}

/// An append would break the conversation's ordering invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversationError {
    #[error("Tool result references unknown tool invocation: {0}")]
    OrphanToolResult(String),
}
