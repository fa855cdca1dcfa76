//! # ScholarLoop Core
//!
//! Domain types, capability traits, and error definitions for the ScholarLoop
//! literature-review agent. This crate performs **no I/O**: it defines the
//! domain model that the provider, tool, and agent crates implement against.
//!
//! ## Capabilities
//!
//! The research loop talks to three external collaborators, each defined as a
//! trait here so they can be swapped for scripted fakes in tests:
//! - [`ConversationModel`]: an LLM that accepts a message history plus a tool manifest
//! - [`PaperSearch`]: a scientific-paper index
//! - [`ContentFetch`]: a scraper returning full article text

pub mod capability;
pub mod error;
pub mod message;
pub mod progress;
pub mod provider;
pub mod session;

// Re-export key types at crate root for ergonomics
pub use capability::{ContentFetch, PaperSearch, SearchQuery};
pub use error::{ConversationError, Error, FetchError, FormatError, ModelError, SearchError};
pub use message::{ContentBlock, Conversation, ConversationMessage, Role};
pub use progress::{NoopProgress, ProgressBus, ProgressEvent, ProgressKind, ProgressSink};
pub use provider::{
    CompletionRequest, ConversationModel, ModelResponse, ToolDefinition, ToolInvocation, Usage,
};
pub use session::{FetchRecord, IterationRecord, ResearchLog, ResearchSession, SearchRecord};
