//! The research loop: the heart of ScholarLoop.
//!
//! A run follows a fixed **Search → Analyse → Follow up** cycle:
//!
//! 1. **Seed** the conversation with a request to research the query
//! 2. **Ask the model**, offering `web_search` and `get_article_content`
//! 3. **If it picks a tool**: run it, feed the result back, ask for analysis
//! 4. **Record** the iteration with the searches and fetches it made
//! 5. **Prompt** for the next knowledge gap, and repeat
//!
//! After the last iteration the model writes a cited Markdown report.

pub mod driver;
pub mod loop_runner;
pub mod prompts;

#[cfg(test)]
mod test_helpers;

pub use driver::{ConversationDriver, SKIPPED_TOOL_USE};
pub use loop_runner::ResearchLoop;
