//! ConversationModel trait: the abstraction over LLM backends.
//!
//! A model accepts a system prompt, the message history, and an optional tool
//! manifest, and answers with ordered content blocks: plain text and/or
//! structured tool invocations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::message::{ContentBlock, ConversationMessage};

/// A single completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The model to use (e.g., "claude-sonnet-4-20250514")
    pub model: String,

    /// System instructions, sent out-of-band from the messages
    pub system: String,

    /// The conversation so far
    pub messages: Vec<ConversationMessage>,

    /// Tools the model may invoke; empty means pure text completion
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,

    /// Output budget
    pub max_tokens: u32,
}

/// A tool definition sent to the model so it knows what it can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's input
    pub input_schema: serde_json::Value,
}

/// A complete response from a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelResponse {
    /// Ordered content blocks (text and tool_use only)
    pub content: Vec<ContentBlock>,

    /// Which model actually responded
    pub model: String,

    /// Token usage statistics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,

    /// Why generation stopped (e.g. "end_turn", "tool_use")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
}

/// A tool invocation pulled out of a response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolInvocation<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub input: &'a serde_json::Value,
}

impl ModelResponse {
    /// A response consisting of a single text block.
    pub fn from_text(text: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(text)],
            model: model.into(),
            usage: None,
            stop_reason: Some("end_turn".into()),
        }
    }

    /// Join all text blocks with newlines.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Tool invocations in response order.
    pub fn tool_uses(&self) -> impl Iterator<Item = ToolInvocation<'_>> {
        self.content.iter().filter_map(|block| match block {
            ContentBlock::ToolUse { id, name, input } => Some(ToolInvocation { id, name, input }),
            _ => None,
        })
    }

    /// The first tool invocation in the response, if any.
    pub fn first_tool_use(&self) -> Option<ToolInvocation<'_>> {
        self.tool_uses().next()
    }
}

/// Token usage information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl Usage {
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// The core model trait.
///
/// The research loop calls `complete()` without knowing which backend is in
/// use. Implementations make a single attempt; retrying is not their job.
#[async_trait]
pub trait ConversationModel: Send + Sync {
    /// A human-readable name for this backend (e.g., "anthropic").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(&self, request: CompletionRequest) -> Result<ModelResponse, ModelError>;
}
