//! Conversation domain types.
//!
//! A research run is one long conversation between the user-side loop and the
//! model: user prompts, assistant turns (text and tool invocations), and tool
//! results flowing back. The conversation only ever grows.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::ConversationError;

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The research loop (prompts and tool results)
    User,
    /// The model
    Assistant,
}

/// A single block of message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text.
    Text { text: String },

    /// The model asks for a tool to be run.
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },

    /// The output of a tool, bound to the invocation that asked for it.
    ToolResult { tool_use_id: String, content: String },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// Who sent this message
    pub role: Role,

    /// Ordered content blocks
    pub content: Vec<ContentBlock>,
}

impl ConversationMessage {
    /// Create a user message with a single text block.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentBlock::text(text)],
        }
    }

    /// Create an assistant message from the model's raw content blocks.
    pub fn assistant(content: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Assistant,
            content,
        }
    }

    /// Create a user message carrying a tool result.
    pub fn tool_result(tool_use_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentBlock::ToolResult {
                tool_use_id: tool_use_id.into(),
                content: content.into(),
            }],
        }
    }

    /// Concatenate the text blocks of this message.
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
}

/// An append-only, ordered sequence of messages.
///
/// Every tool result must answer a tool invocation already in the
/// conversation; [`Conversation::push`] enforces this.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Conversation {
    messages: Vec<ConversationMessage>,

    #[serde(skip)]
    tool_use_ids: HashSet<String>,
}

impl Conversation {
    /// Create a new empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to the conversation.
    pub fn push(&mut self, message: ConversationMessage) -> Result<(), ConversationError> {
        for block in &message.content {
            if let ContentBlock::ToolResult { tool_use_id, .. } = block {
                if !self.tool_use_ids.contains(tool_use_id) {
                    return Err(ConversationError::OrphanToolResult(tool_use_id.clone()));
                }
            }
        }

        for block in &message.content {
            if let ContentBlock::ToolUse { id, .. } = block {
                self.tool_use_ids.insert(id.clone());
            }
        }
        self.messages.push(message);
        Ok(())
    }

    /// Append a plain user prompt. Cannot violate the ordering invariant.
    pub fn push_user_text(&mut self, text: impl Into<String>) {
        self.messages.push(ConversationMessage::user_text(text));
    }

    /// The messages so far, oldest first.
    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The most recent message, if any.
    pub fn last(&self) -> Option<&ConversationMessage> {
        self.messages.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool_use(id: &str) -> ContentBlock {
        ContentBlock::ToolUse {
            id: id.into(),
            name: "web_search".into(),
            input: serde_json::json!({"query": "metformin"}),
        }
    }

    #[test]
    fn create_user_message() {
        let msg = ConversationMessage::user_text("Research metformin");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.text(), "Research metformin");
    }

    #[test]
    fn tool_result_requires_prior_invocation() {
        let mut conv = Conversation::new();
        let err = conv
            .push(ConversationMessage::tool_result("toolu_1", "results"))
            .unwrap_err();
        assert_eq!(err, ConversationError::OrphanToolResult("toolu_1".into()));
        assert!(conv.is_empty());
    }

    #[test]
    fn tool_result_after_invocation_is_accepted() {
        let mut conv = Conversation::new();
        conv.push(ConversationMessage::user_text("go")).unwrap();
        conv.push(ConversationMessage::assistant(vec![
            ContentBlock::text("Searching"),
            tool_use("toolu_1"),
        ]))
        .unwrap();
        conv.push(ConversationMessage::tool_result("toolu_1", "results"))
            .unwrap();
        assert_eq!(conv.len(), 3);
        assert_eq!(conv.last().unwrap().role, Role::User);
    }

    #[test]
    fn text_skips_non_text_blocks() {
        let msg = ConversationMessage::assistant(vec![
            ContentBlock::text("first"),
            tool_use("toolu_9"),
            ContentBlock::text("second"),
        ]);
        assert_eq!(msg.text(), "first\nsecond");
    }

    #[test]
    fn content_block_serializes_with_type_tag() {
        let json = serde_json::to_string(&tool_use("toolu_2")).unwrap();
        assert!(json.contains(r#""type":"tool_use""#));
        let result = ContentBlock::ToolResult {
            tool_use_id: "toolu_2".into(),
            content: "ok".into(),
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains(r#""type":"tool_result""#));
        assert!(json.contains(r#""tool_use_id":"toolu_2""#));
    }
}
