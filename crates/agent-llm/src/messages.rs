//! Message types for LLM communication
//!
//! A conversation is a list of role-tagged messages. Content is either
//! plain text or a list of blocks, which is how tool calls and tool results
//! travel between the model and the runtime.

use serde::{Deserialize, Serialize};

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User message
    User,
    /// Assistant message
    Assistant,
    /// System message (handled separately in some providers)
    System,
}

/// Content block in a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text content
    Text {
        /// Text content
        text: String,
    },

    /// Tool use request from assistant
    ToolUse {
        /// Unique ID for this tool use
        id: String,
        /// Tool name
        name: String,
        /// Tool input parameters (JSON)
        input: serde_json::Value,
    },

    /// Tool result sent back to the assistant
    ToolResult {
        /// ID of the tool use this is responding to
        tool_use_id: String,
        /// Result content
        content: String,
        /// Whether this is an error result
        #[serde(skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
}

/// Message content: either simple text or structured blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Simple text content
    Text(String),
    /// Structured content blocks
    Blocks(Vec<ContentBlock>),
}

/// A tool invocation requested by the assistant
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    /// Provider-assigned call ID
    pub id: String,
    /// Name of the tool to run
    pub name: String,
    /// Arguments as produced by the model
    pub input: serde_json::Value,
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message role
    pub role: Role,

    /// Message content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<MessageContent>,
}

impl Message {
    /// Create a user message with text
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(MessageContent::Text(text.into())),
        }
    }

    /// Create an assistant message with text
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: Some(MessageContent::Text(text.into())),
        }
    }

    /// Create a system message with text
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: Some(MessageContent::Text(text.into())),
        }
    }

    /// Create a user message carrying a tool result
    pub fn tool_result(tool_use_id: impl Into<String>, result: impl Into<String>) -> Self {
        Self::tool_block(tool_use_id.into(), result.into(), None)
    }

    /// Create a user message carrying a failed tool result
    pub fn tool_error(tool_use_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self::tool_block(tool_use_id.into(), error.into(), Some(true))
    }

    fn tool_block(tool_use_id: String, content: String, is_error: Option<bool>) -> Self {
        Self {
            role: Role::User,
            content: Some(MessageContent::Blocks(vec![ContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            }])),
        }
    }

    /// First text content of the message, if any
    ///
    /// Empty text blocks are skipped so a tool-only assistant turn reports
    /// no text.
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            Some(MessageContent::Text(s)) => Some(s),
            Some(MessageContent::Blocks(blocks)) => blocks.iter().find_map(|b| match b {
                ContentBlock::Text { text } if !text.is_empty() => Some(text.as_str()),
                _ => None,
            }),
            None => None,
        }
    }

    /// Tool calls requested by this message
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        match &self.content {
            Some(MessageContent::Blocks(blocks)) => blocks
                .iter()
                .filter_map(|b| match b {
                    ContentBlock::ToolUse { id, name, input } => Some(ToolCall {
                        id: id.clone(),
                        name: name.clone(),
                        input: input.clone(),
                    }),
                    _ => None,
                })
                .collect(),
            _ => vec![],
        }
    }

    /// Check if this message contains any tool calls
    pub fn has_tool_calls(&self) -> bool {
        matches!(
            &self.content,
            Some(MessageContent::Blocks(blocks))
                if blocks.iter().any(|b| matches!(b, ContentBlock::ToolUse { .. }))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_message() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.text(), Some("Hello"));
    }

    #[test]
    fn test_tool_result_has_no_calls() {
        let msg = Message::tool_result("call_1", "price: 10");
        assert_eq!(msg.role, Role::User);
        assert!(!msg.has_tool_calls());
        assert_eq!(msg.text(), None);
    }

    #[test]
    fn test_tool_calls_extracted_in_order() {
        let msg = Message {
            role: Role::Assistant,
            content: Some(MessageContent::Blocks(vec![
                ContentBlock::Text {
                    text: String::new(),
                },
                ContentBlock::ToolUse {
                    id: "a".to_string(),
                    name: "get_stock_info".to_string(),
                    input: json!({"ticker": "AAPL"}),
                },
                ContentBlock::ToolUse {
                    id: "b".to_string(),
                    name: "yahoo_finance_news".to_string(),
                    input: json!({"ticker": "AAPL"}),
                },
            ])),
        };

        assert!(msg.has_tool_calls());
        assert_eq!(msg.text(), None);
        let names: Vec<_> = msg.tool_calls().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["get_stock_info", "yahoo_finance_news"]);
    }

    #[test]
    fn test_error_flag_serialization() {
        let ok = serde_json::to_value(Message::tool_result("x", "fine")).unwrap();
        assert!(ok["content"][0].get("is_error").is_none());

        let err = serde_json::to_value(Message::tool_error("x", "bad")).unwrap();
        assert_eq!(err["content"][0]["is_error"], json!(true));
    }
}
