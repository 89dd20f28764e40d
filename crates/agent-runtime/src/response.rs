//! Result of one agent run

use agent_llm::Message;
use serde::{Deserialize, Serialize};

/// Full conversation produced by a run, in order
///
/// Starts with the caller's messages and ends with the final assistant turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    /// Every message of the run, caller input included
    pub messages: Vec<Message>,
}

impl AgentResponse {
    /// Wrap a finished conversation
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// The last message, if any
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Text of the last message
    ///
    /// `None` when the conversation is empty or the last message carries
    /// no text (for example a bare tool-call turn).
    pub fn last_text(&self) -> Option<&str> {
        self.last().and_then(Message::text)
    }
}
