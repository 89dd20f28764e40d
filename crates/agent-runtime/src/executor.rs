//! The agent loop
//!
//! [`AgentLoop`] implements the reason-act pattern without touching the
//! network:
//! 1. Build a completion request from the conversation and tool set
//! 2. Consume the model's response
//! 3. If tools were requested, record each tool outcome and go back to 1
//! 4. Otherwise the run is finished
//!
//! Drivers own the I/O. They ask the loop for the next request, perform
//! it, and hand the response back, which is what lets the async and the
//! blocking driver share every decision the loop makes.

use crate::AgentResponse;
use agent_core::{Error, Result};
use agent_llm::{
    CompletionRequest, CompletionResponse, Message, StopReason, ToolCall, ToolDefinition,
};
use agent_tools::ToolRegistry;
use tracing::{debug, info, warn};

/// Final assistant message when the iteration budget runs out
pub const MAX_ITERATIONS_MESSAGE: &str = "Max iterations reached without completion";

/// Final assistant message when the model stops on the token limit without text
pub const TRUNCATED_MESSAGE: &str = "Response truncated due to token limit";

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Configuration for agent execution
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum number of model turns (prevents infinite loops)
    pub max_iterations: usize,

    /// Model to use
    pub model: String,

    /// System prompt
    pub system_prompt: Option<String>,

    /// Max tokens per completion
    pub max_tokens: usize,

    /// Temperature
    pub temperature: Option<f32>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            model: "gpt-4o-mini".to_string(),
            system_prompt: None,
            max_tokens: 4096,
            temperature: Some(0.7),
        }
    }
}

/// What the driver should do after a response has been consumed
#[derive(Debug, Clone, PartialEq)]
pub enum LoopStep {
    /// The conversation is complete
    Finished,
    /// Run these tools, in order, then ask for the next request
    CallTools(Vec<ToolCall>),
}

/// Sans-IO state of one agent run
#[derive(Debug)]
pub struct AgentLoop {
    config: ExecutorConfig,
    tools: Vec<ToolDefinition>,
    conversation: Vec<Message>,
    iteration: usize,
}

impl AgentLoop {
    /// Start a run over the given opening messages
    pub fn new(config: ExecutorConfig, registry: &ToolRegistry, messages: Vec<Message>) -> Self {
        let tools = registry
            .iter()
            .map(|tool| ToolDefinition::new(tool.name(), tool.description(), tool.input_schema()))
            .collect();

        Self {
            config,
            tools,
            conversation: messages,
            iteration: 0,
        }
    }

    /// Number of completion requests issued so far
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Conversation so far
    pub fn messages(&self) -> &[Message] {
        &self.conversation
    }

    /// Build the next completion request
    ///
    /// Returns `None` once the iteration budget is spent; the conversation
    /// then ends with [`MAX_ITERATIONS_MESSAGE`].
    pub fn next_request(&mut self) -> Option<CompletionRequest> {
        if self.iteration >= self.config.max_iterations {
            warn!(
                max_iterations = self.config.max_iterations,
                "Max iterations reached, stopping"
            );
            self.conversation
                .push(Message::assistant(MAX_ITERATIONS_MESSAGE));
            return None;
        }

        self.iteration += 1;
        info!(
            iteration = self.iteration,
            max_iterations = self.config.max_iterations,
            "Agent iteration started"
        );

        let mut builder = CompletionRequest::builder(&self.config.model)
            .messages(self.conversation.clone())
            .system(
                self.config
                    .system_prompt
                    .as_deref()
                    .unwrap_or(DEFAULT_SYSTEM_PROMPT),
            )
            .max_tokens(self.config.max_tokens)
            .tools(self.tools.clone());
        if let Some(temperature) = self.config.temperature {
            builder = builder.temperature(temperature);
        }

        debug!(
            model = %self.config.model,
            tool_count = self.tools.len(),
            messages = self.conversation.len(),
            "Sending request to LLM"
        );
        Some(builder.build())
    }

    /// Consume the model's response
    pub fn on_response(&mut self, response: CompletionResponse) -> LoopStep {
        info!(
            stop_reason = ?response.stop_reason,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "LLM response received"
        );

        let calls = response.message.tool_calls();
        let has_text = response.message.text().is_some();
        self.conversation.push(response.message);

        // Some gateways report "stop" alongside tool calls; the calls win.
        if !calls.is_empty() {
            info!(tool_count = calls.len(), "Agent requested tool use");
            return LoopStep::CallTools(calls);
        }

        match response.stop_reason {
            StopReason::MaxTokens if !has_text => {
                warn!("Hit max tokens in LLM response");
                self.conversation.push(Message::assistant(TRUNCATED_MESSAGE));
            }
            StopReason::ToolUse => warn!("Tool use stop reason without tool calls"),
            _ => {}
        }

        info!(iteration = self.iteration, "Agent completed");
        LoopStep::Finished
    }

    /// Record the outcome of one tool call
    ///
    /// Recoverable failures (bad arguments, unknown tool) are reported back
    /// to the model as an error result. Anything else aborts the run.
    pub fn on_tool_outcome(&mut self, call: &ToolCall, outcome: Result<String>) -> Result<()> {
        match outcome {
            Ok(output) => {
                let preview: String = output.chars().take(200).collect();
                debug!(
                    tool_name = %call.name,
                    result_length = output.len(),
                    result_preview = %preview,
                    "Tool execution succeeded"
                );
                self.conversation
                    .push(Message::tool_result(call.id.clone(), output));
                Ok(())
            }
            Err(e) if e.is_recoverable() => {
                warn!(tool_name = %call.name, error = %e, "Tool rejected input");
                self.conversation
                    .push(Message::tool_error(call.id.clone(), format!("Error: {e}")));
                Ok(())
            }
            Err(e) => {
                warn!(tool_name = %call.name, error = %e, "Tool execution failed");
                Err(e)
            }
        }
    }

    /// End the run and hand back the conversation
    pub fn finish(self) -> AgentResponse {
        AgentResponse::new(self.conversation)
    }
}

/// Error used when the model names a tool the registry does not hold
pub(crate) fn unknown_tool(name: &str) -> Error {
    Error::InvalidToolInput(format!("unknown tool: {name}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_llm::{ContentBlock, MessageContent, Role, TokenUsage};
    use serde_json::json;

    fn reply(message: Message, stop_reason: StopReason) -> CompletionResponse {
        CompletionResponse {
            message,
            stop_reason,
            usage: TokenUsage::default(),
        }
    }

    fn tool_turn(name: &str) -> Message {
        Message {
            role: Role::Assistant,
            content: Some(MessageContent::Blocks(vec![ContentBlock::ToolUse {
                id: "call_1".to_string(),
                name: name.to_string(),
                input: json!({"ticker": "AAPL"}),
            }])),
        }
    }

    fn new_loop(max_iterations: usize) -> AgentLoop {
        let config = ExecutorConfig {
            max_iterations,
            system_prompt: Some("analyst".to_string()),
            ..ExecutorConfig::default()
        };
        AgentLoop::new(config, &ToolRegistry::default(), vec![Message::user("hi")])
    }

    #[test]
    fn test_default_config() {
        let config = ExecutorConfig::default();
        assert_eq!(config.max_iterations, 10);
        assert_eq!(config.max_tokens, 4096);
    }

    #[test]
    fn test_request_carries_conversation() {
        let mut agent_loop = new_loop(3);
        let request = agent_loop.next_request().unwrap();

        assert_eq!(request.system.as_deref(), Some("analyst"));
        assert_eq!(request.messages, vec![Message::user("hi")]);
        assert!(request.tools.is_none());
        assert_eq!(agent_loop.iteration(), 1);
    }

    #[test]
    fn test_text_reply_finishes() {
        let mut agent_loop = new_loop(3);
        agent_loop.next_request();

        let step = agent_loop.on_response(reply(Message::assistant("done"), StopReason::EndTurn));
        assert_eq!(step, LoopStep::Finished);
        assert_eq!(agent_loop.finish().last_text(), Some("done"));
    }

    #[test]
    fn test_tool_calls_then_results() {
        let mut agent_loop = new_loop(3);
        agent_loop.next_request();

        let step = agent_loop.on_response(reply(tool_turn("get_stock_info"), StopReason::ToolUse));
        let LoopStep::CallTools(calls) = step else {
            panic!("expected tool calls");
        };
        assert_eq!(calls[0].name, "get_stock_info");

        agent_loop
            .on_tool_outcome(&calls[0], Ok("Price: 10".to_string()))
            .unwrap();
        let request = agent_loop.next_request().unwrap();
        assert_eq!(request.messages.len(), 3);
        assert_eq!(request.messages[2], Message::tool_result("call_1", "Price: 10"));
    }

    #[test]
    fn test_recoverable_tool_error_is_reported() {
        let mut agent_loop = new_loop(3);
        let call = ToolCall {
            id: "x".to_string(),
            name: "nope".to_string(),
            input: json!({}),
        };

        agent_loop
            .on_tool_outcome(&call, Err(unknown_tool("nope")))
            .unwrap();
        assert_eq!(
            agent_loop.messages().last(),
            Some(&Message::tool_error("x", "Error: Invalid tool input: unknown tool: nope"))
        );
    }

    #[test]
    fn test_hard_tool_error_propagates() {
        let mut agent_loop = new_loop(3);
        let call = ToolCall {
            id: "x".to_string(),
            name: "get_stock_info".to_string(),
            input: json!({}),
        };

        let result = agent_loop.on_tool_outcome(
            &call,
            Err(Error::ToolFailed {
                tool: "get_stock_info".to_string(),
                message: "connection reset".to_string(),
            }),
        );
        assert!(matches!(result, Err(Error::ToolFailed { .. })));
    }

    #[test]
    fn test_max_iterations() {
        let mut agent_loop = new_loop(1);
        agent_loop.next_request().unwrap();
        agent_loop.on_response(reply(tool_turn("get_stock_info"), StopReason::ToolUse));

        assert!(agent_loop.next_request().is_none());
        assert_eq!(agent_loop.finish().last_text(), Some(MAX_ITERATIONS_MESSAGE));
    }

    #[test]
    fn test_truncated_without_text() {
        let mut agent_loop = new_loop(2);
        agent_loop.next_request();
        let empty = Message {
            role: Role::Assistant,
            content: Some(MessageContent::Blocks(vec![])),
        };

        assert_eq!(
            agent_loop.on_response(reply(empty, StopReason::MaxTokens)),
            LoopStep::Finished
        );
        assert_eq!(agent_loop.finish().last_text(), Some(TRUNCATED_MESSAGE));
    }
}
