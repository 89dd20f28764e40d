//! OpenAI-compatible chat completions provider
//!
//! Speaks the `/chat/completions` wire format used by OpenAI and by most
//! self-hosted gateways. See: https://platform.openai.com/docs/api-reference/chat
//!
//! Request encoding and response decoding are plain functions shared by the
//! two transports: [`LLMProvider::complete`] goes through an async
//! `reqwest::Client`, [`LLMProvider::complete_blocking`] through a
//! `reqwest::blocking::Client` that is only built on first use.
//!
//! ```no_run
//! use agent_llm::{CompletionRequest, LLMProvider, Message};
//! use agent_llm::providers::{OpenAIConfig, OpenAIProvider};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = OpenAIProvider::with_config(
//!     OpenAIConfig::new("sk-...").with_api_base("http://localhost:8000/v1"),
//! )?;
//!
//! let request = CompletionRequest::builder("gpt-4o-mini")
//!     .add_message(Message::user("Hello!"))
//!     .max_tokens(100)
//!     .build();
//!
//! let response = provider.complete_blocking(request)?;
//! println!("{:?}", response.message.text());
//! # Ok(())
//! # }
//! ```

use crate::{
    CompletionRequest, CompletionResponse, ContentBlock, LLMError, LLMProvider, Message,
    MessageContent, Result, Role, StopReason, TokenUsage, ToolDefinition,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Default endpoint for the hosted OpenAI API
pub const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Configuration for the OpenAI provider
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API key sent as a bearer token
    pub api_key: String,

    /// Base URL, without the trailing `/chat/completions`
    pub api_base: String,

    /// Request timeout in seconds; `None` keeps the HTTP client default
    pub timeout_secs: Option<u64>,
}

impl OpenAIConfig {
    /// Create a config with the given API key and the hosted endpoint
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            timeout_secs: None,
        }
    }

    /// Set custom API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }
}

/// OpenAI chat completions provider
pub struct OpenAIProvider {
    client: Client,
    blocking: OnceLock<reqwest::blocking::Client>,
    config: OpenAIConfig,
}

impl std::fmt::Debug for OpenAIProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIProvider")
            .field("api_base", &self.config.api_base)
            .finish_non_exhaustive()
    }
}

impl OpenAIProvider {
    /// Create a provider with custom configuration
    ///
    /// Only the async client is built here. The blocking client spawns its
    /// own background runtime, so it waits until a blocking call needs it.
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            blocking: OnceLock::new(),
            config,
        })
    }

    /// Create a provider with an API key and default settings
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(OpenAIConfig::new(api_key))
    }

    /// Get the current configuration
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    fn blocking_client(&self) -> Result<&reqwest::blocking::Client> {
        if let Some(client) = self.blocking.get() {
            return Ok(client);
        }

        let mut builder = reqwest::blocking::Client::builder();
        if let Some(secs) = self.config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        // A racing thread may have won; either client is equivalent.
        let _ = self.blocking.set(client);
        self.blocking
            .get()
            .ok_or_else(|| LLMError::ConfigurationError("blocking client unavailable".into()))
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    #[instrument(skip(self, request), fields(model = %request.model, api_base = %self.config.api_base))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let model = request.model.clone();
        let body = encode_request(request);
        debug!(messages = body.messages.len(), "Sending chat completion");

        let response = self
            .client
            .post(self.config.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        decode_response(status.as_u16(), &text, &model)
    }

    #[instrument(skip(self, request), fields(model = %request.model, api_base = %self.config.api_base))]
    fn complete_blocking(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let model = request.model.clone();
        let body = encode_request(request);
        debug!(messages = body.messages.len(), "Sending blocking chat completion");

        let (status, text) = agent_utils::run_blocking(|| -> Result<(u16, String)> {
            let response = self
                .blocking_client()?
                .post(self.config.endpoint())
                .bearer_auth(&self.config.api_key)
                .json(&body)
                .send()?;
            let status = response.status().as_u16();
            Ok((status, response.text()?))
        })?;
        decode_response(status, &text, &model)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAITool>>,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAIToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl OpenAIMessage {
    fn text(role: &'static str, content: String) -> Self {
        Self {
            role,
            content: Some(content),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct OpenAITool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: OpenAIFunction,
}

#[derive(Debug, Serialize)]
struct OpenAIFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    tool_type: String,
    function: OpenAIFunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: OpenAIUsage,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<OpenAIToolCall>>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

// ============================================================================
// Encoding
// ============================================================================

fn encode_request(request: CompletionRequest) -> OpenAIRequest {
    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    if let Some(system) = request.system {
        messages.push(OpenAIMessage::text("system", system));
    }
    for msg in request.messages {
        messages.extend(encode_message(msg));
    }

    OpenAIRequest {
        model: request.model,
        messages,
        max_tokens: request.max_tokens,
        temperature: request.temperature,
        tools: request.tools.as_deref().map(encode_tools),
    }
}

/// One message may fan out: every tool result is its own `tool` message.
fn encode_message(msg: Message) -> Vec<OpenAIMessage> {
    let role = match msg.role {
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::System => "system",
    };

    let blocks = match msg.content {
        Some(MessageContent::Text(text)) => return vec![OpenAIMessage::text(role, text)],
        Some(MessageContent::Blocks(blocks)) => blocks,
        None => return vec![OpenAIMessage::text(role, String::new())],
    };

    let mut text = String::new();
    let mut tool_calls = Vec::new();
    let mut results = Vec::new();

    for block in blocks {
        match block {
            ContentBlock::Text { text: t } => text.push_str(&t),
            ContentBlock::ToolUse { id, name, input } => tool_calls.push(OpenAIToolCall {
                id,
                tool_type: function_type(),
                function: OpenAIFunctionCall {
                    name,
                    arguments: match input {
                        serde_json::Value::String(raw) => raw,
                        other => other.to_string(),
                    },
                },
            }),
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                ..
            } => results.push(OpenAIMessage {
                role: "tool",
                content: Some(content),
                tool_calls: None,
                tool_call_id: Some(tool_use_id),
            }),
        }
    }

    let mut out = Vec::with_capacity(results.len() + 1);
    if !text.is_empty() || !tool_calls.is_empty() {
        out.push(OpenAIMessage {
            role,
            content: (!text.is_empty()).then_some(text),
            tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
            tool_call_id: None,
        });
    }
    out.extend(results);
    out
}

fn encode_tools(tools: &[ToolDefinition]) -> Vec<OpenAITool> {
    tools
        .iter()
        .map(|tool| OpenAITool {
            tool_type: "function",
            function: OpenAIFunction {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.input_schema.clone(),
            },
        })
        .collect()
}

// ============================================================================
// Decoding
// ============================================================================

fn decode_response(status: u16, body: &str, model: &str) -> Result<CompletionResponse> {
    if !(200..300).contains(&status) {
        return Err(match status {
            401 => LLMError::AuthenticationFailed,
            429 => LLMError::RateLimitExceeded(body.to_string()),
            400 => LLMError::InvalidRequest(body.to_string()),
            404 => LLMError::ModelNotFound(model.to_string()),
            _ => LLMError::RequestFailed(format!("HTTP {status}: {body}")),
        });
    }

    let response: OpenAIResponse = serde_json::from_str(body)
        .map_err(|e| LLMError::UnexpectedResponse(format!("Failed to parse response: {e}")))?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LLMError::UnexpectedResponse("No choices in response".to_string()))?;

    let finish_reason = choice.finish_reason.unwrap_or_default();
    debug!(
        finish_reason = %finish_reason,
        input_tokens = response.usage.prompt_tokens,
        output_tokens = response.usage.completion_tokens,
        "Received chat completion"
    );

    Ok(CompletionResponse {
        message: decode_message(choice.message),
        stop_reason: map_stop_reason(&finish_reason),
        usage: TokenUsage {
            input_tokens: response.usage.prompt_tokens,
            output_tokens: response.usage.completion_tokens,
        },
    })
}

fn decode_message(msg: OpenAIResponseMessage) -> Message {
    let mut blocks = Vec::new();

    if let Some(content) = msg.content.filter(|c| !c.is_empty()) {
        blocks.push(ContentBlock::Text { text: content });
    }

    for call in msg.tool_calls.unwrap_or_default() {
        let input = decode_arguments(&call.function.name, call.function.arguments);

        blocks.push(ContentBlock::ToolUse {
            id: call.id,
            name: call.function.name,
            input,
        });
    }

    Message {
        role: Role::Assistant,
        content: Some(MessageContent::Blocks(blocks)),
    }
}

/// Tool-call arguments as JSON
///
/// Arguments that do not parse are kept as the raw string. Tools reject
/// non-object input as invalid, so the model hears about its mistake
/// instead of the run failing here.
fn decode_arguments(tool: &str, raw: String) -> serde_json::Value {
    // Some gateways send "" for tools that take no arguments.
    if raw.trim().is_empty() {
        return serde_json::Value::Object(serde_json::Map::new());
    }

    serde_json::from_str(&raw).unwrap_or_else(|e| {
        warn!(tool, error = %e, "Tool arguments are not valid JSON, passing them through raw");
        serde_json::Value::String(raw)
    })
}

fn map_stop_reason(reason: &str) -> StopReason {
    match reason {
        "stop" => StopReason::EndTurn,
        "length" => StopReason::MaxTokens,
        "tool_calls" | "function_call" => StopReason::ToolUse,
        other => {
            debug!(reason = other, "Treating finish reason as end of turn");
            StopReason::EndTurn
        }
    }
}
