//! Reason-act agent over an LLM provider and a tool registry

use crate::executor::{AgentLoop, ExecutorConfig, LoopStep, unknown_tool};
use crate::{AgentResponse, AgentRuntime};
use agent_core::{Error, Result};
use agent_llm::{LLMProvider, Message, ToolCall};
use agent_tools::ToolRegistry;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

/// Agent that alternates model turns and tool calls until the model answers
///
/// Holds no per-run state, so one instance serves any number of concurrent
/// runs. Each run is an [`AgentLoop`] driven either by [`ReactAgent::run`]
/// or by [`ReactAgent::run_blocking`].
///
/// # Example
///
/// ```no_run
/// use agent_llm::Message;
/// use agent_llm::providers::OpenAIProvider;
/// use agent_runtime::ReactAgent;
/// use agent_tools::ToolRegistry;
/// use std::sync::Arc;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let agent = ReactAgent::builder()
///     .provider(Arc::new(OpenAIProvider::new("sk-...")?))
///     .tool_registry(Arc::new(ToolRegistry::default()))
///     .system_prompt("You are a research analyst")
///     .build()?;
///
/// let response = agent.run_blocking(vec![Message::user("Summarize AAPL")])?;
/// println!("{:?}", response.last_text());
/// # Ok(())
/// # }
/// ```
pub struct ReactAgent {
    provider: Arc<dyn LLMProvider>,
    tool_registry: Arc<ToolRegistry>,
    config: ExecutorConfig,
}

impl ReactAgent {
    /// Create a new agent
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        tool_registry: Arc<ToolRegistry>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            provider,
            tool_registry,
            config,
        }
    }

    /// Create a new builder
    pub fn builder() -> ReactAgentBuilder {
        ReactAgentBuilder::new()
    }

    /// Get the executor configuration
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Get the tool registry
    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tool_registry
    }

    fn start(&self, messages: Vec<Message>) -> AgentLoop {
        AgentLoop::new(self.config.clone(), &self.tool_registry, messages)
    }

    /// Run the conversation to completion on the async transports
    #[instrument(skip_all, fields(provider = self.provider.name()))]
    pub async fn run(&self, messages: Vec<Message>) -> Result<AgentResponse> {
        let mut agent_loop = self.start(messages);

        while let Some(request) = agent_loop.next_request() {
            let response = self.provider.complete(request).await?;
            let LoopStep::CallTools(calls) = agent_loop.on_response(response) else {
                break;
            };
            for call in calls {
                let outcome = self.call_tool(&call).await;
                agent_loop.on_tool_outcome(&call, outcome)?;
            }
        }

        Ok(agent_loop.finish())
    }

    /// Run the conversation to completion on the calling thread
    #[instrument(skip_all, fields(provider = self.provider.name()))]
    pub fn run_blocking(&self, messages: Vec<Message>) -> Result<AgentResponse> {
        let mut agent_loop = self.start(messages);

        while let Some(request) = agent_loop.next_request() {
            let response = self.provider.complete_blocking(request)?;
            let LoopStep::CallTools(calls) = agent_loop.on_response(response) else {
                break;
            };
            for call in calls {
                let outcome = self.call_tool_blocking(&call);
                agent_loop.on_tool_outcome(&call, outcome)?;
            }
        }

        Ok(agent_loop.finish())
    }

    async fn call_tool(&self, call: &ToolCall) -> Result<String> {
        let tool = self
            .tool_registry
            .get(&call.name)
            .ok_or_else(|| unknown_tool(&call.name))?;

        info!(tool_name = %call.name, tool_id = %call.id, "Executing tool");
        let start = Instant::now();
        let outcome = tool.execute(call.input.clone()).await;
        info!(
            tool_name = %call.name,
            duration_ms = start.elapsed().as_millis() as u64,
            ok = outcome.is_ok(),
            "Tool finished"
        );
        outcome
    }

    fn call_tool_blocking(&self, call: &ToolCall) -> Result<String> {
        let tool = self
            .tool_registry
            .get(&call.name)
            .ok_or_else(|| unknown_tool(&call.name))?;

        info!(tool_name = %call.name, tool_id = %call.id, "Executing tool");
        let start = Instant::now();
        let outcome = tool.execute_blocking(call.input.clone());
        info!(
            tool_name = %call.name,
            duration_ms = start.elapsed().as_millis() as u64,
            ok = outcome.is_ok(),
            "Tool finished"
        );
        outcome
    }
}

#[async_trait]
impl AgentRuntime for ReactAgent {
    async fn invoke(&self, messages: Vec<Message>) -> Result<AgentResponse> {
        self.run(messages).await
    }

    fn invoke_blocking(&self, messages: Vec<Message>) -> Result<AgentResponse> {
        self.run_blocking(messages)
    }
}

/// Builder for ReactAgent
pub struct ReactAgentBuilder {
    provider: Option<Arc<dyn LLMProvider>>,
    tool_registry: Arc<ToolRegistry>,
    config: ExecutorConfig,
}

impl ReactAgentBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            provider: None,
            tool_registry: Arc::new(ToolRegistry::default()),
            config: ExecutorConfig::default(),
        }
    }

    /// Set the LLM provider
    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the tool registry
    pub fn tool_registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.tool_registry = registry;
        self
    }

    /// Set the full configuration
    pub fn config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set maximum iterations
    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    /// Set the model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the system prompt
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    /// Set max tokens
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.config.max_tokens = max_tokens;
        self
    }

    /// Set temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = Some(temperature);
        self
    }

    /// Build the agent
    pub fn build(self) -> Result<ReactAgent> {
        let provider = self
            .provider
            .ok_or_else(|| Error::InitializationFailed("Provider not set".to_string()))?;

        if self.config.max_iterations == 0 {
            return Err(Error::InitializationFailed(
                "max_iterations must be at least 1".to_string(),
            ));
        }

        Ok(ReactAgent::new(provider, self.tool_registry, self.config))
    }
}

impl Default for ReactAgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MAX_ITERATIONS_MESSAGE;
    use agent_llm::{
        CompletionRequest, CompletionResponse, ContentBlock, MessageContent, Role, StopReason,
        TokenUsage,
    };
    use agent_tools::Tool;
    use serde_json::{Value, json};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned responses and records every request it sees
    #[derive(Default)]
    struct ScriptedProvider {
        replies: Mutex<VecDeque<CompletionResponse>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedProvider {
        fn new(replies: Vec<Message>) -> Self {
            let replies = replies
                .into_iter()
                .map(|message| CompletionResponse {
                    stop_reason: if message.has_tool_calls() {
                        StopReason::ToolUse
                    } else {
                        StopReason::EndTurn
                    },
                    message,
                    usage: TokenUsage::default(),
                })
                .collect();
            Self {
                replies: Mutex::new(replies),
                requests: Mutex::default(),
            }
        }

        fn next(&self, request: CompletionRequest) -> agent_llm::Result<CompletionResponse> {
            self.requests.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| agent_llm::LLMError::RequestFailed("script exhausted".into()))
        }
    }

    #[async_trait]
    impl LLMProvider for ScriptedProvider {
        async fn complete(&self, request: CompletionRequest) -> agent_llm::Result<CompletionResponse> {
            self.next(request)
        }

        fn complete_blocking(
            &self,
            request: CompletionRequest,
        ) -> agent_llm::Result<CompletionResponse> {
            self.next(request)
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    /// Echoes the ticker back, or fails hard on "BOOM"
    struct QuoteTool;

    impl QuoteTool {
        fn answer(params: &Value) -> Result<String> {
            match params.get("ticker").and_then(Value::as_str) {
                Some("BOOM") => Err(Error::ToolFailed {
                    tool: "quote".to_string(),
                    message: "upstream down".to_string(),
                }),
                Some(t) => Ok(format!("{t}: 42.00")),
                None => Err(Error::InvalidToolInput("ticker is required".to_string())),
            }
        }
    }

    #[async_trait]
    impl Tool for QuoteTool {
        async fn execute(&self, params: Value) -> Result<String> {
            Self::answer(&params)
        }

        fn execute_blocking(&self, params: Value) -> Result<String> {
            Self::answer(&params)
        }

        fn name(&self) -> &str {
            "quote"
        }

        fn description(&self) -> &str {
            "Latest quote"
        }

        fn input_schema(&self) -> Value {
            json!({"type": "object"})
        }
    }

    fn call(name: &str, input: Value) -> Message {
        Message {
            role: Role::Assistant,
            content: Some(MessageContent::Blocks(vec![ContentBlock::ToolUse {
                id: format!("id-{name}"),
                name: name.to_string(),
                input,
            }])),
        }
    }

    fn agent(provider: Arc<ScriptedProvider>, max_iterations: usize) -> ReactAgent {
        let registry = ToolRegistry::builder()
            .register(Arc::new(QuoteTool))
            .build()
            .unwrap();
        ReactAgent::builder()
            .provider(provider)
            .tool_registry(Arc::new(registry))
            .max_iterations(max_iterations)
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_provider() {
        assert!(matches!(
            ReactAgent::builder().build(),
            Err(Error::InitializationFailed(_))
        ));
    }

    #[test]
    fn test_builder_rejects_zero_iterations() {
        let provider = Arc::new(ScriptedProvider::default());
        let result = ReactAgent::builder()
            .provider(provider)
            .max_iterations(0)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_blocking_tool_round_trip() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            call("quote", json!({"ticker": "AAPL"})),
            Message::assistant("AAPL trades at 42"),
        ]));
        let agent = agent(Arc::clone(&provider), 5);

        let response = agent.run_blocking(vec![Message::user("price?")]).unwrap();
        assert_eq!(response.last_text(), Some("AAPL trades at 42"));

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].tools.as_ref().map(Vec::len), Some(1));
        assert_eq!(
            requests[1].messages.last(),
            Some(&Message::tool_result("id-quote", "AAPL: 42.00"))
        );
    }

    #[tokio::test]
    async fn test_async_matches_blocking_shape() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            call("quote", json!({"ticker": "AAPL"})),
            Message::assistant("AAPL trades at 42"),
        ]));
        let agent = agent(provider, 5);

        let response = agent.invoke(vec![Message::user("price?")]).await.unwrap();
        assert_eq!(response.messages.len(), 4);
        assert_eq!(response.last_text(), Some("AAPL trades at 42"));
    }

    #[test]
    fn test_unknown_tool_reported_to_model() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            call("missing", json!({})),
            Message::assistant("sorry"),
        ]));
        let agent = agent(Arc::clone(&provider), 5);

        let response = tokio_test::block_on(agent.run(vec![Message::user("x")])).unwrap();
        assert_eq!(response.last_text(), Some("sorry"));

        let requests = provider.requests.lock().unwrap();
        let fed_back = requests[1].messages.last().unwrap();
        assert!(matches!(
            &fed_back.content,
            Some(MessageContent::Blocks(blocks))
                if matches!(&blocks[0], ContentBlock::ToolResult { is_error: Some(true), .. })
        ));
    }

    #[test]
    fn test_hard_tool_failure_propagates() {
        let provider = Arc::new(ScriptedProvider::new(vec![call(
            "quote",
            json!({"ticker": "BOOM"}),
        )]));
        let agent = agent(provider, 5);

        let result = agent.run_blocking(vec![Message::user("x")]);
        assert!(matches!(result, Err(Error::ToolFailed { .. })));
    }

    #[test]
    fn test_iteration_budget() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            call("quote", json!({"ticker": "A"})),
            call("quote", json!({"ticker": "B"})),
        ]));
        let agent = agent(Arc::clone(&provider), 2);

        let response = agent.run_blocking(vec![Message::user("x")]).unwrap();
        assert_eq!(response.last_text(), Some(MAX_ITERATIONS_MESSAGE));
        assert_eq!(provider.requests.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_malformed_arguments_reported_to_model() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            call("quote", json!(r#"{"ticker": "AAPL""#)),
            Message::assistant("retrying was not needed"),
        ]));
        let agent = agent(Arc::clone(&provider), 5);

        let response = agent.run_blocking(vec![Message::user("x")]).unwrap();
        assert_eq!(response.last_text(), Some("retrying was not needed"));

        let requests = provider.requests.lock().unwrap();
        let fed_back = requests[1].messages.last().unwrap();
        assert!(matches!(
            &fed_back.content,
            Some(MessageContent::Blocks(blocks))
                if matches!(&blocks[0], ContentBlock::ToolResult { is_error: Some(true), .. })
        ));
    }

    #[tokio::test]
    async fn test_blocking_run_from_spawn_blocking() {
        let provider = Arc::new(ScriptedProvider::new(vec![Message::assistant("done")]));
        let agent = agent(provider, 1);

        let response = tokio::task::spawn_blocking(move || {
            agent.invoke_blocking(vec![Message::user("x")])
        })
        .await
        .unwrap()
        .unwrap();
        assert_eq!(response.last_text(), Some("done"));
    }
}
