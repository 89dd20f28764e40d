//! Research entry points

use crate::api::{MarketDataProvider, YahooFinanceClient};
use crate::config::ResearchConfig;
use crate::error::{Result, StockError};
use crate::state::ResearchState;
use crate::tools::{self, ResearchTools};
use agent_core::Agent;
use agent_llm::providers::{OpenAIConfig, OpenAIProvider};
use agent_runtime::{AgentResponse, AgentRuntime, ReactAgent};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Stock research agent
///
/// Built once and shared by reference. Both entry points run the same
/// state preparation and answer extraction; they differ only in how the
/// runtime is driven.
///
/// # Example
///
/// ```no_run
/// use stock_research::{ResearchConfig, StockResearcher};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ResearchConfig::from_env()?;
/// let researcher = StockResearcher::from_config(&config)?;
/// println!("{}", researcher.research_stock("AAPL", None)?);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct StockResearcher {
    runtime: Arc<dyn AgentRuntime>,
}

impl std::fmt::Debug for StockResearcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StockResearcher").finish_non_exhaustive()
    }
}

impl StockResearcher {
    /// Wrap any agent runtime
    pub fn new(runtime: Arc<dyn AgentRuntime>) -> Self {
        Self { runtime }
    }

    /// OpenAI-compatible model over the configured tool source
    ///
    /// Tries the MCP server in `config.mcp` first and falls back to the
    /// direct Yahoo Finance tools. Tool discovery runs on the calling thread.
    pub fn from_config(config: &ResearchConfig) -> Result<Self> {
        config.validate()?;
        let provider = Arc::new(YahooFinanceClient::new()?);
        let tools = tools::resolve_tools_blocking(config.mcp.as_ref(), provider)?;
        Self::assemble(config, tools)
    }

    /// [`Self::from_config`] with tool discovery suspending on network I/O
    pub async fn from_config_async(config: &ResearchConfig) -> Result<Self> {
        config.validate()?;
        let provider = Arc::new(YahooFinanceClient::new()?);
        let tools = tools::resolve_tools(config.mcp.as_ref(), provider).await?;
        Self::assemble(config, tools)
    }

    /// OpenAI-compatible model over a custom market data provider
    ///
    /// Always uses the direct tools; `config.mcp` is ignored.
    pub fn with_data_provider(
        config: &ResearchConfig,
        provider: Arc<dyn MarketDataProvider>,
    ) -> Result<Self> {
        config.validate()?;
        Self::assemble(config, ResearchTools::direct(provider)?)
    }

    fn assemble(config: &ResearchConfig, tools: ResearchTools) -> Result<Self> {
        let llm = chat_model(config)?;
        let prompt = config
            .system_prompt
            .as_deref()
            .unwrap_or_else(|| tools.source.default_prompt());

        let agent = ReactAgent::builder()
            .provider(Arc::new(llm))
            .tool_registry(Arc::new(tools.registry))
            .model(config.model.as_str())
            .system_prompt(prompt)
            .max_tokens(config.max_tokens)
            .temperature(config.temperature)
            .max_iterations(config.max_iterations)
            .build()?;

        info!(model = %config.model, source = ?tools.source, "Stock researcher ready");
        Ok(Self::new(Arc::new(agent)))
    }

    /// Research `symbol` on the calling thread
    ///
    /// Without a query, asks for a general analysis of the symbol.
    pub fn research_stock(&self, symbol: &str, query: Option<&str>) -> Result<String> {
        self.research_state(&ResearchState::new(symbol, query)?)
    }

    /// Research `symbol`, suspending on network I/O
    pub async fn research_stock_async(&self, symbol: &str, query: Option<&str>) -> Result<String> {
        self.research_state_async(&ResearchState::new(symbol, query)?)
            .await
    }

    /// Run a prepared state on the calling thread
    ///
    /// Callable from any thread. Inside an async runtime the blocking I/O
    /// is moved off the runtime's scheduler, but the caller still waits,
    /// so async code should prefer [`Self::research_state_async`].
    #[instrument(skip_all, fields(symbol = %state.symbol()))]
    pub fn research_state(&self, state: &ResearchState) -> Result<String> {
        let response = self.runtime.invoke_blocking(state.initial_messages())?;
        Ok(final_text(&response))
    }

    /// Run a prepared state, suspending on network I/O
    #[instrument(skip_all, fields(symbol = %state.symbol()))]
    pub async fn research_state_async(&self, state: &ResearchState) -> Result<String> {
        let response = self.runtime.invoke(state.initial_messages()).await?;
        Ok(final_text(&response))
    }
}

/// OpenAI-compatible chat model described by `config`
pub(crate) fn chat_model(config: &ResearchConfig) -> Result<OpenAIProvider> {
    let mut llm_config =
        OpenAIConfig::new(config.api_key.as_str()).with_api_base(config.api_base.as_str());
    if let Some(secs) = config.request_timeout_secs {
        llm_config = llm_config.with_timeout(secs);
    }
    Ok(OpenAIProvider::with_config(llm_config)?)
}

/// Text of the final message
///
/// A response that ends without text is returned serialized rather than
/// treated as a failure.
pub fn final_text(response: &AgentResponse) -> String {
    if let Some(text) = response.last_text() {
        return text.to_string();
    }

    warn!(
        messages = response.messages.len(),
        "Agent response has no final text, returning it raw"
    );
    serde_json::to_string(response).unwrap_or_else(|_| format!("{response:?}"))
}

/// A `SYMBOL [question...]` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResearchRequest {
    pub symbol: String,
    pub query: Option<String>,
}

impl ResearchRequest {
    /// Split a line into symbol and optional question
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        let (symbol, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        if symbol.is_empty() {
            return Err(StockError::InvalidRequest(
                "expected: SYMBOL [question]".to_string(),
            ));
        }

        let query = rest.trim();
        Ok(Self {
            symbol: symbol.to_string(),
            query: (!query.is_empty()).then(|| query.to_string()),
        })
    }
}

#[async_trait]
impl Agent for StockResearcher {
    async fn process(&self, input: String) -> agent_core::Result<String> {
        let request = ResearchRequest::parse(&input)?;
        let answer = self
            .research_stock_async(&request.symbol, request.query.as_deref())
            .await?;
        Ok(answer)
    }

    fn name(&self) -> &str {
        "stock_research_agent"
    }
}
