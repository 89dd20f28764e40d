//! Where the research tools come from
//!
//! A hosted Yahoo Finance MCP server is tried first. When none is
//! configured, or it cannot be reached, or it lists no tools, the agent
//! falls back to the direct Yahoo Finance tools.

use super::default_registry;
use crate::api::MarketDataProvider;
use crate::error::Result;
use crate::prompts::{MCP_SYSTEM_PROMPT, SYSTEM_PROMPT};
use agent_mcp::{HttpMCPClient, MCPServerConfig, MCPTool};
use agent_tools::ToolRegistry;
use std::sync::Arc;
use tracing::{info, warn};

/// Hosted Yahoo Finance MCP server
pub const YAHOO_MCP_BASE: &str =
    "https://server.smithery.ai/@hwangwoohyun-nav/yahoo-finance-mcp/mcp";

/// Hosted server URL carrying `api_key`
pub fn yahoo_mcp_url(api_key: &str) -> String {
    format!("{YAHOO_MCP_BASE}?api_key={api_key}")
}

/// Which tool set the agent ended up with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolSource {
    /// Tools listed by an MCP server
    Mcp {
        /// Server name from initialize
        server: String,
    },
    /// Built-in Yahoo Finance tools
    Direct,
}

impl ToolSource {
    /// System prompt that names this source's tools
    pub fn default_prompt(&self) -> &'static str {
        match self {
            Self::Mcp { .. } => MCP_SYSTEM_PROMPT,
            Self::Direct => SYSTEM_PROMPT,
        }
    }
}

/// Resolved tool set
#[derive(Debug)]
pub struct ResearchTools {
    pub registry: ToolRegistry,
    pub source: ToolSource,
}

impl ResearchTools {
    /// Built-in tools over `provider`
    pub fn direct(provider: Arc<dyn MarketDataProvider>) -> Result<Self> {
        Ok(Self {
            registry: default_registry(provider)?,
            source: ToolSource::Direct,
        })
    }

    fn from_mcp(client: &HttpMCPClient, tools: Vec<MCPTool>) -> Option<Self> {
        if tools.is_empty() {
            warn!(url = %client.config().redacted_url(), "MCP server listed no tools");
            return None;
        }

        let registry = tools
            .into_iter()
            .fold(ToolRegistry::builder(), |builder, tool| {
                builder.register(Arc::new(tool))
            })
            .build();
        let registry = match registry {
            Ok(registry) => registry,
            Err(e) => {
                warn!(error = %e, "MCP tools unusable");
                return None;
            }
        };

        let server = client
            .server_info()
            .map_or_else(|| "unknown".to_string(), |info| info.name);
        info!(%server, tools = registry.len(), "Using MCP server tools");
        Some(Self {
            registry,
            source: ToolSource::Mcp { server },
        })
    }
}

/// MCP tools when available, otherwise the built-in tools over `provider`
pub async fn resolve_tools(
    mcp: Option<&MCPServerConfig>,
    provider: Arc<dyn MarketDataProvider>,
) -> Result<ResearchTools> {
    if let Some(config) = mcp {
        match HttpMCPClient::new(config.clone()).map(Arc::new) {
            Ok(client) => match agent_mcp::discover_tools(Arc::clone(&client)).await {
                Ok(tools) => {
                    if let Some(resolved) = ResearchTools::from_mcp(&client, tools) {
                        return Ok(resolved);
                    }
                }
                Err(e) => unavailable(config, &e),
            },
            Err(e) => unavailable(config, &e),
        }
    }

    ResearchTools::direct(provider)
}

/// Blocking form of [`resolve_tools`]
pub fn resolve_tools_blocking(
    mcp: Option<&MCPServerConfig>,
    provider: Arc<dyn MarketDataProvider>,
) -> Result<ResearchTools> {
    if let Some(config) = mcp {
        match HttpMCPClient::new(config.clone()).map(Arc::new) {
            Ok(client) => match agent_mcp::discover_tools_blocking(Arc::clone(&client)) {
                Ok(tools) => {
                    if let Some(resolved) = ResearchTools::from_mcp(&client, tools) {
                        return Ok(resolved);
                    }
                }
                Err(e) => unavailable(config, &e),
            },
            Err(e) => unavailable(config, &e),
        }
    }

    ResearchTools::direct(provider)
}

fn unavailable(config: &MCPServerConfig, err: &agent_mcp::MCPError) {
    warn!(
        url = %config.redacted_url(),
        error = %err,
        "MCP server unavailable, falling back to direct Yahoo Finance tools"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::YahooFinanceClient;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider() -> Arc<dyn MarketDataProvider> {
        Arc::new(YahooFinanceClient::new().unwrap())
    }

    async fn mcp_server(tools: serde_json::Value) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "initialize"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": {
                    "protocolVersion": "2025-03-26",
                    "serverInfo": {"name": "yahoo-finance", "version": "0.3.1"}
                }
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "notifications/initialized"})))
            .respond_with(ResponseTemplate::new(202))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "tools/list"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 2,
                "result": {"tools": tools}
            })))
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn test_hosted_url() {
        assert_eq!(
            yahoo_mcp_url("abc"),
            "https://server.smithery.ai/@hwangwoohyun-nav/yahoo-finance-mcp/mcp?api_key=abc"
        );
    }

    #[tokio::test]
    async fn test_mcp_tools_preferred() {
        let server = mcp_server(json!([
            {"name": "get_stock_info", "inputSchema": {"type": "object"}},
            {"name": "get_stock_actions", "inputSchema": {"type": "object"}}
        ]))
        .await;
        let config = MCPServerConfig::new(server.uri());

        let tools = resolve_tools(Some(&config), provider()).await.unwrap();
        assert_eq!(
            tools.source,
            ToolSource::Mcp {
                server: "yahoo-finance".to_string()
            }
        );
        assert_eq!(tools.registry.names(), vec!["get_stock_info", "get_stock_actions"]);
        assert_eq!(tools.source.default_prompt(), MCP_SYSTEM_PROMPT);
    }

    #[tokio::test]
    async fn test_unreachable_server_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;
        let config = MCPServerConfig::new(server.uri());

        let tools = resolve_tools(Some(&config), provider()).await.unwrap();
        assert_eq!(tools.source, ToolSource::Direct);
        assert_eq!(tools.registry.len(), 6);
    }

    #[tokio::test]
    async fn test_empty_tool_list_falls_back() {
        let server = mcp_server(json!([])).await;
        let config = MCPServerConfig::new(server.uri());

        let tools = tokio::task::spawn_blocking(move || {
            resolve_tools_blocking(Some(&config), provider())
        })
        .await
        .unwrap()
        .unwrap();
        assert_eq!(tools.source, ToolSource::Direct);
    }

    #[test]
    fn test_no_server_configured() {
        let tools = resolve_tools_blocking(None, provider()).unwrap();
        assert_eq!(tools.source, ToolSource::Direct);
        assert_eq!(tools.source.default_prompt(), SYSTEM_PROMPT);
        assert_eq!(tools.registry.names()[0], "get_stock_info");
    }
}
