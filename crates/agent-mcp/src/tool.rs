//! MCPTool wrapper that implements the Tool trait

use agent_core::Error;
use agent_tools::Tool;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::Result;
use crate::client::http::HttpMCPClient;
use crate::client::{MCPToolDefinition, MCPToolResult};

/// Wrapper that implements agent-tools::Tool for a remote MCP tool
///
/// - Arguments must be a JSON object; anything else is bad tool input the
///   model can correct.
/// - A result flagged `isError` becomes [`Error::ToolRejected`] carrying the
///   server's text, so the model sees it and the run continues.
/// - Transport and protocol failures become [`Error::ToolFailed`].
pub struct MCPTool {
    definition: MCPToolDefinition,
    client: Arc<HttpMCPClient>,
}

impl MCPTool {
    /// Bind `definition` to the client that listed it
    pub fn new(definition: MCPToolDefinition, client: Arc<HttpMCPClient>) -> Self {
        Self { definition, client }
    }

    /// Definition as listed by the server
    pub fn definition(&self) -> &MCPToolDefinition {
        &self.definition
    }

    fn check_params(&self, params: &Value) -> agent_core::Result<()> {
        if params.is_object() {
            Ok(())
        } else {
            Err(Error::InvalidToolInput(format!(
                "{} expects a JSON object, got: {params}",
                self.definition.name
            )))
        }
    }

    fn finish(&self, outcome: Result<MCPToolResult>) -> agent_core::Result<String> {
        let result = outcome.map_err(|e| Error::ToolFailed {
            tool: self.definition.name.clone(),
            message: e.to_string(),
        })?;

        if result.is_error.unwrap_or(false) {
            return Err(Error::ToolRejected {
                tool: self.definition.name.clone(),
                message: result.text(),
            });
        }

        Ok(result.text())
    }
}

#[async_trait]
impl Tool for MCPTool {
    async fn execute(&self, params: Value) -> agent_core::Result<String> {
        self.check_params(&params)?;
        debug!(tool = %self.definition.name, "Calling MCP tool");
        let outcome = self.client.call_tool(&self.definition.name, params).await;
        self.finish(outcome)
    }

    fn execute_blocking(&self, params: Value) -> agent_core::Result<String> {
        self.check_params(&params)?;
        debug!(tool = %self.definition.name, "Calling MCP tool");
        let outcome = self.client.call_tool_blocking(&self.definition.name, params);
        self.finish(outcome)
    }

    fn name(&self) -> &str {
        &self.definition.name
    }

    fn description(&self) -> &str {
        self.definition.description.as_deref().unwrap_or("")
    }

    fn input_schema(&self) -> Value {
        self.definition.input_schema.clone()
    }
}

/// Connect if needed and wrap every tool the server lists
pub async fn discover_tools(client: Arc<HttpMCPClient>) -> Result<Vec<MCPTool>> {
    if !client.is_connected() {
        client.connect().await?;
    }
    let definitions = client.list_tools().await?;
    Ok(wrap(definitions, &client))
}

/// Blocking form of [`discover_tools`]
pub fn discover_tools_blocking(client: Arc<HttpMCPClient>) -> Result<Vec<MCPTool>> {
    if !client.is_connected() {
        client.connect_blocking()?;
    }
    let definitions = client.list_tools_blocking()?;
    Ok(wrap(definitions, &client))
}

fn wrap(definitions: Vec<MCPToolDefinition>, client: &Arc<HttpMCPClient>) -> Vec<MCPTool> {
    debug!(count = definitions.len(), "Discovered MCP tools");
    definitions
        .into_iter()
        .map(|definition| MCPTool::new(definition, Arc::clone(client)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MCPServerConfig;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn server_with_tools() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "initialize"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": {
                    "protocolVersion": "2025-03-26",
                    "serverInfo": {"name": "yahoo-finance", "version": "1.0.0"}
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
                "result": {"tools": [{
                    "name": "get_stock_info",
                    "description": "Current quote and company profile",
                    "inputSchema": {
                        "type": "object",
                        "properties": {"ticker": {"type": "string"}},
                        "required": ["ticker"]
                    }
                }]}
            })))
            .mount(&server)
            .await;
        server
    }

    fn client(server: &MockServer) -> Arc<HttpMCPClient> {
        Arc::new(HttpMCPClient::new(MCPServerConfig::new(server.uri())).unwrap())
    }

    #[tokio::test]
    async fn test_discover_and_execute() {
        let server = server_with_tools().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "tools/call"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 3,
                "result": {"content": [{"type": "text", "text": "AAPL: 189.50 USD"}]}
            })))
            .mount(&server)
            .await;

        let tools = discover_tools(client(&server)).await.unwrap();
        assert_eq!(tools.len(), 1);
        let tool = &tools[0];
        assert_eq!(tool.name(), "get_stock_info");
        assert_eq!(tool.description(), "Current quote and company profile");
        assert_eq!(tool.input_schema()["required"], json!(["ticker"]));

        let out = tool.execute(json!({"ticker": "AAPL"})).await.unwrap();
        assert_eq!(out, "AAPL: 189.50 USD");
    }

    #[tokio::test]
    async fn test_error_result_is_recoverable() {
        let server = server_with_tools().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "tools/call"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 3,
                "result": {
                    "content": [{"type": "text", "text": "Unknown ticker: ZZZZ"}],
                    "isError": true
                }
            })))
            .mount(&server)
            .await;

        let tools = discover_tools(client(&server)).await.unwrap();
        let err = tools[0].execute(json!({"ticker": "ZZZZ"})).await.unwrap_err();
        assert!(matches!(&err, Error::ToolRejected { message, .. } if message == "Unknown ticker: ZZZZ"));
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_non_object_arguments_rejected_without_request() {
        let server = server_with_tools().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "tools/call"})))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let tools = discover_tools(client(&server)).await.unwrap();
        let err = tools[0]
            .execute(json!(r#"{"ticker": "AAPL""#))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidToolInput(_)));
    }

    #[tokio::test]
    async fn test_transport_failure_is_fatal() {
        let server = server_with_tools().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "tools/call"})))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let tools = discover_tools(client(&server)).await.unwrap();
        let err = tools[0].execute(json!({"ticker": "AAPL"})).await.unwrap_err();
        assert!(matches!(err, Error::ToolFailed { ref tool, .. } if tool == "get_stock_info"));
        assert!(!err.is_recoverable());
    }

    #[tokio::test]
    async fn test_blocking_discovery() {
        let server = server_with_tools().await;
        let client = client(&server);

        let tools = tokio::task::spawn_blocking(move || discover_tools_blocking(client))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(tools[0].name(), "get_stock_info");
    }
}
