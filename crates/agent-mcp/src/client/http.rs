//! Streamable-HTTP transport MCP client
//!
//! Communicates with a remote MCP server via HTTP POST requests carrying
//! JSON-RPC 2.0 messages. Replies arrive as JSON or as a short SSE stream.

use super::{
    HttpReply, MCPServerInfo, MCPToolDefinition, MCPToolResult, decode_reply, initialize_params,
    parse_server_info, parse_tool_result, parse_tools, rpc_notification, rpc_request,
};
use crate::Result;
use crate::config::MCPServerConfig;
use crate::error::MCPError;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde_json::{Value, json};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::Duration;
use tracing::{debug, info, instrument};

const SESSION_HEADER: &str = "mcp-session-id";

/// MCP client using the streamable-HTTP transport
///
/// Every operation has an async and a blocking form. Both share request
/// framing, reply decoding and the session id handed out by the server.
pub struct HttpMCPClient {
    config: MCPServerConfig,

    /// Async HTTP client
    http_client: reqwest::Client,

    /// Blocking HTTP client, built on first blocking call
    blocking: OnceLock<reqwest::blocking::Client>,

    /// Session id assigned by the server on initialize
    session: Mutex<Option<String>>,

    /// Server info from initialization
    server_info: Mutex<Option<MCPServerInfo>>,

    /// Request ID counter
    request_id: AtomicU64,
}

impl std::fmt::Debug for HttpMCPClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpMCPClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HttpMCPClient {
    /// Create a client for `config`
    ///
    /// No request is sent until [`Self::connect`] or
    /// [`Self::connect_blocking`].
    pub fn new(config: MCPServerConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MCPError::ConfigError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config,
            http_client,
            blocking: OnceLock::new(),
            session: Mutex::new(None),
            server_info: Mutex::new(None),
            request_id: AtomicU64::new(0),
        })
    }

    /// Server configuration
    pub fn config(&self) -> &MCPServerConfig {
        &self.config
    }

    /// Whether initialize has completed
    pub fn is_connected(&self) -> bool {
        self.server_info().is_some()
    }

    /// Server info from initialize, once connected
    pub fn server_info(&self) -> Option<MCPServerInfo> {
        self.server_info.lock().ok().and_then(|info| info.clone())
    }

    /// Run the initialize handshake
    #[instrument(skip(self), fields(url = %self.config.redacted_url()))]
    pub async fn connect(&self) -> Result<MCPServerInfo> {
        let result = self.send("initialize", initialize_params()).await?;
        let info = parse_server_info(&result);

        let notification = self.post(&rpc_notification("notifications/initialized")).await;
        if let Err(e) = notification {
            debug!(error = %e, "initialized notification not delivered");
        }

        Ok(self.connected(info))
    }

    /// Run the initialize handshake on the calling thread
    #[instrument(skip(self), fields(url = %self.config.redacted_url()))]
    pub fn connect_blocking(&self) -> Result<MCPServerInfo> {
        agent_utils::run_blocking(|| {
            let result = self.send_blocking("initialize", initialize_params())?;
            let info = parse_server_info(&result);

            let notification =
                self.post_blocking(&rpc_notification("notifications/initialized"));
            if let Err(e) = notification {
                debug!(error = %e, "initialized notification not delivered");
            }

            Ok(self.connected(info))
        })
    }

    /// List the server's tools
    pub async fn list_tools(&self) -> Result<Vec<MCPToolDefinition>> {
        self.ensure_connected()?;
        parse_tools(self.send("tools/list", json!({})).await?)
    }

    /// List the server's tools on the calling thread
    pub fn list_tools_blocking(&self) -> Result<Vec<MCPToolDefinition>> {
        self.ensure_connected()?;
        agent_utils::run_blocking(|| parse_tools(self.send_blocking("tools/list", json!({}))?))
    }

    /// Call a tool
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<MCPToolResult> {
        self.ensure_connected()?;
        let params = json!({"name": name, "arguments": arguments});
        parse_tool_result(self.send("tools/call", params).await?)
    }

    /// Call a tool on the calling thread
    pub fn call_tool_blocking(&self, name: &str, arguments: Value) -> Result<MCPToolResult> {
        self.ensure_connected()?;
        let params = json!({"name": name, "arguments": arguments});
        agent_utils::run_blocking(|| parse_tool_result(self.send_blocking("tools/call", params)?))
    }

    fn connected(&self, info: MCPServerInfo) -> MCPServerInfo {
        info!(
            server = %info.name,
            version = %info.version,
            protocol = %info.protocol_version,
            "Connected to MCP server"
        );
        if let Ok(mut slot) = self.server_info.lock() {
            *slot = Some(info.clone());
        }
        info
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(MCPError::NotConnected)
        }
    }

    fn next_request_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Build HTTP headers
    fn build_headers(&self) -> Result<HeaderMap> {
        let mut header_map = HeaderMap::new();
        header_map.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        header_map.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/event-stream"),
        );

        for (key, value) in &self.config.headers {
            let name = HeaderName::from_str(key).map_err(|e| {
                MCPError::ConfigError(format!("Invalid header name '{key}': {e}"))
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                MCPError::ConfigError(format!("Invalid header value for '{key}': {e}"))
            })?;
            header_map.insert(name, value);
        }

        let session = self.session.lock().ok().and_then(|s| s.clone());
        if let Some(session) = session {
            let value = HeaderValue::from_str(&session)
                .map_err(|e| MCPError::UnexpectedResponse(format!("Invalid session id: {e}")))?;
            header_map.insert(SESSION_HEADER, value);
        }

        Ok(header_map)
    }

    fn remember_session(&self, reply: &HttpReply) {
        if let Some(id) = &reply.session_id {
            if let Ok(mut session) = self.session.lock() {
                if session.as_ref() != Some(id) {
                    debug!("MCP session established");
                    *session = Some(id.clone());
                }
            }
        }
    }

    async fn send(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_request_id();
        debug!(method, id, "Sending MCP request");
        let reply = self.post(&rpc_request(id, method, params)).await?;
        self.remember_session(&reply);
        decode_reply(method, id, &reply)
    }

    fn send_blocking(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_request_id();
        debug!(method, id, "Sending blocking MCP request");
        let reply = self.post_blocking(&rpc_request(id, method, params))?;
        self.remember_session(&reply);
        decode_reply(method, id, &reply)
    }

    async fn post(&self, payload: &Value) -> Result<HttpReply> {
        let response = self
            .http_client
            .post(&self.config.url)
            .headers(self.build_headers()?)
            .json(payload)
            .send()
            .await?;

        let (status, content_type, session_id) = reply_meta(response.status(), response.headers());
        Ok(HttpReply {
            status,
            content_type,
            session_id,
            body: response.text().await?,
        })
    }

    fn post_blocking(&self, payload: &Value) -> Result<HttpReply> {
        let response = self
            .blocking_client()?
            .post(&self.config.url)
            .headers(self.build_headers()?)
            .json(payload)
            .send()?;

        let (status, content_type, session_id) = reply_meta(response.status(), response.headers());
        Ok(HttpReply {
            status,
            content_type,
            session_id,
            body: response.text()?,
        })
    }

    fn blocking_client(&self) -> Result<&reqwest::blocking::Client> {
        if let Some(client) = self.blocking.get() {
            return Ok(client);
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .build()
            .map_err(|e| MCPError::ConfigError(format!("Failed to create HTTP client: {e}")))?;
        let _ = self.blocking.set(client);
        self.blocking
            .get()
            .ok_or_else(|| MCPError::ConfigError("blocking HTTP client unavailable".into()))
    }
}

fn reply_meta(
    status: reqwest::StatusCode,
    headers: &HeaderMap,
) -> (u16, Option<String>, Option<String>) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    (
        status.as_u16(),
        header(CONTENT_TYPE.as_str()),
        header(SESSION_HEADER),
    )
}
