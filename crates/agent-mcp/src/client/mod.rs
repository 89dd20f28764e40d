//! MCP client and wire types
//!
//! JSON-RPC 2.0 framing and reply decoding live here, free of I/O, so the
//! async and blocking transports in [`http`] share them.

use crate::Result;
use crate::error::MCPError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub mod http;

/// Protocol revision sent in `initialize`
pub const PROTOCOL_VERSION: &str = "2025-03-26";

/// MCP tool definition (from tools/list)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MCPToolDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "inputSchema", default = "empty_schema")]
    pub input_schema: Value,
}

fn empty_schema() -> Value {
    json!({"type": "object", "properties": {}})
}

/// MCP tool result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MCPToolResult {
    #[serde(default)]
    pub content: Vec<MCPContent>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "isError")]
    pub is_error: Option<bool>,
}

impl MCPToolResult {
    /// Content flattened to text
    ///
    /// Text blocks are joined by newlines; other blocks become a short
    /// bracketed note so the model knows they were there.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(|block| match block {
                MCPContent::Text { text } => text.clone(),
                MCPContent::Image { data, mime_type } => {
                    format!("[image: {mime_type}, {} bytes]", data.len())
                }
                MCPContent::Resource { resource } => match &resource.text {
                    Some(text) => text.clone(),
                    None => format!("[resource: {}]", resource.uri),
                },
                MCPContent::Other => "[unsupported content]".to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// MCP content block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MCPContent {
    Text {
        text: String,
    },
    Image {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
    Resource {
        resource: MCPEmbeddedResource,
    },
    #[serde(other)]
    Other,
}

/// Resource embedded in a tool result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MCPEmbeddedResource {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// MCP server info (from initialize)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MCPServerInfo {
    pub name: String,
    pub version: String,
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
}

/// Raw HTTP reply, before JSON-RPC decoding
#[derive(Debug, Clone)]
pub(crate) struct HttpReply {
    pub status: u16,
    pub content_type: Option<String>,
    pub session_id: Option<String>,
    pub body: String,
}

pub(crate) fn rpc_request(id: u64, method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params
    })
}

pub(crate) fn rpc_notification(method: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": method
    })
}

pub(crate) fn initialize_params() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {},
        "clientInfo": {
            "name": "agent-rs",
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

/// The `result` of the reply to request `id`
///
/// Streamable-HTTP servers answer either with a JSON body or with an SSE
/// stream whose `data:` lines carry the JSON-RPC messages.
pub(crate) fn decode_reply(method: &str, id: u64, reply: &HttpReply) -> Result<Value> {
    if !(200..300).contains(&reply.status) {
        return Err(MCPError::RequestFailed(format!(
            "HTTP {} for {method}: {}",
            reply.status,
            reply.body.trim()
        )));
    }

    let is_sse = reply
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.starts_with("text/event-stream"));
    let messages = if is_sse {
        sse_messages(&reply.body)
    } else {
        vec![serde_json::from_str::<Value>(&reply.body).map_err(|e| {
            MCPError::UnexpectedResponse(format!("{method} reply is not JSON: {e}"))
        })?]
    };

    let message = messages
        .into_iter()
        .find(|m| m.get("id").and_then(Value::as_u64) == Some(id))
        .ok_or_else(|| MCPError::UnexpectedResponse(format!("no reply to {method} (id {id})")))?;

    if let Some(error) = message.get("error") {
        return Err(MCPError::RequestFailed(format!("{method}: {error}")));
    }

    message
        .get("result")
        .cloned()
        .ok_or_else(|| MCPError::UnexpectedResponse(format!("{method} reply has no result")))
}

/// JSON payloads of an SSE body; events that are not JSON are skipped
fn sse_messages(body: &str) -> Vec<Value> {
    let mut messages = Vec::new();
    let mut data = String::new();

    for line in body.lines().chain(std::iter::once("")) {
        if line.is_empty() {
            if !data.is_empty() {
                if let Ok(value) = serde_json::from_str(&data) {
                    messages.push(value);
                }
                data.clear();
            }
        } else if let Some(chunk) = line.strip_prefix("data:") {
            if !data.is_empty() {
                data.push('\n');
            }
            data.push_str(chunk.strip_prefix(' ').unwrap_or(chunk));
        }
    }

    messages
}

pub(crate) fn parse_server_info(result: &Value) -> MCPServerInfo {
    let field = |value: &Value, fallback: &str| value.as_str().unwrap_or(fallback).to_string();
    MCPServerInfo {
        name: field(&result["serverInfo"]["name"], "unknown"),
        version: field(&result["serverInfo"]["version"], "unknown"),
        protocol_version: field(&result["protocolVersion"], PROTOCOL_VERSION),
    }
}

pub(crate) fn parse_tools(mut result: Value) -> Result<Vec<MCPToolDefinition>> {
    let tools = result
        .get_mut("tools")
        .map(Value::take)
        .ok_or_else(|| MCPError::UnexpectedResponse("tools/list reply has no tools".into()))?;
    Ok(serde_json::from_value(tools)?)
}

pub(crate) fn parse_tool_result(result: Value) -> Result<MCPToolResult> {
    Ok(serde_json::from_value(result)?)
}
