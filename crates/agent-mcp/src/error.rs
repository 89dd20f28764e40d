//! Error types for MCP operations

use thiserror::Error;

/// Errors that can occur during MCP operations
#[derive(Error, Debug)]
pub enum MCPError {
    /// The server could not be reached
    #[error("MCP connection failed: {0}")]
    ConnectionFailed(String),

    /// Not connected to MCP server
    #[error("Not connected to MCP server")]
    NotConnected,

    /// The server answered with an HTTP or JSON-RPC error
    #[error("MCP request failed: {0}")]
    RequestFailed(String),

    /// The server answered with something that is not a JSON-RPC reply
    #[error("Unexpected MCP response: {0}")]
    UnexpectedResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl From<reqwest::Error> for MCPError {
    fn from(err: reqwest::Error) -> Self {
        MCPError::ConnectionFailed(err.to_string())
    }
}

/// Convert MCPError to agent_core::Error
impl From<MCPError> for agent_core::Error {
    fn from(err: MCPError) -> Self {
        agent_core::Error::ProcessingFailed(err.to_string())
    }
}
