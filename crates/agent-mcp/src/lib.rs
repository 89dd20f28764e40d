//! Model Context Protocol (MCP) integration for agent-rs
//!
//! This crate lets agents use tools served by a remote MCP server over the
//! streamable-HTTP transport:
//! - Connect and run the initialize handshake
//! - Discover tools and wrap them as [`agent_tools::Tool`]s
//! - Call them from async code or from plain threads
//!
//! # Example
//!
//! ```no_run
//! use agent_mcp::{HttpMCPClient, MCPServerConfig, discover_tools};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MCPServerConfig::new("https://server.example.com/mcp");
//! let client = Arc::new(HttpMCPClient::new(config)?);
//!
//! let tools = discover_tools(client).await?;
//! println!("Discovered {} tools", tools.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod tool;

// Re-export commonly used types
pub use client::http::HttpMCPClient;
pub use client::{MCPContent, MCPServerInfo, MCPToolDefinition, MCPToolResult};
pub use config::MCPServerConfig;
pub use error::MCPError;
pub use tool::{MCPTool, discover_tools, discover_tools_blocking};

/// Result type for MCP operations
pub type Result<T> = std::result::Result<T, MCPError>;
