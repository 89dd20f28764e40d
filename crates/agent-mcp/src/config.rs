//! Configuration for a remote MCP server

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// A streamable-HTTP MCP server
///
/// Hosted servers often carry their API key in the URL, so `Debug` and
/// [`MCPServerConfig::redacted_url`] drop the query string.
///
/// # Example
///
/// ```json
/// {
///   "url": "https://server.example.com/mcp?api_key=...",
///   "headers": {"X-Client": "stock-research"},
///   "timeout_secs": 30
/// }
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MCPServerConfig {
    /// Server endpoint
    pub url: String,

    /// Extra HTTP headers sent with every request
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl MCPServerConfig {
    /// Server at `url` with default settings
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: HashMap::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Add a header sent with every request
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// URL without its query string, safe to log
    pub fn redacted_url(&self) -> &str {
        self.url.split_once('?').map_or(&self.url, |(base, _)| base)
    }
}

impl fmt::Debug for MCPServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MCPServerConfig")
            .field("url", &self.redacted_url())
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
