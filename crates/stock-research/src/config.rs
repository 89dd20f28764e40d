//! Configuration for the research agent

use crate::error::{Result, StockError};
use crate::tools::yahoo_mcp_url;
use agent_mcp::MCPServerConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Environment variable holding the LLM API key
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
/// Environment variable overriding the LLM endpoint
pub const API_BASE_VAR: &str = "OPENAI_API_BASE";
/// Environment variable overriding the model
pub const MODEL_VAR: &str = "OPENAI_MODEL";
/// Environment variable holding the hosted Yahoo Finance MCP key
pub const YF_API_KEY_VAR: &str = "YF_API_KEY";
/// Environment variable naming an MCP server URL directly
pub const MCP_URL_VAR: &str = "YAHOO_MCP_URL";

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Everything needed to build a [`crate::StockResearcher`]
///
/// Constructed once, validated, then passed by reference.
#[derive(Clone, Serialize, Deserialize)]
pub struct ResearchConfig {
    /// LLM API key; never serialized
    #[serde(skip_serializing, default)]
    pub api_key: String,

    /// OpenAI-compatible endpoint
    pub api_base: String,

    /// Model name
    pub model: String,

    /// Max tokens per completion
    pub max_tokens: usize,

    /// Sampling temperature
    pub temperature: f32,

    /// Model turns allowed per research call
    pub max_iterations: usize,

    /// System prompt handed to the agent; `None` picks the prompt that
    /// matches the tool source in use
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// MCP server tried before the direct Yahoo Finance tools; never
    /// serialized since its URL may carry a key
    #[serde(skip_serializing, default)]
    pub mcp: Option<MCPServerConfig>,

    /// LLM request timeout in seconds; `None` keeps the client default
    pub request_timeout_secs: Option<u64>,
}

impl fmt::Debug for ResearchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResearchConfig")
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("max_iterations", &self.max_iterations)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field(
                "mcp",
                &self.mcp.as_ref().map(MCPServerConfig::redacted_url),
            )
            .finish_non_exhaustive()
    }
}

impl ResearchConfig {
    /// Create a new configuration builder
    pub fn builder() -> ResearchConfigBuilder {
        ResearchConfigBuilder::default()
    }

    /// Load from the process environment, reading `.env` first
    ///
    /// Fails fast when `OPENAI_API_KEY` is absent or blank.
    pub fn from_env() -> Result<Self> {
        agent_utils::load_dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through a custom variable lookup
    ///
    /// `YAHOO_MCP_URL` names an MCP server outright; otherwise `YF_API_KEY`
    /// selects the hosted Yahoo Finance server. With neither, only the
    /// direct tools are used.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = agent_utils::require_with(API_KEY_VAR, &lookup)?;

        let mut builder = Self::builder().api_key(api_key);
        if let Some(base) = agent_utils::optional_with(API_BASE_VAR, &lookup) {
            builder = builder.api_base(base);
        }
        if let Some(model) = agent_utils::optional_with(MODEL_VAR, &lookup) {
            builder = builder.model(model);
        }
        if let Some(url) = agent_utils::optional_with(MCP_URL_VAR, &lookup) {
            builder = builder.mcp_url(url);
        } else if let Some(key) = agent_utils::optional_with(YF_API_KEY_VAR, &lookup) {
            builder = builder.mcp_url(yahoo_mcp_url(&key));
        }
        builder.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(StockError::Config(format!("{API_KEY_VAR} must not be empty")));
        }

        if self.max_iterations == 0 {
            return Err(StockError::Config(
                "max_iterations must be greater than 0".to_string(),
            ));
        }

        if self.max_tokens == 0 {
            return Err(StockError::Config(
                "max_tokens must be greater than 0".to_string(),
            ));
        }

        if let Some(mcp) = &self.mcp {
            if mcp.url.trim().is_empty() {
                return Err(StockError::Config("MCP server url must not be empty".to_string()));
            }
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(StockError::Config(format!(
                "temperature must be within 0.0..=2.0, got {}",
                self.temperature
            )));
        }

        Ok(())
    }
}

/// Builder for ResearchConfig
#[derive(Debug, Default)]
pub struct ResearchConfigBuilder {
    api_key: Option<String>,
    api_base: Option<String>,
    model: Option<String>,
    max_tokens: Option<usize>,
    temperature: Option<f32>,
    max_iterations: Option<usize>,
    system_prompt: Option<String>,
    request_timeout_secs: Option<u64>,
    mcp: Option<MCPServerConfig>,
}

impl ResearchConfigBuilder {
    /// Set the API key
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the endpoint
    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = Some(base.into());
        self
    }

    /// Set the model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set max tokens per completion
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set max model turns per call
    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    /// Replace the system prompt
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Set the LLM request timeout
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs);
        self
    }

    /// Try this MCP server before the direct tools
    pub fn mcp_server(mut self, server: MCPServerConfig) -> Self {
        self.mcp = Some(server);
        self
    }

    /// Try the MCP server at `url` before the direct tools
    pub fn mcp_url(self, url: impl Into<String>) -> Self {
        self.mcp_server(MCPServerConfig::new(url))
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<ResearchConfig> {
        let api_key = self.api_key.ok_or_else(|| {
            StockError::Config(format!(
                "{API_KEY_VAR} is not set; export it or add it to a .env file"
            ))
        })?;

        let config = ResearchConfig {
            api_key,
            api_base: self.api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens: self.max_tokens.unwrap_or(4096),
            temperature: self.temperature.unwrap_or(0.2),
            max_iterations: self.max_iterations.unwrap_or(10),
            system_prompt: self.system_prompt,
            request_timeout_secs: self.request_timeout_secs,
            mcp: self.mcp,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: HashMap<&'static str, &'static str>) -> impl Fn(&str) -> Option<String> {
        move |key| vars.get(key).map(|v| (*v).to_string())
    }

    #[test]
    fn test_defaults() {
        let config = ResearchConfig::builder().api_key("sk-test").build().unwrap();
        assert_eq!(config.api_base, "https://api.openai.com/v1");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.max_tokens, 4096);
        assert_eq!(config.max_iterations, 10);
        assert!((config.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.system_prompt, None);
        assert_eq!(config.mcp, None);
    }

    #[test]
    fn test_missing_key_names_variable() {
        let err = ResearchConfig::from_lookup(lookup(HashMap::new())).unwrap_err();
        assert!(matches!(&err, StockError::Config(msg) if msg.contains("OPENAI_API_KEY")));
    }

    #[test]
    fn test_blank_key_rejected() {
        let err = ResearchConfig::from_lookup(lookup(HashMap::from([(API_KEY_VAR, "   ")])))
            .unwrap_err();
        assert!(matches!(err, StockError::Config(_)));
    }

    #[test]
    fn test_env_overrides() {
        let config = ResearchConfig::from_lookup(lookup(HashMap::from([
            (API_KEY_VAR, "sk-env"),
            (API_BASE_VAR, "http://localhost:1234/v1"),
            (MODEL_VAR, "qwen2.5-7b"),
        ])))
        .unwrap();

        assert_eq!(config.api_key, "sk-env");
        assert_eq!(config.api_base, "http://localhost:1234/v1");
        assert_eq!(config.model, "qwen2.5-7b");
    }

    #[test]
    fn test_validation() {
        assert!(
            ResearchConfig::builder()
                .api_key("k")
                .max_iterations(0)
                .build()
                .is_err()
        );
        assert!(
            ResearchConfig::builder()
                .api_key("k")
                .max_tokens(0)
                .build()
                .is_err()
        );
        assert!(
            ResearchConfig::builder()
                .api_key("k")
                .temperature(2.5)
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = ResearchConfig::builder().api_key("sk-secret").build().unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-secret"));

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("sk-secret"));
    }

    #[test]
    fn test_mcp_from_env() {
        let hosted = ResearchConfig::from_lookup(lookup(HashMap::from([
            (API_KEY_VAR, "sk-env"),
            (YF_API_KEY_VAR, "yf-secret"),
        ])))
        .unwrap();
        let mcp = hosted.mcp.as_ref().unwrap();
        assert_eq!(mcp.url, yahoo_mcp_url("yf-secret"));
        assert!(!format!("{hosted:?}").contains("yf-secret"));
        assert!(!serde_json::to_string(&hosted).unwrap().contains("yf-secret"));

        let explicit = ResearchConfig::from_lookup(lookup(HashMap::from([
            (API_KEY_VAR, "sk-env"),
            (YF_API_KEY_VAR, "yf-secret"),
            (MCP_URL_VAR, "http://localhost:8931/mcp"),
        ])))
        .unwrap();
        assert_eq!(explicit.mcp.unwrap().url, "http://localhost:8931/mcp");

        assert!(
            ResearchConfig::builder()
                .api_key("k")
                .mcp_url(" ")
                .build()
                .is_err()
        );
    }
}
