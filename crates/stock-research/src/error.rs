//! Error types for stock research operations

use thiserror::Error;

/// Stock research specific errors
#[derive(Debug, Error)]
pub enum StockError {
    /// The data provider has nothing for this symbol
    ///
    /// The only failure a tool swallows: it becomes the
    /// `No data available for {symbol}` result.
    #[error("No data available for {symbol}")]
    NoData {
        /// Normalized symbol
        symbol: String,
    },

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid caller input (empty symbol, bad price hint, ...)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Provider answered with an error status
    #[error("Yahoo Finance error: {0}")]
    Provider(String),

    /// A model reply that does not satisfy its schema
    #[error("Validation error: {0}")]
    Validation(String),

    /// Provider answered with something that does not parse
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Failure inside the agent runtime or the LLM provider
    #[error(transparent)]
    Agent(#[from] agent_core::Error),
}

/// Result type alias for stock operations
pub type Result<T> = std::result::Result<T, StockError>;

impl From<agent_utils::EnvError> for StockError {
    fn from(err: agent_utils::EnvError) -> Self {
        StockError::Config(err.to_string())
    }
}

impl From<agent_llm::LLMError> for StockError {
    fn from(err: agent_llm::LLMError) -> Self {
        StockError::Agent(err.into())
    }
}

impl From<serde_json::Error> for StockError {
    fn from(err: serde_json::Error) -> Self {
        StockError::UnexpectedResponse(err.to_string())
    }
}

impl StockError {
    /// Whether this is the provider's "nothing to report" signal
    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData { .. })
    }
}

/// Convert StockError to agent_core::Error
impl From<StockError> for agent_core::Error {
    fn from(err: StockError) -> Self {
        match err {
            StockError::Agent(inner) => inner,
            StockError::InvalidRequest(msg) => agent_core::Error::InvalidToolInput(msg),
            other => agent_core::Error::ProcessingFailed(other.to_string()),
        }
    }
}
