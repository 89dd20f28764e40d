//! Error types for agent-core

use thiserror::Error;

/// Result type alias for agent-core
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for agent operations
#[derive(Error, Debug)]
pub enum Error {
    /// Agent initialization failed
    #[error("Agent initialization failed: {0}")]
    InitializationFailed(String),

    /// Agent processing failed
    #[error("Agent processing failed: {0}")]
    ProcessingFailed(String),

    /// The model sent arguments a tool cannot accept.
    ///
    /// Recoverable: the runtime reports it back to the model as an error
    /// tool result instead of aborting the conversation.
    #[error("Invalid tool input: {0}")]
    InvalidToolInput(String),

    /// The tool ran but its backing service reported the call as failed
    ///
    /// Recoverable like [`Error::InvalidToolInput`]: the report goes back
    /// to the model, which may try something else.
    #[error("Tool '{tool}' reported an error: {message}")]
    ToolRejected {
        /// Name of the tool
        tool: String,
        /// What the service reported
        message: String,
    },

    /// A tool hit a hard failure in its backing service
    #[error("Tool '{tool}' failed: {message}")]
    ToolFailed {
        /// Name of the failing tool
        tool: String,
        /// Underlying failure description
        message: String,
    },
}

impl Error {
    /// Whether the agent loop may hand this error back to the model and continue
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidToolInput(_) | Self::ToolRejected { .. })
    }
}
