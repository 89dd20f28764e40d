//! Tool trait definition

use agent_core::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Trait for tools that agents can execute
///
/// A tool turns model-produced JSON arguments into a text observation that
/// is fed back into the conversation. Each tool offers the same operation
/// over both transports so the runtime can drive it from async code or
/// from a plain thread.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Execute the tool, suspending on I/O
    ///
    /// Argument problems should surface as
    /// [`agent_core::Error::InvalidToolInput`] so the runtime can report
    /// them to the model instead of aborting the run.
    async fn execute(&self, params: Value) -> Result<String>;

    /// Execute the tool on the calling thread
    fn execute_blocking(&self, params: Value) -> Result<String>;

    /// Get the tool's name
    ///
    /// Must be unique within a ToolRegistry
    fn name(&self) -> &str;

    /// Get the tool's description
    ///
    /// This description helps the LLM understand when to use this tool
    fn description(&self) -> &str;

    /// Get the tool's input schema (JSON Schema format)
    fn input_schema(&self) -> Value;
}
