//! LLM provider trait definition

use crate::{CompletionRequest, CompletionResponse, Result};
use async_trait::async_trait;

/// Trait for LLM providers
///
/// Providers expose two independent transports for the same request:
/// an async one for callers already inside a runtime, and a blocking one
/// for plain threads. Implementations share request encoding and response
/// decoding between them and differ only in how bytes move.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a completion, suspending on network I/O
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Generate a completion, blocking the calling thread
    ///
    /// Safe to call from any thread, including from inside an async
    /// runtime; implementations move the blocking I/O out of the way with
    /// [`agent_utils::run_blocking`] when they need to.
    fn complete_blocking(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Get the provider name (e.g., "openai")
    fn name(&self) -> &str;
}
