//! The agent runtime seam
//!
//! Callers hand a runtime the opening messages of a conversation and get
//! back the finished conversation. How the runtime reasons in between
//! (which tools it calls, how many turns it takes) is its own business.

use crate::AgentResponse;
use agent_core::Result;
use agent_llm::Message;
use async_trait::async_trait;

/// Runs a conversation to completion
///
/// Both methods take the same input and must produce equivalent results;
/// they differ only in whether the caller's thread is suspended or
/// blocked while the runtime waits on I/O.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Run the conversation, suspending on provider and tool I/O
    async fn invoke(&self, messages: Vec<Message>) -> Result<AgentResponse>;

    /// Run the conversation on the calling thread
    ///
    /// Callable from any thread, including `spawn_blocking` threads and
    /// runtime workers. Implementations never nest a scheduler; blocking
    /// I/O goes through `agent_utils::run_blocking`.
    fn invoke_blocking(&self, messages: Vec<Message>) -> Result<AgentResponse>;
}
