//! Core Agent trait definition

use crate::Result;
use async_trait::async_trait;

/// Core trait for anything that turns a text request into a text answer
///
/// Implementations own whatever configuration they need; no shared mutable
/// state is threaded through calls, so one instance can serve concurrent
/// requests.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Process input and return output
    async fn process(&self, input: String) -> Result<String>;

    /// Get the agent's name
    fn name(&self) -> &str;
}
