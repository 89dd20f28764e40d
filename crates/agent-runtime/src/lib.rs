//! Agent runtime for agent-rs
//!
//! This crate drives the reason-act loop between an LLM provider and a
//! tool registry. The loop itself ([`AgentLoop`]) performs no I/O; the
//! [`ReactAgent`] drivers feed it through either the async or the
//! blocking transports and expose the result through [`AgentRuntime`].

pub mod agents;
pub mod executor;
pub mod response;
pub mod runtime;

// Re-export key types
pub use agents::{ReactAgent, ReactAgentBuilder};
pub use executor::{AgentLoop, ExecutorConfig, LoopStep, MAX_ITERATIONS_MESSAGE};
pub use response::AgentResponse;
pub use runtime::AgentRuntime;
