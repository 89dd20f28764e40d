//! Concrete agent implementations

pub mod react;

pub use react::{ReactAgent, ReactAgentBuilder};
