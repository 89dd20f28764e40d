//! Core abstractions for agent-rs
//!
//! Defines the `Agent` trait and the error type shared by the LLM, tool,
//! runtime and stock research crates.

pub mod agent;
pub mod error;

pub use agent::Agent;
pub use error::{Error, Result};
