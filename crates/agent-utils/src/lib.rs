//! Shared utilities for agent-rs
//!
//! This crate provides common functionality used across the agent-rs workspace,
//! including logging setup, environment configuration and blocking helpers.

pub mod env;
pub mod logging;
pub mod runtime;

pub use env::{EnvError, load_dotenv, optional_with, require_with};
pub use logging::init_tracing_with;
pub use runtime::run_blocking;
