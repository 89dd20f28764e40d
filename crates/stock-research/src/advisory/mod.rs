//! Multi-agent investment advisory
//!
//! Turns a [`ClientProfile`] into a researched portfolio: profile
//! assessment, portfolio construction, per-asset stock research and a
//! final refinement. Stages exchange validated JSON records.

pub mod models;
pub mod pipeline;
pub mod prompts;

pub use models::{
    Asset, ClientProfile, ClientSummary, FinancialStatement, KeyPoint, Portfolio, Rating,
    RatioAnalysis, Risk, StockReport, Validate, Valuation, parse_reply,
};
pub use pipeline::{AdvisoryPipeline, Advice, StageOutput};
