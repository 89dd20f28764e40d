//! Stock research agent
//!
//! Wraps an OpenAI-compatible chat model and a set of Yahoo Finance tools
//! in a reason-act agent:
//!
//! - `get_stock_info`: price, valuation and company overview
//! - `get_stock_history`: recent daily prices
//! - `get_financial_statements`: income, balance sheet and cash flow
//! - `calculate_financial_ratios`: P/E, EV/EBITDA, ROE and friends
//! - `get_analyst_recommendations`: consensus and price targets
//! - `yahoo_finance_news`: latest headlines
//!
//! When a Yahoo Finance MCP server is configured (`YF_API_KEY` or
//! `YAHOO_MCP_URL`), its tools are used instead and the built-in ones stay
//! as the fallback.
//!
//! [`StockResearcher`] is the entry point. It offers a blocking
//! [`StockResearcher::research_stock`] and an async
//! [`StockResearcher::research_stock_async`], which run the same agent loop
//! over independent transports. [`AdvisoryPipeline`] chains it with profile,
//! construction and refinement stages to turn a [`ClientProfile`] into a
//! researched portfolio.
//!
//! # Example
//!
//! ```rust,no_run
//! use stock_research::{ResearchConfig, StockResearcher};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ResearchConfig::from_env()?;
//!     let researcher = StockResearcher::from_config(&config)?;
//!
//!     let report = researcher
//!         .research_stock_async("MSFT", Some("How healthy is the balance sheet?"))
//!         .await?;
//!     println!("{report}");
//!     Ok(())
//! }
//! ```

pub mod advisory;
pub mod api;
pub mod config;
pub mod error;
pub mod prompts;
pub mod research;
pub mod state;
pub mod symbol;
pub mod tools;

pub use advisory::{AdvisoryPipeline, Advice, ClientProfile, Portfolio, StockReport};
pub use api::{DataRequest, MarketData, MarketDataProvider, YahooConfig, YahooFinanceClient};
pub use config::ResearchConfig;
pub use error::{Result, StockError};
pub use prompts::{MCP_SYSTEM_PROMPT, SYSTEM_PROMPT, default_query};
pub use research::{ResearchRequest, StockResearcher, final_text};
pub use state::ResearchState;
pub use symbol::Symbol;
pub use tools::{
    FinanceTool, ResearchTools, ToolSource, default_registry, resolve_tools, resolve_tools_blocking,
};
