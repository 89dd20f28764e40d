//! Stock research tools for LLM agents

pub mod finance;
pub mod format;
pub mod source;

pub use finance::FinanceTool;
pub use source::{
    ResearchTools, ToolSource, YAHOO_MCP_BASE, resolve_tools, resolve_tools_blocking, yahoo_mcp_url,
};

use crate::api::{Action, MarketDataProvider};
use agent_tools::ToolRegistry;
use std::sync::Arc;

/// Tool order as advertised to the model
pub const TOOL_ACTIONS: [Action; 6] = [
    Action::Quote,
    Action::History,
    Action::Financials,
    Action::Ratios,
    Action::Analyst,
    Action::News,
];

/// Build the research tool set over one data provider
pub fn default_registry(
    provider: Arc<dyn MarketDataProvider>,
) -> agent_core::Result<ToolRegistry> {
    TOOL_ACTIONS
        .into_iter()
        .fold(ToolRegistry::builder(), |builder, action| {
            builder.register(Arc::new(FinanceTool::new(action, Arc::clone(&provider))))
        })
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::YahooFinanceClient;

    #[test]
    fn test_default_registry_order() {
        let provider = Arc::new(YahooFinanceClient::new().unwrap());
        let registry = default_registry(provider).unwrap();

        assert_eq!(
            registry.names(),
            vec![
                "get_stock_info",
                "get_stock_history",
                "get_financial_statements",
                "calculate_financial_ratios",
                "get_analyst_recommendations",
                "yahoo_finance_news",
            ]
        );
    }
}
