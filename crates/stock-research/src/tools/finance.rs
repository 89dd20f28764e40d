//! Yahoo Finance tools exposed to the agent

use agent_core::{Error, Result as AgentResult};
use agent_llm::tools::schema;
use agent_tools::Tool;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::format;
use crate::api::{Action, DataRequest, MarketData, MarketDataProvider, Period, StatementType};
use crate::error::Result;
use crate::symbol::Symbol;

/// One market-data action wrapped as an agent tool
///
/// Every call normalizes the ticker, performs exactly one provider fetch
/// and renders the payload as text. A provider "no data" answer becomes
/// `No data available for {SYMBOL}`; any other provider failure aborts
/// the run as [`Error::ToolFailed`].
///
/// One fetch is one data request. With [`crate::YahooFinanceClient`] the
/// first quoteSummary-backed fetch on a fresh client also performs the
/// session handshake (cookie, then crumb), so it costs three HTTP requests;
/// every later fetch reuses the session and costs one.
pub struct FinanceTool {
    action: Action,
    provider: Arc<dyn MarketDataProvider>,
}

#[derive(Debug, Deserialize)]
struct FinanceParams {
    #[serde(default, alias = "symbol")]
    ticker: Option<String>,
    #[serde(default)]
    period: Option<String>,
    #[serde(default)]
    statement_type: Option<String>,
}

/// What a call turned into before touching the network
enum Prepared {
    Fetch(DataRequest),
    Reply(String),
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl FinanceTool {
    /// Wrap `action` over `provider`
    pub fn new(action: Action, provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { action, provider }
    }

    /// The action this tool fetches
    pub fn action(&self) -> Action {
        self.action
    }

    fn prepare(&self, params: Value) -> AgentResult<Prepared> {
        let params: FinanceParams = serde_json::from_value(params)
            .map_err(|e| Error::InvalidToolInput(format!("Invalid parameters: {e}")))?;

        let ticker = non_blank(params.ticker)
            .ok_or_else(|| Error::InvalidToolInput("ticker is required".to_string()))?;
        let mut request = DataRequest::new(Symbol::new(ticker)?, self.action);

        match self.action {
            Action::History => {
                if let Some(period) = non_blank(params.period) {
                    request = request.with_period(period.parse::<Period>()?);
                }
            }
            Action::Financials => {
                if let Some(kind) = non_blank(params.statement_type) {
                    match kind.parse::<StatementType>() {
                        Ok(kind) => request = request.with_statement(kind),
                        Err(_) => {
                            return Ok(Prepared::Reply(format!("Invalid statement type: {kind}")));
                        }
                    }
                }
            }
            _ => {}
        }

        Ok(Prepared::Fetch(request))
    }

    fn finish(&self, request: &DataRequest, outcome: Result<MarketData>) -> AgentResult<String> {
        match outcome {
            Ok(data) => Ok(format::render(request, &data).unwrap_or_else(|| {
                warn!(
                    tool = self.name(),
                    symbol = %request.symbol,
                    "Provider payload does not match the requested action"
                );
                request.no_data().to_string()
            })),
            Err(e) if e.is_no_data() => {
                info!(tool = self.name(), symbol = %request.symbol, "No data available");
                Ok(request.no_data().to_string())
            }
            Err(e) => Err(Error::ToolFailed {
                tool: self.name().to_string(),
                message: e.to_string(),
            }),
        }
    }
}

#[async_trait]
impl Tool for FinanceTool {
    async fn execute(&self, params: Value) -> AgentResult<String> {
        let request = match self.prepare(params)? {
            Prepared::Fetch(request) => request,
            Prepared::Reply(text) => return Ok(text),
        };

        debug!(provider = self.provider.name(), ?request, "Fetching market data");
        let outcome = self.provider.fetch(&request).await;
        self.finish(&request, outcome)
    }

    fn execute_blocking(&self, params: Value) -> AgentResult<String> {
        let request = match self.prepare(params)? {
            Prepared::Fetch(request) => request,
            Prepared::Reply(text) => return Ok(text),
        };

        debug!(provider = self.provider.name(), ?request, "Fetching market data");
        let outcome = self.provider.fetch_blocking(&request);
        self.finish(&request, outcome)
    }

    fn name(&self) -> &str {
        match self.action {
            Action::Quote => "get_stock_info",
            Action::History => "get_stock_history",
            Action::Financials => "get_financial_statements",
            Action::Ratios => "calculate_financial_ratios",
            Action::Analyst => "get_analyst_recommendations",
            Action::News => "yahoo_finance_news",
        }
    }

    fn description(&self) -> &str {
        match self.action {
            Action::Quote => {
                "Get comprehensive stock information including current price, market cap, \
                 and company details."
            }
            Action::History => {
                "Get historical stock price data. Period options: 1d, 5d, 1mo, 3mo, 6mo, 1y, \
                 2y, 5y, 10y, ytd, max. Default period should be '3mo'."
            }
            Action::Financials => {
                "Get financial statements. Types: financials, quarterly_financials, \
                 balance_sheet, quarterly_balance_sheet, cashflow, quarterly_cashflow. \
                 Default should be 'financials'."
            }
            Action::Ratios => {
                "Calculate key financial ratios for a stock using available financial data. \
                 Returns 0.0 for ratios that cannot be computed."
            }
            Action::Analyst => {
                "Get analyst recommendations: consensus rating, price targets and the latest \
                 buy/hold/sell counts."
            }
            Action::News => {
                "Useful for when you need to find financial news about a public company. \
                 Input should be a company ticker. For example, AAPL for Apple, MSFT for Microsoft."
            }
        }
    }

    fn input_schema(&self) -> Value {
        let ticker = schema::string("Stock ticker symbol (e.g., 'AAPL', 'GOOGL')");
        let properties = match self.action {
            Action::History => {
                let periods: Vec<&str> = Period::ALL.iter().map(|p| p.as_str()).collect();
                json!({
                    "ticker": ticker,
                    "period": schema::string_enum("History window, default '3mo'", &periods),
                })
            }
            Action::Financials => {
                let kinds: Vec<&str> = StatementType::ALL.iter().map(|t| t.as_str()).collect();
                json!({
                    "ticker": ticker,
                    "statement_type": schema::string_enum(
                        "Statement to fetch, default 'financials'",
                        &kinds,
                    ),
                })
            }
            _ => json!({ "ticker": ticker }),
        };
        schema::object(properties, &["ticker"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{PriceBar, Quote};
    use crate::error::StockError;
    use chrono::NaiveDate;
    use mockall::mock;
    use mockall::predicate::function;

    mock! {
        Provider {}

        #[async_trait]
        impl MarketDataProvider for Provider {
            async fn fetch(&self, request: &DataRequest) -> Result<MarketData>;
            fn fetch_blocking(&self, request: &DataRequest) -> Result<MarketData>;
            fn name(&self) -> &str;
        }
    }

    fn provider() -> MockProvider {
        let mut mock = MockProvider::new();
        mock.expect_name().return_const("mock".to_string());
        mock
    }

    fn tool(action: Action, mock: MockProvider) -> FinanceTool {
        FinanceTool::new(action, Arc::new(mock))
    }

    #[test]
    fn test_tool_metadata() {
        let tool = tool(Action::Financials, provider());
        assert_eq!(tool.name(), "get_financial_statements");
        assert!(!tool.description().is_empty());

        let schema = tool.input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["ticker"]));
        assert_eq!(schema["properties"]["statement_type"]["enum"][2], "balance_sheet");
    }

    #[test]
    fn test_symbol_is_normalized() {
        let mut mock = provider();
        mock.expect_fetch_blocking()
            .with(function(|r: &DataRequest| r.symbol.as_str() == "AAPL"))
            .times(1)
            .returning(|_| {
                Ok(MarketData::Quote(Quote {
                    current_price: Some(190.0),
                    ..Quote::default()
                }))
            });

        let out = tool(Action::Quote, mock)
            .execute_blocking(json!({"ticker": " aapl "}))
            .unwrap();
        assert!(out.starts_with("Stock Info for AAPL:"));
    }

    #[test]
    fn test_no_data_becomes_sentinel() {
        let mut mock = provider();
        mock.expect_fetch_blocking().times(1).returning(|r| Err(r.no_data()));

        let out = tool(Action::News, mock)
            .execute_blocking(json!({"symbol": "zzzz"}))
            .unwrap();
        assert_eq!(out, "No data available for ZZZZ");
    }

    #[test]
    fn test_hard_failure_propagates() {
        let mut mock = provider();
        mock.expect_fetch_blocking()
            .returning(|_| Err(StockError::Provider("HTTP 503: unavailable".to_string())));

        let err = tool(Action::Quote, mock)
            .execute_blocking(json!({"ticker": "AAPL"}))
            .unwrap_err();
        assert!(matches!(err, Error::ToolFailed { ref tool, .. } if tool == "get_stock_info"));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_invalid_statement_type_skips_provider() {
        let mut mock = provider();
        mock.expect_fetch_blocking().never();

        let out = tool(Action::Financials, mock)
            .execute_blocking(json!({"ticker": "AAPL", "statement_type": "income"}))
            .unwrap();
        assert_eq!(out, "Invalid statement type: income");
    }

    #[test]
    fn test_bad_arguments_are_recoverable() {
        let history = tool(Action::History, provider());

        let missing = history.execute_blocking(json!({})).unwrap_err();
        assert!(missing.is_recoverable());

        let bad_period = history
            .execute_blocking(json!({"ticker": "AAPL", "period": "2w"}))
            .unwrap_err();
        assert_eq!(bad_period.to_string(), "Invalid tool input: Invalid period: 2w");
    }

    #[test]
    fn test_blank_period_uses_default() {
        let mut mock = provider();
        mock.expect_fetch_blocking()
            .with(function(|r: &DataRequest| r.period == Period::ThreeMonths))
            .times(1)
            .returning(|_| {
                Ok(MarketData::History(vec![PriceBar {
                    date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                    open: 1.0,
                    high: 1.0,
                    low: 1.0,
                    close: 1.0,
                    volume: 10,
                }]))
            });

        let out = tool(Action::History, mock)
            .execute_blocking(json!({"ticker": "MSFT", "period": " "}))
            .unwrap();
        assert!(out.contains("from 3mo period"));
    }

    #[test]
    fn test_mismatched_payload_falls_back_to_sentinel() {
        let mut mock = provider();
        mock.expect_fetch_blocking()
            .returning(|_| Ok(MarketData::News(vec![])));

        let out = tool(Action::Quote, mock)
            .execute_blocking(json!({"ticker": "AAPL"}))
            .unwrap();
        assert_eq!(out, "No data available for AAPL");
    }

    #[tokio::test]
    async fn test_async_path_matches_blocking() {
        let mut mock = provider();
        mock.expect_fetch().times(1).returning(|r| Err(r.no_data()));
        mock.expect_fetch_blocking().times(1).returning(|r| Err(r.no_data()));
        let tool = tool(Action::Analyst, mock);

        let async_out = tool.execute(json!({"ticker": "msft"})).await.unwrap();
        let blocking_out = tool.execute_blocking(json!({"ticker": "msft"})).unwrap();
        assert_eq!(async_out, blocking_out);
        assert_eq!(async_out, "No data available for MSFT");
    }
}
