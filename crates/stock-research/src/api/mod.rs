//! Remote market data: request shape, payloads and the provider seam

pub mod yahoo;

use crate::error::{Result, StockError};
use crate::symbol::Symbol;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use yahoo::{YahooConfig, YahooFinanceClient};

/// Which slice of data a request asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Price, valuation and company profile
    Quote,
    /// Daily OHLCV bars
    History,
    /// Recent headlines
    News,
    /// Analyst consensus and targets
    Analyst,
    /// One financial statement
    Financials,
    /// Inputs for ratio calculation
    Ratios,
}

/// Lookback window for price history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1mo")]
    OneMonth,
    #[default]
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
    #[serde(rename = "10y")]
    TenYears,
    #[serde(rename = "ytd")]
    YearToDate,
    #[serde(rename = "max")]
    Max,
}

impl Period {
    /// Every accepted period, shortest first
    pub const ALL: [Period; 11] = [
        Period::OneDay,
        Period::FiveDays,
        Period::OneMonth,
        Period::ThreeMonths,
        Period::SixMonths,
        Period::OneYear,
        Period::TwoYears,
        Period::FiveYears,
        Period::TenYears,
        Period::YearToDate,
        Period::Max,
    ];

    /// Wire name, as used in Yahoo's `range` parameter
    pub fn as_str(self) -> &'static str {
        match self {
            Period::OneDay => "1d",
            Period::FiveDays => "5d",
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::TwoYears => "2y",
            Period::FiveYears => "5y",
            Period::TenYears => "10y",
            Period::YearToDate => "ytd",
            Period::Max => "max",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = StockError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Period::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| StockError::InvalidRequest(format!("Invalid period: {s}")))
    }
}

/// Financial statement selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementType {
    #[default]
    Financials,
    QuarterlyFinancials,
    BalanceSheet,
    QuarterlyBalanceSheet,
    Cashflow,
    QuarterlyCashflow,
}

impl StatementType {
    /// Every accepted statement type
    pub const ALL: [StatementType; 6] = [
        StatementType::Financials,
        StatementType::QuarterlyFinancials,
        StatementType::BalanceSheet,
        StatementType::QuarterlyBalanceSheet,
        StatementType::Cashflow,
        StatementType::QuarterlyCashflow,
    ];

    /// Name accepted from callers
    pub fn as_str(self) -> &'static str {
        match self {
            StatementType::Financials => "financials",
            StatementType::QuarterlyFinancials => "quarterly_financials",
            StatementType::BalanceSheet => "balance_sheet",
            StatementType::QuarterlyBalanceSheet => "quarterly_balance_sheet",
            StatementType::Cashflow => "cashflow",
            StatementType::QuarterlyCashflow => "quarterly_cashflow",
        }
    }

    /// Heading used when rendering
    pub fn title(self) -> &'static str {
        match self {
            StatementType::Financials => "Financials",
            StatementType::QuarterlyFinancials => "Quarterly Financials",
            StatementType::BalanceSheet => "Balance Sheet",
            StatementType::QuarterlyBalanceSheet => "Quarterly Balance Sheet",
            StatementType::Cashflow => "Cashflow",
            StatementType::QuarterlyCashflow => "Quarterly Cashflow",
        }
    }
}

impl fmt::Display for StatementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatementType {
    type Err = StockError;

    fn from_str(s: &str) -> Result<Self> {
        StatementType::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| StockError::InvalidRequest(format!("Invalid statement type: {s}")))
    }
}

/// One call to the data provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRequest {
    /// Normalized ticker
    pub symbol: Symbol,
    /// What to fetch
    pub action: Action,
    /// History window; ignored by other actions
    #[serde(default)]
    pub period: Period,
    /// Statement selector; ignored by other actions
    #[serde(default)]
    pub statement: StatementType,
}

impl DataRequest {
    /// Request `action` for `symbol` with default period and statement
    pub fn new(symbol: Symbol, action: Action) -> Self {
        Self {
            symbol,
            action,
            period: Period::default(),
            statement: StatementType::default(),
        }
    }

    /// Set the history window
    pub fn with_period(mut self, period: Period) -> Self {
        self.period = period;
        self
    }

    /// Set the statement selector
    pub fn with_statement(mut self, statement: StatementType) -> Self {
        self.statement = statement;
        self
    }

    /// The provider's "nothing here" error for this request
    pub fn no_data(&self) -> StockError {
        StockError::NoData {
            symbol: self.symbol.to_string(),
        }
    }
}

/// Price, valuation and profile fields; any may be missing upstream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub long_name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub forward_pe: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    pub volume: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub beta: Option<f64>,
    pub book_value: Option<f64>,
    pub price_to_book: Option<f64>,
    pub enterprise_value: Option<f64>,
    pub ebitda: Option<f64>,
    pub trailing_eps: Option<f64>,
    pub forward_eps: Option<f64>,
    pub shares_outstanding: Option<f64>,
    pub total_debt: Option<f64>,
    pub total_cash: Option<f64>,
    pub return_on_equity: Option<f64>,
    /// Yahoo reports this as a percentage (150.0 means 1.5x)
    pub debt_to_equity: Option<f64>,
    pub current_ratio: Option<f64>,
    pub gross_margins: Option<f64>,
    pub operating_margins: Option<f64>,
}

impl Quote {
    /// True when not a single field came back
    pub fn is_empty(&self) -> bool {
        *self == Quote::default()
    }
}

/// One daily OHLCV bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// A news headline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub publisher: Option<String>,
    pub link: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Latest month of analyst rating counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationTrend {
    pub period: String,
    pub strong_buy: u32,
    pub buy: u32,
    pub hold: u32,
    pub sell: u32,
    pub strong_sell: u32,
}

/// Analyst consensus
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalystView {
    pub recommendation_key: Option<String>,
    pub target_mean_price: Option<f64>,
    pub target_high_price: Option<f64>,
    pub target_low_price: Option<f64>,
    pub analyst_count: Option<u32>,
    pub trend: Option<RecommendationTrend>,
}

impl AnalystView {
    /// True when not a single field came back
    pub fn is_empty(&self) -> bool {
        *self == AnalystView::default()
    }
}

/// A named statement value, keyed by Yahoo's field name (`totalRevenue`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub key: String,
    pub value: f64,
}

/// One reporting period of a statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementPeriod {
    pub end_date: Option<NaiveDate>,
    pub items: Vec<LineItem>,
}

impl StatementPeriod {
    /// Value of the first key present among `keys`
    pub fn get(&self, keys: &[&str]) -> Option<f64> {
        keys.iter().find_map(|key| {
            self.items
                .iter()
                .find(|item| item.key == *key)
                .map(|item| item.value)
        })
    }
}

/// A financial statement, most recent period first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub kind: StatementType,
    pub periods: Vec<StatementPeriod>,
}

/// Everything the ratio calculation reads, fetched in one call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    pub quote: Quote,
    /// Latest annual income statement
    pub income: Option<StatementPeriod>,
    /// Latest annual balance sheet
    pub balance: Option<StatementPeriod>,
}

/// Payload of a [`DataRequest`]; the variant follows the request's action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum MarketData {
    Quote(Quote),
    History(Vec<PriceBar>),
    News(Vec<NewsItem>),
    Analyst(AnalystView),
    Statement(Statement),
    Fundamentals(Fundamentals),
}

/// The remote data provider seam
///
/// One call, one upstream request. Absence of data is reported as
/// [`StockError::NoData`]; every other error is a hard failure.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetch, suspending on network I/O
    async fn fetch(&self, request: &DataRequest) -> Result<MarketData>;

    /// Fetch on the calling thread
    fn fetch_blocking(&self, request: &DataRequest) -> Result<MarketData>;

    /// Provider name for logs
    fn name(&self) -> &str;
}
