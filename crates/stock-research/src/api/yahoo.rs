//! Yahoo Finance client
//!
//! Talks to three public endpoints:
//! - `v8/finance/chart` for daily price history
//! - `v1/finance/search` for news headlines
//! - `v10/finance/quoteSummary` for quote, analyst, statement and ratio data
//!
//! quoteSummary wants a session crumb tied to a cookie. The client fetches
//! it once, on the first quoteSummary call, and reuses it afterwards. The
//! cookie jar is shared by the async and blocking transports so either one
//! can reuse a crumb obtained by the other.

use super::{
    Action, AnalystView, DataRequest, Fundamentals, LineItem, MarketData, MarketDataProvider,
    NewsItem, PriceBar, Quote, RecommendationTrend, Statement, StatementPeriod, StatementType,
};
use crate::error::{Result, StockError};
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::cookie::Jar;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use tracing::{debug, instrument, warn};

const QUERY1_BASE: &str = "https://query1.finance.yahoo.com";
const QUERY2_BASE: &str = "https://query2.finance.yahoo.com";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

const QUOTE_MODULES: &str = "price,summaryDetail,defaultKeyStatistics,financialData,assetProfile";
const ANALYST_MODULES: &str = "financialData,recommendationTrend";
const RATIO_MODULES: &str =
    "price,summaryDetail,defaultKeyStatistics,financialData,incomeStatementHistory,balanceSheetHistory";

/// Endpoints and client settings
#[derive(Debug, Clone)]
pub struct YahooConfig {
    /// Host serving chart, search and crumb requests
    pub query1_base: String,
    /// Host serving quoteSummary requests
    pub query2_base: String,
    /// Page visited once to obtain the session cookie
    pub cookie_url: String,
    /// User agent sent with every request
    pub user_agent: String,
    /// Headlines requested per news call
    pub news_count: usize,
    /// Request timeout in seconds; `None` keeps the client default
    pub timeout_secs: Option<u64>,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            query1_base: QUERY1_BASE.to_string(),
            query2_base: QUERY2_BASE.to_string(),
            cookie_url: COOKIE_URL.to_string(),
            user_agent: USER_AGENT.to_string(),
            news_count: 10,
            timeout_secs: None,
        }
    }
}

impl YahooConfig {
    /// Point every endpoint at one host (mirrors, test servers)
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        self.query1_base.clone_from(&base);
        self.query2_base.clone_from(&base);
        self.cookie_url = format!("{base}/cookie");
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }
}

/// Yahoo Finance API client
pub struct YahooFinanceClient {
    config: YahooConfig,
    jar: Arc<Jar>,
    client: reqwest::Client,
    blocking: OnceLock<reqwest::blocking::Client>,
    crumb: Mutex<Option<String>>,
}

impl std::fmt::Debug for YahooFinanceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooFinanceClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// A planned GET: where to go and whether quoteSummary's crumb is needed
#[derive(Debug, Clone, PartialEq)]
struct Endpoint {
    url: String,
    query: Vec<(&'static str, String)>,
    needs_crumb: bool,
}

impl YahooFinanceClient {
    /// Create a client against the public endpoints
    pub fn new() -> Result<Self> {
        Self::with_config(YahooConfig::default())
    }

    /// Create a client with custom endpoints or timeout
    pub fn with_config(config: YahooConfig) -> Result<Self> {
        let jar = Arc::new(Jar::default());
        let mut builder = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .cookie_provider(Arc::clone(&jar));
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            blocking: OnceLock::new(),
            crumb: Mutex::new(None),
            jar,
            config,
        })
    }

    /// Get the current configuration
    pub fn config(&self) -> &YahooConfig {
        &self.config
    }

    fn blocking_client(&self) -> Result<&reqwest::blocking::Client> {
        if let Some(client) = self.blocking.get() {
            return Ok(client);
        }

        let mut builder = reqwest::blocking::Client::builder()
            .user_agent(&self.config.user_agent)
            .cookie_provider(Arc::clone(&self.jar));
        if let Some(secs) = self.config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let _ = self.blocking.set(builder.build()?);
        self.blocking
            .get()
            .ok_or_else(|| StockError::Config("blocking HTTP client unavailable".to_string()))
    }

    fn cached_crumb(&self) -> Option<String> {
        match self.crumb.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn store_crumb(&self, crumb: &str) {
        match self.crumb.lock() {
            Ok(mut guard) => *guard = Some(crumb.to_string()),
            Err(poisoned) => *poisoned.into_inner() = Some(crumb.to_string()),
        }
    }

    fn crumb_url(&self) -> String {
        format!("{}/v1/test/getcrumb", self.config.query1_base)
    }

    fn endpoint(&self, request: &DataRequest) -> Endpoint {
        let symbol = request.symbol.as_str();
        let summary = |modules: &str| Endpoint {
            url: format!(
                "{}/v10/finance/quoteSummary/{symbol}",
                self.config.query2_base
            ),
            query: vec![("modules", modules.to_string())],
            needs_crumb: true,
        };

        match request.action {
            Action::History => Endpoint {
                url: format!("{}/v8/finance/chart/{symbol}", self.config.query1_base),
                query: vec![
                    ("range", request.period.as_str().to_string()),
                    ("interval", "1d".to_string()),
                    ("includePrePost", "false".to_string()),
                ],
                needs_crumb: false,
            },
            Action::News => Endpoint {
                url: format!("{}/v1/finance/search", self.config.query1_base),
                query: vec![
                    ("q", symbol.to_string()),
                    ("quotesCount", "0".to_string()),
                    ("newsCount", self.config.news_count.to_string()),
                ],
                needs_crumb: false,
            },
            Action::Quote => summary(QUOTE_MODULES),
            Action::Analyst => summary(ANALYST_MODULES),
            Action::Financials => summary(statement_module(request.statement)),
            Action::Ratios => summary(RATIO_MODULES),
        }
    }

    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<(u16, String)> {
        let response = self.client.get(url).query(query).send().await?;
        let status = response.status().as_u16();
        Ok((status, response.text().await?))
    }

    fn get_blocking(&self, url: &str, query: &[(&str, String)]) -> Result<(u16, String)> {
        let response = self.blocking_client()?.get(url).query(query).send()?;
        let status = response.status().as_u16();
        Ok((status, response.text()?))
    }

    async fn crumb(&self) -> Result<String> {
        if let Some(crumb) = self.cached_crumb() {
            return Ok(crumb);
        }

        debug!("Starting Yahoo session handshake");
        // Only the Set-Cookie header matters; this page answers 404.
        self.client.get(&self.config.cookie_url).send().await?;
        let (status, body) = self.get(&self.crumb_url(), &[]).await?;
        let crumb = parse_crumb(status, &body)?;
        self.store_crumb(&crumb);
        Ok(crumb)
    }

    fn crumb_blocking(&self) -> Result<String> {
        if let Some(crumb) = self.cached_crumb() {
            return Ok(crumb);
        }

        debug!("Starting Yahoo session handshake");
        self.blocking_client()?.get(&self.config.cookie_url).send()?;
        let (status, body) = self.get_blocking(&self.crumb_url(), &[])?;
        let crumb = parse_crumb(status, &body)?;
        self.store_crumb(&crumb);
        Ok(crumb)
    }
}

#[async_trait]
impl MarketDataProvider for YahooFinanceClient {
    #[instrument(skip(self, request), fields(symbol = %request.symbol, action = ?request.action))]
    async fn fetch(&self, request: &DataRequest) -> Result<MarketData> {
        let mut endpoint = self.endpoint(request);
        if endpoint.needs_crumb {
            endpoint.query.push(("crumb", self.crumb().await?));
        }

        let (status, body) = self.get(&endpoint.url, &endpoint.query).await?;
        debug!(status, bytes = body.len(), "Yahoo response received");
        decode(request, status, &body)
    }

    #[instrument(skip(self, request), fields(symbol = %request.symbol, action = ?request.action))]
    fn fetch_blocking(&self, request: &DataRequest) -> Result<MarketData> {
        let mut endpoint = self.endpoint(request);
        let (status, body) = agent_utils::run_blocking(|| {
            if endpoint.needs_crumb {
                endpoint.query.push(("crumb", self.crumb_blocking()?));
            }
            self.get_blocking(&endpoint.url, &endpoint.query)
        })?;
        debug!(status, bytes = body.len(), "Yahoo response received");
        decode(request, status, &body)
    }

    fn name(&self) -> &str {
        "yahoo"
    }
}

fn statement_module(kind: StatementType) -> &'static str {
    match kind {
        StatementType::Financials => "incomeStatementHistory",
        StatementType::QuarterlyFinancials => "incomeStatementHistoryQuarterly",
        StatementType::BalanceSheet => "balanceSheetHistory",
        StatementType::QuarterlyBalanceSheet => "balanceSheetHistoryQuarterly",
        StatementType::Cashflow => "cashflowStatementHistory",
        StatementType::QuarterlyCashflow => "cashflowStatementHistoryQuarterly",
    }
}

fn parse_crumb(status: u16, body: &str) -> Result<String> {
    let crumb = body.trim();
    if !(200..300).contains(&status) || crumb.is_empty() || crumb.contains(['<', ' ', '{']) {
        return Err(StockError::Provider(format!(
            "session handshake failed: HTTP {status}"
        )));
    }
    Ok(crumb.to_string())
}

fn snippet(body: &str) -> String {
    body.chars().take(200).collect()
}

// ============================================================================
// Decoding
// ============================================================================

fn decode(request: &DataRequest, status: u16, body: &str) -> Result<MarketData> {
    if status == 404 {
        return Err(request.no_data());
    }
    if !(200..300).contains(&status) {
        return Err(StockError::Provider(format!(
            "HTTP {status}: {}",
            snippet(body)
        )));
    }

    match request.action {
        Action::History => decode_chart(request, body).map(MarketData::History),
        Action::News => decode_news(request, body).map(MarketData::News),
        Action::Quote => {
            let quote = quote_from(&decode_summary(request, body)?);
            if quote.is_empty() {
                return Err(request.no_data());
            }
            Ok(MarketData::Quote(quote))
        }
        Action::Analyst => {
            let view = analyst_from(&decode_summary(request, body)?);
            if view.is_empty() {
                return Err(request.no_data());
            }
            Ok(MarketData::Analyst(view))
        }
        Action::Financials => {
            let summary = decode_summary(request, body)?;
            let periods = statement_from(&summary, request.statement);
            if periods.is_empty() {
                return Err(request.no_data());
            }
            Ok(MarketData::Statement(Statement {
                kind: request.statement,
                periods,
            }))
        }
        Action::Ratios => {
            let summary = decode_summary(request, body)?;
            let fundamentals = Fundamentals {
                quote: quote_from(&summary),
                income: statement_from(&summary, StatementType::Financials)
                    .into_iter()
                    .next(),
                balance: statement_from(&summary, StatementType::BalanceSheet)
                    .into_iter()
                    .next(),
            };
            if fundamentals == Fundamentals::default() {
                return Err(request.no_data());
            }
            Ok(MarketData::Fundamentals(fundamentals))
        }
    }
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: String,
    #[serde(default)]
    description: Option<String>,
}

/// Turn an error object into NoData or a provider failure
fn upstream_error(request: &DataRequest, error: YahooError) -> StockError {
    if error.code.eq_ignore_ascii_case("not found") {
        request.no_data()
    } else {
        StockError::Provider(format!(
            "{}: {}",
            error.code,
            error.description.unwrap_or_default()
        ))
    }
}

/// `{"raw": 1.23, "fmt": "1.23"}`; Yahoo sends `{}` for missing values
#[derive(Debug, Default, Deserialize)]
struct Raw {
    raw: Option<f64>,
}

fn raw(value: Option<&Raw>) -> Option<f64> {
    value.and_then(|v| v.raw).filter(|v| v.is_finite())
}

// --- chart ------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Default, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteSeries {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

fn decode_chart(request: &DataRequest, body: &str) -> Result<Vec<PriceBar>> {
    let envelope: ChartEnvelope = serde_json::from_str(body)?;
    if let Some(error) = envelope.chart.error {
        return Err(upstream_error(request, error));
    }

    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return Err(request.no_data());
    };
    let Some(series) = result.indicators.quote.first() else {
        return Err(request.no_data());
    };

    let at = |column: &[Option<f64>], i: usize| column.get(i).copied().flatten();
    let bars: Vec<PriceBar> = result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            // Halted sessions come back as nulls; drop the whole row.
            Some(PriceBar {
                date: DateTime::from_timestamp(ts + result.meta.gmtoffset, 0)?.date_naive(),
                open: at(&series.open, i)?,
                high: at(&series.high, i)?,
                low: at(&series.low, i)?,
                close: at(&series.close, i)?,
                volume: at(&series.volume, i)?.max(0.0) as u64,
            })
        })
        .collect();

    if bars.is_empty() {
        return Err(request.no_data());
    }
    Ok(bars)
}

// --- search -----------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    news: Vec<SearchNews>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchNews {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    publisher: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    provider_publish_time: Option<i64>,
}

fn decode_news(request: &DataRequest, body: &str) -> Result<Vec<NewsItem>> {
    let envelope: SearchEnvelope = serde_json::from_str(body)?;
    let items: Vec<NewsItem> = envelope
        .news
        .into_iter()
        .filter_map(|n| {
            let title = n.title.filter(|t| !t.trim().is_empty())?;
            Some(NewsItem {
                title,
                publisher: n.publisher,
                link: n.link,
                published_at: n
                    .provider_publish_time
                    .and_then(|ts| DateTime::from_timestamp(ts, 0)),
            })
        })
        .collect();

    if items.is_empty() {
        return Err(request.no_data());
    }
    Ok(items)
}

// --- quoteSummary -----------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryEnvelope {
    quote_summary: SummaryBody,
}

#[derive(Debug, Deserialize)]
struct SummaryBody {
    #[serde(default)]
    result: Option<Vec<SummaryResult>>,
    #[serde(default)]
    error: Option<YahooError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SummaryResult {
    price: Option<PriceModule>,
    summary_detail: Option<SummaryDetail>,
    default_key_statistics: Option<KeyStatistics>,
    financial_data: Option<FinancialData>,
    asset_profile: Option<AssetProfile>,
    recommendation_trend: Option<TrendModule>,
    income_statement_history: Option<StatementHistory>,
    income_statement_history_quarterly: Option<StatementHistory>,
    balance_sheet_history: Option<StatementHistory>,
    balance_sheet_history_quarterly: Option<StatementHistory>,
    cashflow_statement_history: Option<StatementHistory>,
    cashflow_statement_history_quarterly: Option<StatementHistory>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PriceModule {
    long_name: Option<String>,
    short_name: Option<String>,
    regular_market_price: Option<Raw>,
    regular_market_volume: Option<Raw>,
    market_cap: Option<Raw>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SummaryDetail {
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<Raw>,
    #[serde(rename = "forwardPE")]
    forward_pe: Option<Raw>,
    fifty_two_week_high: Option<Raw>,
    fifty_two_week_low: Option<Raw>,
    volume: Option<Raw>,
    market_cap: Option<Raw>,
    dividend_yield: Option<Raw>,
    beta: Option<Raw>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct KeyStatistics {
    enterprise_value: Option<Raw>,
    book_value: Option<Raw>,
    price_to_book: Option<Raw>,
    trailing_eps: Option<Raw>,
    forward_eps: Option<Raw>,
    shares_outstanding: Option<Raw>,
    beta: Option<Raw>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct FinancialData {
    current_price: Option<Raw>,
    ebitda: Option<Raw>,
    total_debt: Option<Raw>,
    total_cash: Option<Raw>,
    return_on_equity: Option<Raw>,
    debt_to_equity: Option<Raw>,
    current_ratio: Option<Raw>,
    gross_margins: Option<Raw>,
    operating_margins: Option<Raw>,
    recommendation_key: Option<String>,
    target_mean_price: Option<Raw>,
    target_high_price: Option<Raw>,
    target_low_price: Option<Raw>,
    number_of_analyst_opinions: Option<Raw>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AssetProfile {
    sector: Option<String>,
    industry: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TrendModule {
    trend: Vec<TrendEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TrendEntry {
    period: String,
    strong_buy: u32,
    buy: u32,
    hold: u32,
    sell: u32,
    strong_sell: u32,
}

/// The list key differs per module; the entries share one shape
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StatementHistory {
    #[serde(
        alias = "incomeStatementHistory",
        alias = "balanceSheetStatements",
        alias = "cashflowStatements"
    )]
    statements: Vec<Map<String, Value>>,
}

fn decode_summary(request: &DataRequest, body: &str) -> Result<SummaryResult> {
    let envelope: SummaryEnvelope = serde_json::from_str(body)?;
    if let Some(error) = envelope.quote_summary.error {
        return Err(upstream_error(request, error));
    }

    envelope
        .quote_summary
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| request.no_data())
}

fn quote_from(summary: &SummaryResult) -> Quote {
    let price = summary.price.as_ref();
    let detail = summary.summary_detail.as_ref();
    let stats = summary.default_key_statistics.as_ref();
    let fin = summary.financial_data.as_ref();
    let profile = summary.asset_profile.as_ref();

    Quote {
        long_name: price.and_then(|p| p.long_name.clone().or_else(|| p.short_name.clone())),
        sector: profile.and_then(|p| p.sector.clone()),
        industry: profile.and_then(|p| p.industry.clone()),
        current_price: raw(fin.and_then(|f| f.current_price.as_ref()))
            .or_else(|| raw(price.and_then(|p| p.regular_market_price.as_ref()))),
        market_cap: raw(price.and_then(|p| p.market_cap.as_ref()))
            .or_else(|| raw(detail.and_then(|d| d.market_cap.as_ref()))),
        trailing_pe: raw(detail.and_then(|d| d.trailing_pe.as_ref())),
        forward_pe: raw(detail.and_then(|d| d.forward_pe.as_ref())),
        fifty_two_week_high: raw(detail.and_then(|d| d.fifty_two_week_high.as_ref())),
        fifty_two_week_low: raw(detail.and_then(|d| d.fifty_two_week_low.as_ref())),
        volume: raw(detail.and_then(|d| d.volume.as_ref()))
            .or_else(|| raw(price.and_then(|p| p.regular_market_volume.as_ref()))),
        dividend_yield: raw(detail.and_then(|d| d.dividend_yield.as_ref())),
        beta: raw(detail.and_then(|d| d.beta.as_ref()))
            .or_else(|| raw(stats.and_then(|s| s.beta.as_ref()))),
        book_value: raw(stats.and_then(|s| s.book_value.as_ref())),
        price_to_book: raw(stats.and_then(|s| s.price_to_book.as_ref())),
        enterprise_value: raw(stats.and_then(|s| s.enterprise_value.as_ref())),
        ebitda: raw(fin.and_then(|f| f.ebitda.as_ref())),
        trailing_eps: raw(stats.and_then(|s| s.trailing_eps.as_ref())),
        forward_eps: raw(stats.and_then(|s| s.forward_eps.as_ref())),
        shares_outstanding: raw(stats.and_then(|s| s.shares_outstanding.as_ref())),
        total_debt: raw(fin.and_then(|f| f.total_debt.as_ref())),
        total_cash: raw(fin.and_then(|f| f.total_cash.as_ref())),
        return_on_equity: raw(fin.and_then(|f| f.return_on_equity.as_ref())),
        debt_to_equity: raw(fin.and_then(|f| f.debt_to_equity.as_ref())),
        current_ratio: raw(fin.and_then(|f| f.current_ratio.as_ref())),
        gross_margins: raw(fin.and_then(|f| f.gross_margins.as_ref())),
        operating_margins: raw(fin.and_then(|f| f.operating_margins.as_ref())),
    }
}

fn analyst_from(summary: &SummaryResult) -> AnalystView {
    let fin = summary.financial_data.as_ref();
    let trend = summary.recommendation_trend.as_ref().and_then(|t| {
        t.trend
            .iter()
            .find(|e| e.period == "0m")
            .or_else(|| t.trend.first())
            .map(|e| RecommendationTrend {
                period: e.period.clone(),
                strong_buy: e.strong_buy,
                buy: e.buy,
                hold: e.hold,
                sell: e.sell,
                strong_sell: e.strong_sell,
            })
    });

    AnalystView {
        recommendation_key: fin
            .and_then(|f| f.recommendation_key.clone())
            .filter(|k| !k.is_empty() && k != "none"),
        target_mean_price: raw(fin.and_then(|f| f.target_mean_price.as_ref())),
        target_high_price: raw(fin.and_then(|f| f.target_high_price.as_ref())),
        target_low_price: raw(fin.and_then(|f| f.target_low_price.as_ref())),
        analyst_count: raw(fin.and_then(|f| f.number_of_analyst_opinions.as_ref()))
            .map(|n| n.max(0.0) as u32),
        trend,
    }
}

fn statement_from(summary: &SummaryResult, kind: StatementType) -> Vec<StatementPeriod> {
    let history = match kind {
        StatementType::Financials => &summary.income_statement_history,
        StatementType::QuarterlyFinancials => &summary.income_statement_history_quarterly,
        StatementType::BalanceSheet => &summary.balance_sheet_history,
        StatementType::QuarterlyBalanceSheet => &summary.balance_sheet_history_quarterly,
        StatementType::Cashflow => &summary.cashflow_statement_history,
        StatementType::QuarterlyCashflow => &summary.cashflow_statement_history_quarterly,
    };

    history
        .as_ref()
        .map(|h| h.statements.iter().filter_map(statement_period).collect())
        .unwrap_or_default()
}

fn statement_period(entry: &Map<String, Value>) -> Option<StatementPeriod> {
    let end_date = entry
        .get("endDate")
        .and_then(|d| d.get("raw"))
        .and_then(Value::as_i64)
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
        .map(|dt| dt.date_naive());

    let items: Vec<LineItem> = entry
        .iter()
        .filter(|(key, _)| !matches!(key.as_str(), "maxAge" | "endDate"))
        .filter_map(|(key, value)| {
            let value = value.get("raw").and_then(Value::as_f64)?;
            Some(LineItem {
                key: key.clone(),
                value,
            })
        })
        .collect();

    if items.is_empty() {
        warn!(?end_date, "Statement period without values");
        return None;
    }
    Some(StatementPeriod { end_date, items })
}
