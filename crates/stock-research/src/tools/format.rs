//! Text rendering of market data payloads
//!
//! Tools hand the model plain text. Every renderer here is a pure function
//! of its payload, so the same data always renders to the same string.

use crate::api::{
    AnalystView, DataRequest, Fundamentals, MarketData, NewsItem, PriceBar, Quote, Statement,
    StatementPeriod,
};
use crate::symbol::Symbol;
use std::fmt::Write as _;

/// Rows shown from the tail of a price history
pub const HISTORY_ROWS: usize = 10;

/// Line items shown per statement
pub const STATEMENT_ROWS: usize = 10;

const NOT_AVAILABLE: &str = "N/A";

/// Render a payload for the request that produced it
///
/// Returns `None` when the payload does not belong to the request's action.
pub fn render(request: &DataRequest, data: &MarketData) -> Option<String> {
    use crate::api::Action;

    let symbol = &request.symbol;
    match (request.action, data) {
        (Action::Quote, MarketData::Quote(quote)) => Some(stock_info(symbol, quote)),
        (Action::History, MarketData::History(bars)) => {
            Some(history(symbol, request.period.as_str(), bars))
        }
        (Action::News, MarketData::News(items)) => Some(news(symbol, items)),
        (Action::Analyst, MarketData::Analyst(view)) => Some(analyst(symbol, view)),
        (Action::Financials, MarketData::Statement(statement)) => {
            Some(statement_table(symbol, statement))
        }
        (Action::Ratios, MarketData::Fundamentals(fundamentals)) => {
            Some(ratios(symbol, &FinancialRatios::from_fundamentals(fundamentals)))
        }
        _ => None,
    }
}

/// Price, valuation and company overview
pub fn stock_info(symbol: &Symbol, quote: &Quote) -> String {
    let text = |v: &Option<String>| v.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let mut out = format!("Stock Info for {symbol}:\n");
    let _ = writeln!(out, "- Current Price: {}", dollars(quote.current_price));
    let _ = writeln!(out, "- Market Cap: {}", dollars_grouped(quote.market_cap));
    let _ = writeln!(out, "- P/E Ratio: {}", number(quote.trailing_pe));
    let _ = writeln!(out, "- 52 Week High: {}", dollars(quote.fifty_two_week_high));
    let _ = writeln!(out, "- 52 Week Low: {}", dollars(quote.fifty_two_week_low));
    let _ = writeln!(out, "- Company: {}", text(&quote.long_name));
    let _ = writeln!(out, "- Sector: {}", text(&quote.sector));
    let _ = writeln!(out, "- Industry: {}", text(&quote.industry));
    let _ = writeln!(out, "- Volume: {}", grouped(quote.volume));
    let _ = writeln!(out, "- Dividend Yield: {}", number(quote.dividend_yield));
    let _ = writeln!(out, "- Beta: {}", number(quote.beta));
    let _ = writeln!(out, "- Book Value: {}", number(quote.book_value));
    let _ = writeln!(out, "- Price to Book: {}", number(quote.price_to_book));
    let _ = writeln!(out, "- Enterprise Value: {}", grouped(quote.enterprise_value));
    let _ = writeln!(out, "- EBITDA: {}", grouped(quote.ebitda));
    out
}

/// Last [`HISTORY_ROWS`] daily bars as a tab-separated table
pub fn history(symbol: &Symbol, period: &str, bars: &[PriceBar]) -> String {
    let mut out = format!(
        "Historical prices for {symbol} (last {HISTORY_ROWS} days from {period} period):\n"
    );
    out.push_str("Date\t\tOpen\tHigh\tLow\tClose\tVolume\n");
    out.push_str(&"-".repeat(60));
    out.push('\n');

    let start = bars.len().saturating_sub(HISTORY_ROWS);
    for bar in &bars[start..] {
        let _ = writeln!(
            out,
            "{}\t${:.2}\t${:.2}\t${:.2}\t${:.2}\t{}",
            bar.date.format("%Y-%m-%d"),
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            thousands(bar.volume)
        );
    }
    out
}

/// First [`STATEMENT_ROWS`] line items, one column per reporting period
pub fn statement_table(symbol: &Symbol, statement: &Statement) -> String {
    let mut out = format!("{} for {symbol}:\n", statement.kind.title());

    out.push_str("Item");
    for period in &statement.periods {
        let date = period
            .end_date
            .map_or_else(|| NOT_AVAILABLE.to_string(), |d| d.to_string());
        let _ = write!(out, "\t{date}");
    }
    out.push('\n');

    for key in statement_keys(&statement.periods) {
        out.push_str(&humanize(key));
        for period in &statement.periods {
            let _ = write!(out, "\t{}", grouped(period.get(&[key])));
        }
        out.push('\n');
    }
    out
}

/// Line item keys in first-seen order, capped at [`STATEMENT_ROWS`]
fn statement_keys(periods: &[StatementPeriod]) -> Vec<&str> {
    let mut keys: Vec<&str> = Vec::new();
    for item in periods.iter().flat_map(|p| p.items.iter()) {
        if keys.len() == STATEMENT_ROWS {
            break;
        }
        if !keys.contains(&item.key.as_str()) {
            keys.push(&item.key);
        }
    }
    keys
}

/// Analyst consensus, price targets and the latest rating counts
pub fn analyst(symbol: &Symbol, view: &AnalystView) -> String {
    let mut out = format!("Analyst Recommendations for {symbol}:\n");
    let _ = writeln!(
        out,
        "- Recommendation: {}",
        view.recommendation_key
            .as_deref()
            .map_or_else(|| NOT_AVAILABLE.to_string(), str::to_uppercase)
    );
    let _ = writeln!(out, "- Mean Target Price: {}", dollars(view.target_mean_price));
    let _ = writeln!(
        out,
        "- Target Range: {} - {}",
        dollars(view.target_low_price),
        dollars(view.target_high_price)
    );
    let _ = writeln!(
        out,
        "- Number of Analysts: {}",
        view.analyst_count
            .map_or_else(|| NOT_AVAILABLE.to_string(), |n| n.to_string())
    );
    if let Some(trend) = &view.trend {
        let _ = writeln!(
            out,
            "- Latest Ratings ({}): Strong Buy {}, Buy {}, Hold {}, Sell {}, Strong Sell {}",
            trend.period, trend.strong_buy, trend.buy, trend.hold, trend.sell, trend.strong_sell
        );
    }
    out
}

/// Numbered headline list
pub fn news(symbol: &Symbol, items: &[NewsItem]) -> String {
    let mut out = format!("Latest news for {symbol}:\n");
    for (i, item) in items.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, item.title);
        let publisher = item.publisher.as_deref().unwrap_or(NOT_AVAILABLE);
        let published = item.published_at.map_or_else(
            || NOT_AVAILABLE.to_string(),
            |t| t.format("%Y-%m-%d %H:%M UTC").to_string(),
        );
        let _ = writeln!(out, "   Publisher: {publisher} | Published: {published}");
        if let Some(link) = &item.link {
            let _ = writeln!(out, "   Link: {link}");
        }
    }
    out
}

/// Computed ratios; 0.0 stands for "not available"
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FinancialRatios {
    pub pe_ratio: f64,
    pub ev_ebitda: f64,
    /// Percent
    pub roe: f64,
    pub debt_to_equity: f64,
    pub price_to_book: f64,
    pub current_ratio: f64,
    /// Percent
    pub gross_margin: f64,
    /// Percent
    pub operating_margin: f64,
}

const NET_INCOME: &[&str] = &["netIncome", "netIncomeApplicableToCommonShares"];
const EQUITY: &[&str] = &["totalStockholderEquity", "stockholdersEquity", "totalEquity"];
const DEBT: &[&str] = &["totalDebt", "longTermDebt", "netDebt", "totalLiab"];
const CURRENT_ASSETS: &[&str] = &["totalCurrentAssets", "currentAssets"];
const CURRENT_LIABILITIES: &[&str] = &["totalCurrentLiabilities", "currentLiabilities"];

impl FinancialRatios {
    /// Compute every ratio, falling back from reported values to statement math
    pub fn from_fundamentals(f: &Fundamentals) -> Self {
        let q = &f.quote;
        let income = f.income.as_ref();
        let balance = f.balance.as_ref();
        let line = |period: Option<&StatementPeriod>, keys: &[&str]| {
            period.and_then(|p| p.get(keys)).filter(|v| *v != 0.0)
        };
        let price = q.current_price;
        let equity = line(balance, EQUITY).filter(|e| *e > 0.0);

        let pe_ratio = positive(q.trailing_pe.or(q.forward_pe)).or_else(|| {
            let eps = positive(q.trailing_eps.or(q.forward_eps))?;
            Some(price? / eps)
        });

        let ev_ebitda = match (q.enterprise_value, positive(q.ebitda)) {
            (Some(ev), Some(ebitda)) => Some(ev / ebitda),
            _ => q.market_cap.filter(|m| *m != 0.0).and_then(|market_cap| {
                let operating = line(income, &["operatingIncome", "ebit"]).unwrap_or(0.0);
                let ebitda = operating + line(income, &["depreciation"]).unwrap_or(0.0);
                let ev = market_cap + q.total_debt.unwrap_or(0.0) - q.total_cash.unwrap_or(0.0);
                (ebitda > 0.0 && ev > 0.0).then(|| ev / ebitda)
            }),
        };

        let roe = q
            .return_on_equity
            .filter(|r| *r != 0.0)
            .or_else(|| Some(line(income, NET_INCOME)? / equity?))
            .map(|r| r * 100.0);

        let debt_to_equity = line(balance, DEBT)
            .zip(equity)
            .map(|(debt, eq)| debt / eq)
            .or_else(|| positive(q.debt_to_equity).map(|pct| pct / 100.0));

        let price_to_book = positive(q.price_to_book)
            .or_else(|| Some(price? / positive(q.book_value)?))
            .or_else(|| {
                let per_share = equity? / positive(q.shares_outstanding)?;
                Some(price? / per_share)
            });

        let current_ratio = positive(q.current_ratio).or_else(|| {
            let liabilities = line(balance, CURRENT_LIABILITIES).filter(|l| *l > 0.0)?;
            Some(line(balance, CURRENT_ASSETS)? / liabilities)
        });

        let revenue = line(income, &["totalRevenue"]).filter(|r| *r > 0.0);
        let margin = |keys: &[&str]| Some(line(income, keys)? / revenue? * 100.0);
        let gross_margin = margin(&["grossProfit"])
            .or_else(|| q.gross_margins.filter(|m| *m != 0.0).map(|m| m * 100.0));
        let operating_margin = margin(&["operatingIncome"])
            .or_else(|| q.operating_margins.filter(|m| *m != 0.0).map(|m| m * 100.0));

        Self {
            pe_ratio: round2(pe_ratio),
            ev_ebitda: round2(ev_ebitda),
            roe: round2(roe),
            debt_to_equity: round2(debt_to_equity),
            price_to_book: round2(price_to_book),
            current_ratio: round2(current_ratio),
            gross_margin: round2(gross_margin),
            operating_margin: round2(operating_margin),
        }
    }
}

/// Ratio summary with the zero-means-unavailable note
pub fn ratios(symbol: &Symbol, r: &FinancialRatios) -> String {
    let mut out = format!("Calculated Financial Ratios for {symbol}:\n");
    let _ = writeln!(out, "- P/E Ratio: {}", decimal(r.pe_ratio));
    let _ = writeln!(out, "- EV/EBITDA: {}", decimal(r.ev_ebitda));
    let _ = writeln!(out, "- ROE: {}%", decimal(r.roe));
    let _ = writeln!(out, "- Debt-to-Equity: {}", decimal(r.debt_to_equity));
    let _ = writeln!(out, "- Price-to-Book: {}", decimal(r.price_to_book));
    let _ = writeln!(out, "- Current Ratio: {}", decimal(r.current_ratio));
    let _ = writeln!(out, "- Gross Margin: {}%", decimal(r.gross_margin));
    let _ = writeln!(out, "- Operating Margin: {}%", decimal(r.operating_margin));
    out.push('\n');
    out.push_str(
        "Note: All ratios calculated from available data. \
         Zero values indicate data not available or not applicable.\n",
    );
    out
}

// ============================================================================
// Number helpers
// ============================================================================

fn positive(v: Option<f64>) -> Option<f64> {
    v.filter(|v| v.is_finite() && *v > 0.0)
}

fn round2(v: Option<f64>) -> f64 {
    v.filter(|v| v.is_finite())
        .map_or(0.0, |v| (v * 100.0).round() / 100.0)
}

/// `12.0` → `12.0`, `12.5` → `12.5`
fn decimal(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{v:.1}")
    } else {
        v.to_string()
    }
}

fn number(v: Option<f64>) -> String {
    v.map_or_else(|| NOT_AVAILABLE.to_string(), decimal)
}

fn dollars(v: Option<f64>) -> String {
    v.map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("${}", decimal(v)))
}

fn dollars_grouped(v: Option<f64>) -> String {
    v.map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("${}", group_f64(v)))
}

fn grouped(v: Option<f64>) -> String {
    v.map_or_else(|| NOT_AVAILABLE.to_string(), group_f64)
}

fn group_f64(v: f64) -> String {
    let digits = thousands(v.abs().round() as u64);
    if v < 0.0 { format!("-{digits}") } else { digits }
}

/// `1234567` → `1,234,567`
pub fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// `totalRevenue` → `Total Revenue`
pub fn humanize(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (i, c) in key.chars().enumerate() {
        if i == 0 {
            out.extend(c.to_uppercase());
        } else {
            if c.is_uppercase() {
                out.push(' ');
            }
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Action, LineItem, RecommendationTrend, StatementType};
    use chrono::NaiveDate;

    fn sym(s: &str) -> Symbol {
        Symbol::new(s).unwrap()
    }

    fn period(items: &[(&str, f64)]) -> StatementPeriod {
        StatementPeriod {
            end_date: NaiveDate::from_ymd_opt(2023, 9, 30),
            items: items
                .iter()
                .map(|(key, value)| LineItem {
                    key: (*key).to_string(),
                    value: *value,
                })
                .collect(),
        }
    }

    #[test]
    fn test_thousands_and_humanize() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1_234_567), "1,234,567");
        assert_eq!(humanize("totalRevenue"), "Total Revenue");
        assert_eq!(humanize("ebit"), "Ebit");
    }

    #[test]
    fn test_stock_info_missing_fields() {
        let quote = Quote {
            current_price: Some(189.84),
            market_cap: Some(2_950_000_000_000.0),
            long_name: Some("Apple Inc.".to_string()),
            ..Quote::default()
        };
        let text = stock_info(&sym("aapl"), &quote);

        assert!(text.starts_with("Stock Info for AAPL:\n"));
        assert!(text.contains("- Current Price: $189.84\n"));
        assert!(text.contains("- Market Cap: $2,950,000,000,000\n"));
        assert!(text.contains("- Company: Apple Inc.\n"));
        assert!(text.contains("- Sector: N/A\n"));
    }

    #[test]
    fn test_history_keeps_last_rows() {
        let bars: Vec<PriceBar> = (1..=12)
            .map(|day| PriceBar {
                date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
                open: 1.0,
                high: 2.0,
                low: 0.5,
                close: 1.5,
                volume: 1_000_000,
            })
            .collect();
        let text = history(&sym("MSFT"), "3mo", &bars);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Historical prices for MSFT (last 10 days from 3mo period):");
        assert_eq!(lines[2], "-".repeat(60));
        assert_eq!(lines.len(), 3 + HISTORY_ROWS);
        assert_eq!(lines[3], "2024-05-03\t$1.00\t$2.00\t$0.50\t$1.50\t1,000,000");
    }

    #[test]
    fn test_statement_table() {
        let statement = Statement {
            kind: StatementType::QuarterlyFinancials,
            periods: vec![period(&[("totalRevenue", 1_000.0), ("netIncome", -20.0)])],
        };
        let text = statement_table(&sym("IBM"), &statement);

        assert!(text.starts_with("Quarterly Financials for IBM:\nItem\t2023-09-30\n"));
        assert!(text.contains("Total Revenue\t1,000\n"));
        assert!(text.contains("Net Income\t-20\n"));
    }

    #[test]
    fn test_ratios_prefer_reported_values() {
        let fundamentals = Fundamentals {
            quote: Quote {
                trailing_pe: Some(29.456),
                enterprise_value: Some(3_000.0),
                ebitda: Some(120.0),
                return_on_equity: Some(1.4725),
                price_to_book: Some(45.0),
                current_ratio: Some(0.98),
                ..Quote::default()
            },
            income: Some(period(&[
                ("totalRevenue", 400.0),
                ("grossProfit", 180.0),
                ("operatingIncome", 120.0),
            ])),
            balance: Some(period(&[("totalLiab", 300.0), ("totalStockholderEquity", 60.0)])),
        };
        let r = FinancialRatios::from_fundamentals(&fundamentals);

        assert_eq!(r.pe_ratio, 29.46);
        assert_eq!(r.ev_ebitda, 25.0);
        assert_eq!(r.roe, 147.25);
        assert_eq!(r.debt_to_equity, 5.0);
        assert_eq!(r.price_to_book, 45.0);
        assert_eq!(r.gross_margin, 45.0);
        assert_eq!(r.operating_margin, 30.0);
    }

    #[test]
    fn test_ratios_fall_back_to_statements() {
        let fundamentals = Fundamentals {
            quote: Quote {
                current_price: Some(50.0),
                trailing_eps: Some(4.0),
                book_value: Some(20.0),
                ..Quote::default()
            },
            income: Some(period(&[("netIncome", 30.0)])),
            balance: Some(period(&[
                ("totalStockholderEquity", 200.0),
                ("totalCurrentAssets", 150.0),
                ("totalCurrentLiabilities", 100.0),
            ])),
        };
        let r = FinancialRatios::from_fundamentals(&fundamentals);

        assert_eq!(r.pe_ratio, 12.5);
        assert_eq!(r.roe, 15.0);
        assert_eq!(r.price_to_book, 2.5);
        assert_eq!(r.current_ratio, 1.5);
        assert_eq!(r.ev_ebitda, 0.0);
    }

    #[test]
    fn test_ratio_rendering() {
        let text = ratios(&sym("NVDA"), &FinancialRatios::default());
        assert!(text.contains("- P/E Ratio: 0.0\n"));
        assert!(text.contains("- ROE: 0.0%\n"));
        assert!(text.contains("Zero values indicate data not available"));
    }

    #[test]
    fn test_analyst_rendering() {
        let view = AnalystView {
            recommendation_key: Some("buy".to_string()),
            target_mean_price: Some(210.5),
            analyst_count: Some(38),
            trend: Some(RecommendationTrend {
                period: "0m".to_string(),
                strong_buy: 11,
                buy: 21,
                hold: 6,
                ..RecommendationTrend::default()
            }),
            ..AnalystView::default()
        };
        let text = analyst(&sym("AAPL"), &view);

        assert!(text.contains("- Recommendation: BUY\n"));
        assert!(text.contains("- Mean Target Price: $210.5\n"));
        assert!(text.contains("- Target Range: N/A - N/A\n"));
        assert!(text.contains("Strong Buy 11, Buy 21, Hold 6, Sell 0, Strong Sell 0"));
    }

    #[test]
    fn test_news_rendering() {
        let items = vec![NewsItem {
            title: "Apple beats estimates".to_string(),
            publisher: Some("Reuters".to_string()),
            link: None,
            published_at: chrono::DateTime::from_timestamp(1_714_600_000, 0),
        }];
        let text = news(&sym("AAPL"), &items);

        assert!(text.contains("1. Apple beats estimates\n"));
        assert!(text.contains("Publisher: Reuters | Published: 2024-05-01"));
        assert!(!text.contains("Link:"));
    }

    #[test]
    fn test_render_rejects_mismatched_payload() {
        let request = DataRequest::new(sym("AAPL"), Action::History);
        assert!(render(&request, &MarketData::Quote(Quote::default())).is_none());
        assert!(render(&request, &MarketData::History(vec![])).is_some());
    }
}
