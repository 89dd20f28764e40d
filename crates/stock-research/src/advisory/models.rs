//! Records handed between advisory stages
//!
//! Every stage answers with one JSON object. [`parse_reply`] pulls it out
//! of the model's text, deserializes it and runs [`Validate`], so a stage
//! that answers off-schema fails the run instead of feeding bad data to
//! the next stage.

use crate::error::{Result, StockError};
use crate::symbol::Symbol;
use chrono::{Local, Months, NaiveDate};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Allowed drift of a portfolio's allocations from 100%
pub const ALLOCATION_TOLERANCE: f64 = 0.5;

/// Lowest accepted price
pub const MIN_PRICE: f64 = 0.01;

/// Checks that serde cannot express
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(message: impl Into<String>) -> StockError {
    StockError::Validation(message.into())
}

fn check_price(field: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= MIN_PRICE {
        Ok(())
    } else {
        Err(invalid(format!("{field} must be at least {MIN_PRICE}, got {value}")))
    }
}

fn check_finite(field: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(format!("{field} must be a finite number")))
    }
}

fn check_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(invalid(format!("{field} must not be empty")))
    } else {
        Ok(())
    }
}

/// Deserialize and validate the JSON object embedded in a model reply
///
/// Models often wrap the object in prose or a code fence, so everything
/// outside the first `{` and the last `}` is ignored.
pub fn parse_reply<T>(text: &str) -> Result<T>
where
    T: DeserializeOwned + Validate,
{
    let json = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => return Err(invalid("reply contains no JSON object")),
    };

    let value: T = serde_json::from_str(json)
        .map_err(|e| invalid(format!("reply does not match the expected format: {e}")))?;
    value.validate()?;
    Ok(value)
}

fn default_end_date() -> NaiveDate {
    let today = Local::now().date_naive();
    today
        .checked_add_months(Months::new(12 * 30))
        .unwrap_or(NaiveDate::MAX)
}

/// What the client tells the advisor
///
/// `end_date` defaults to thirty years from today.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientProfile {
    /// 1 (very conservative) to 10 (very aggressive)
    pub risk_tolerance: u8,

    /// Investment objectives in the client's words
    pub investment_goals: String,

    /// Capital available to invest, in dollars
    pub cash_flow: u64,

    pub start_date: NaiveDate,

    #[serde(default = "default_end_date")]
    pub end_date: NaiveDate,
}

impl ClientProfile {
    /// Validated profile with the default horizon
    pub fn new(
        risk_tolerance: u8,
        investment_goals: impl Into<String>,
        cash_flow: u64,
        start_date: NaiveDate,
    ) -> Result<Self> {
        let profile = Self {
            risk_tolerance,
            investment_goals: investment_goals.into(),
            cash_flow,
            start_date,
            end_date: default_end_date(),
        };
        profile.validate()?;
        Ok(profile)
    }

    /// Replace the investment end date
    pub fn with_end_date(mut self, end_date: NaiveDate) -> Result<Self> {
        self.end_date = end_date;
        self.validate()?;
        Ok(self)
    }

    /// Parse and validate a profile document
    pub fn from_json(json: &str) -> Result<Self> {
        let profile: Self = serde_json::from_str(json)
            .map_err(|e| invalid(format!("invalid client profile: {e}")))?;
        profile.validate()?;
        Ok(profile)
    }

    /// Whole years between start and end
    pub fn horizon_years(&self) -> u32 {
        self.end_date.years_since(self.start_date).unwrap_or(0)
    }
}

impl Validate for ClientProfile {
    fn validate(&self) -> Result<()> {
        if !(1..=10).contains(&self.risk_tolerance) {
            return Err(invalid(format!(
                "risk_tolerance must be between 1 and 10, got {}",
                self.risk_tolerance
            )));
        }
        check_text("investment_goals", &self.investment_goals)?;
        if self.cash_flow == 0 {
            return Err(invalid("cash_flow must be positive"));
        }
        if self.end_date <= self.start_date {
            return Err(invalid(format!(
                "end_date {} must be after start_date {}",
                self.end_date, self.start_date
            )));
        }
        Ok(())
    }
}

/// The profile stage's assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientSummary {
    pub recommended_portfolio_type: String,
    pub expected_yearly_returns: f64,
    pub risk_level: String,
    pub initial_portfolio_allocation: String,
    pub monthly_contribution: f64,
}

impl Validate for ClientSummary {
    fn validate(&self) -> Result<()> {
        check_text("recommended_portfolio_type", &self.recommended_portfolio_type)?;
        check_text("risk_level", &self.risk_level)?;
        check_finite("expected_yearly_returns", self.expected_yearly_returns)?;
        check_finite("monthly_contribution", self.monthly_contribution)?;
        if self.monthly_contribution < 0.0 {
            return Err(invalid("monthly_contribution must not be negative"));
        }
        Ok(())
    }
}

/// One holding of a portfolio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Asset {
    pub ticker: Symbol,
    /// Share of the portfolio, 25.0 meaning 25%
    pub allocation_percentage: f64,
    pub rationale: String,
}

fn full_allocation() -> f64 {
    100.0
}

/// Assets with allocations summing to 100%
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Portfolio {
    pub assets: Vec<Asset>,
    #[serde(default = "full_allocation")]
    pub total_allocation: f64,
    pub strategy_summary: String,
}

impl Portfolio {
    /// Tickers in allocation order
    pub fn tickers(&self) -> impl Iterator<Item = &Symbol> {
        self.assets.iter().map(|asset| &asset.ticker)
    }

    /// Sum of the asset allocations
    pub fn allocated(&self) -> f64 {
        self.assets.iter().map(|asset| asset.allocation_percentage).sum()
    }
}

impl Validate for Portfolio {
    fn validate(&self) -> Result<()> {
        if self.assets.is_empty() {
            return Err(invalid("portfolio has no assets"));
        }

        let mut seen = HashSet::new();
        for asset in &self.assets {
            if !seen.insert(&asset.ticker) {
                return Err(invalid(format!("{} is listed twice", asset.ticker)));
            }
            let share = asset.allocation_percentage;
            if !share.is_finite() || share <= 0.0 || share > 100.0 {
                return Err(invalid(format!(
                    "{} allocation must be within (0, 100], got {share}",
                    asset.ticker
                )));
            }
        }

        let allocated = self.allocated();
        if (allocated - 100.0).abs() > ALLOCATION_TOLERANCE {
            return Err(invalid(format!(
                "allocations must add up to 100%, got {allocated:.2}%"
            )));
        }
        Ok(())
    }
}

/// Analyst rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Rating {
    Buy,
    Hold,
    Sell,
}

impl Rating {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Hold => "HOLD",
            Self::Sell => "SELL",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rating {
    type Err = StockError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" | "STRONG BUY" => Ok(Self::Buy),
            "HOLD" | "NEUTRAL" => Ok(Self::Hold),
            "SELL" | "STRONG SELL" => Ok(Self::Sell),
            _ => Err(invalid(format!("rating must be BUY, HOLD or SELL, got {s}"))),
        }
    }
}

impl TryFrom<String> for Rating {
    type Error = StockError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Rating> for String {
    fn from(rating: Rating) -> Self {
        rating.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPoint {
    pub point: String,
}

/// One fiscal year of results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialStatement {
    pub year: i32,
    /// Billions of USD
    pub revenue: f64,
    pub eps: f64,
    /// Percent, 0 to 100
    #[serde(default)]
    pub operating_margin: f64,
    #[serde(default)]
    pub net_income: f64,
    #[serde(default)]
    pub free_cash_flow: f64,
}

/// Ratios as computed by the tools; 0.0 stands for "not available"
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatioAnalysis {
    pub pe_ratio: f64,
    pub ev_ebitda: f64,
    pub roe: f64,
    pub debt_to_equity: f64,
}

fn unit_price() -> f64 {
    1.0
}

fn tbd() -> String {
    "TBD".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Valuation {
    /// DCF, comparables, ...
    pub method: String,
    #[serde(default = "unit_price")]
    pub target_price: f64,
    #[serde(default = "tbd")]
    pub assumptions: String,
    #[serde(default = "tbd")]
    pub sensitivity_analysis: String,
    /// Multiple name to value, e.g. `PE: 25.0`
    #[serde(default)]
    pub multiples: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Risk {
    /// Market, company-specific or industry
    pub category: String,
    pub description: String,
}

/// Equity research report on one ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StockReport {
    pub company_name: String,
    pub ticker: Symbol,
    pub exchange: String,
    pub analyst: String,
    pub report_date: String,
    pub rating: Rating,
    #[serde(default = "unit_price")]
    pub current_price: f64,
    #[serde(default = "unit_price")]
    pub target_price: f64,
    pub upside_percent: f64,

    pub summary_points: Vec<KeyPoint>,
    pub executive_summary: String,
    pub business_overview: String,
    pub recent_performance: String,

    pub financials: Vec<FinancialStatement>,
    pub ratios: RatioAnalysis,

    pub valuation: Valuation,
    pub investment_thesis: Vec<KeyPoint>,
    pub risks: Vec<Risk>,

    pub conclusion: String,
}

impl Validate for StockReport {
    fn validate(&self) -> Result<()> {
        check_price("current_price", self.current_price)?;
        check_price("target_price", self.target_price)?;
        check_price("valuation.target_price", self.valuation.target_price)?;
        check_finite("upside_percent", self.upside_percent)?;

        for statement in &self.financials {
            let margin = statement.operating_margin;
            if !(0.0..=100.0).contains(&margin) {
                return Err(invalid(format!(
                    "operating_margin for {} must be within 0..=100, got {margin}",
                    statement.year
                )));
            }
        }

        if self.ratios.pe_ratio.is_nan() || self.ratios.pe_ratio < 0.0 {
            return Err(invalid(format!(
                "pe_ratio must not be negative, got {}",
                self.ratios.pe_ratio
            )));
        }
        Ok(())
    }
}
