//! Ticker symbols

use crate::error::{Result, StockError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A ticker symbol, upper-cased at construction
///
/// No format check beyond rejecting blank input: exchange suffixes
/// (`BRK-B`, `7203.T`) and indices (`^GSPC`) pass through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Normalize a raw ticker
    pub fn new(raw: impl AsRef<str>) -> Result<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(StockError::InvalidRequest(
                "symbol must not be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_uppercase()))
    }

    /// The normalized ticker
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for Symbol {
    type Err = StockError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for Symbol {
    type Error = StockError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uppercases() {
        assert_eq!(Symbol::new("aapl").unwrap().as_str(), "AAPL");
        assert_eq!(Symbol::new(" brk-b ").unwrap().to_string(), "BRK-B");
        assert_eq!(Symbol::new("^gspc").unwrap().as_str(), "^GSPC");
    }

    #[test]
    fn test_blank_rejected() {
        assert!(matches!(Symbol::new("   "), Err(StockError::InvalidRequest(_))));
    }

    #[test]
    fn test_same_symbol_either_case() {
        assert_eq!(Symbol::new("msft").unwrap(), Symbol::new("MSFT").unwrap());
    }
}
