//! Per-call research state

use crate::error::{Result, StockError};
use crate::prompts::default_query;
use crate::symbol::Symbol;
use agent_llm::Message;
use serde::{Deserialize, Serialize};

/// Input of one research call
///
/// Checked at construction: the symbol is normalized and a price hint,
/// when given, must be a positive finite number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchState {
    symbol: Symbol,
    price: Option<f64>,
    messages: Vec<Message>,
}

impl ResearchState {
    /// State asking `query` (or the default query) about `symbol`
    pub fn new(symbol: impl AsRef<str>, query: Option<&str>) -> Result<Self> {
        let symbol = Symbol::new(symbol)?;
        let query = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map_or_else(|| default_query(&symbol), str::to_string);

        Ok(Self {
            messages: vec![Message::user(query)],
            symbol,
            price: None,
        })
    }

    /// Attach the last known price
    pub fn with_price(mut self, price: f64) -> Result<Self> {
        if !price.is_finite() || price <= 0.0 {
            return Err(StockError::InvalidRequest(format!(
                "price must be a positive number, got {price}"
            )));
        }
        self.price = Some(price);
        Ok(self)
    }

    /// Append earlier conversation turns after the query
    pub fn with_messages(mut self, messages: impl IntoIterator<Item = Message>) -> Self {
        self.messages.extend(messages);
        self
    }

    /// Normalized symbol
    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Last known price, if any
    pub fn price(&self) -> Option<f64> {
        self.price
    }

    /// Messages as held by the state
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Opening conversation for the agent
    pub fn initial_messages(&self) -> Vec<Message> {
        let mut messages = self.messages.clone();
        if let Some(price) = self.price {
            messages.push(Message::user(format!(
                "Context: the last known price of {} is ${price:.2}.",
                self.symbol
            )));
        }
        messages
    }
}
