//! Tracked instruments and market/account classification.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A tradable symbol with configured buy/sell thresholds.
///
/// The set of instruments and their thresholds is supplied externally and
/// may change between cycles, never mid-cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    /// Ticker symbol (e.g., "FFIE").
    pub symbol: String,
    /// Price below which a buy is triggered.
    pub buy_threshold: Decimal,
    /// Price above which a sell is triggered.
    pub sell_threshold: Decimal,
    /// Exchange label for display (e.g., "NASDAQ").
    #[serde(default = "default_exchange")]
    pub exchange: String,
}

fn default_exchange() -> String {
    "NASDAQ".to_string()
}

impl Instrument {
    pub fn new(
        symbol: impl Into<String>,
        buy_threshold: Decimal,
        sell_threshold: Decimal,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            buy_threshold,
            sell_threshold,
            exchange: default_exchange(),
        }
    }

    /// An instrument with `buy_threshold >= sell_threshold` can trigger a
    /// buy and a sell from the same price range on alternating cycles.
    /// Callers flag this at configuration time; the evaluator does not
    /// validate it.
    pub fn thresholds_overlap(&self) -> bool {
        self.buy_threshold >= self.sell_threshold
    }
}

/// Market open/closed state as reported by the broker clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketStatus {
    Open,
    Closed,
}

impl MarketStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

impl fmt::Display for MarketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "Open"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

/// Whether the configured broker endpoint is a paper or live account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountType {
    Paper,
    Live,
}

impl AccountType {
    /// Classify from the broker base URL, matching the original
    /// paper-endpoint convention.
    pub fn from_base_url(base_url: &str) -> Self {
        if base_url.contains("paper") {
            Self::Paper
        } else {
            Self::Live
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Paper => write!(f, "Paper"),
            Self::Live => write!(f, "Live"),
        }
    }
}
