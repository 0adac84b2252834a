//! Quotes and position snapshots.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Where a quote price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteSource {
    /// Latest trade while the market is open.
    LiveTrade,
    /// Most recent daily close while the market is closed.
    LastClose,
}

/// A price observation for one instrument.
///
/// Data unavailability is represented by the absence of a `Quote`
/// (`Option::None`), never by a zero price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
    pub source: QuoteSource,
}

impl Quote {
    pub fn new(
        symbol: impl Into<String>,
        price: Decimal,
        timestamp: DateTime<Utc>,
        source: QuoteSource,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            timestamp,
            source,
        }
    }
}

/// Holdings in one instrument at cycle start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    /// Shares held. Negative when shorting is permitted.
    pub qty: i64,
}

impl Position {
    /// Market value at the given price, `None` when no price is known.
    pub fn market_value(&self, price: Option<Decimal>) -> Option<Decimal> {
        price.map(|p| p * Decimal::from(self.qty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_market_value() {
        let pos = Position {
            symbol: "FFIE".to_string(),
            qty: 10,
        };
        assert_eq!(pos.market_value(Some(dec!(0.55))), Some(dec!(5.50)));
        assert_eq!(pos.market_value(None), None);
    }

    #[test]
    fn test_market_value_short() {
        let pos = Position {
            symbol: "FFIE".to_string(),
            qty: -5,
        };
        assert_eq!(pos.market_value(Some(dec!(2))), Some(dec!(-10)));
    }
}
