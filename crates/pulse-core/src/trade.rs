//! Trade ledger entries and the last-action display cache.

use crate::order::OrderSide;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A completed trade.
///
/// Created only when an order reaches `filled`; appended to the trade
/// ledger and never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub symbol: String,
    pub qty: i64,
    pub side: OrderSide,
    /// Average fill price.
    pub price: Decimal,
    /// Fill time reported by the broker.
    pub time: DateTime<Utc>,
    /// Portfolio equity observed at fill time.
    pub portfolio_balance: Option<Decimal>,
}

/// Per-instrument most recent action, overwritten on each fill.
///
/// Display-only: decision logic never reads this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastAction {
    /// Capitalized side label ("Buy"/"Sell").
    pub action: String,
    pub price: Decimal,
}

impl LastAction {
    pub fn from_fill(side: OrderSide, price: Decimal) -> Self {
        Self {
            action: side.label().to_string(),
            price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_last_action_from_fill() {
        let action = LastAction::from_fill(OrderSide::Buy, dec!(0.56));
        assert_eq!(action.action, "Buy");
        assert_eq!(action.price, dec!(0.56));
    }
}
