//! Wire payloads for the live update feed.
//!
//! These types are serialized to JSON and fanned out to dashboard
//! subscribers. Field names follow the feed contract consumed by the
//! external dashboard, hence the camelCase renames.

use crate::instrument::MarketStatus;
use crate::quote::QuoteSource;
use crate::trade::{LastAction, TradeRecord};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-instrument display row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentSnapshot {
    pub symbol: String,
    /// Current price, absent when no quote could be obtained.
    pub current_price: Option<Decimal>,
    pub quote_time: Option<DateTime<Utc>>,
    pub quote_source: Option<QuoteSource>,
    pub buy_threshold: Decimal,
    pub sell_threshold: Decimal,
    pub exchange: String,
    pub shares_owned: i64,
    /// price × shares_owned, absent when no price is known.
    pub market_value: Option<Decimal>,
}

/// Full aggregate state, emitted on the broadcast cadence and immediately
/// to a newly connected subscriber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataUpdate {
    pub instruments: Vec<InstrumentSnapshot>,
    pub market_status: MarketStatus,
    pub equity: Option<Decimal>,
    pub buying_power: Option<Decimal>,
    pub account_type: String,
    pub last_actions: HashMap<String, LastAction>,
    pub trade_history: Vec<TradeRecord>,
}

/// Emitted once per fill, after the trade is appended to the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeUpdate {
    pub symbol: String,
    pub last_action: LastAction,
    pub trade_history: Vec<TradeRecord>,
}

/// Messages on the live update feed, tagged by event name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum BotMessage {
    DataUpdate(DataUpdate),
    TradeUpdate(TradeUpdate),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderSide;
    use rust_decimal_macros::dec;

    #[test]
    fn test_trade_update_event_tag() {
        let msg = BotMessage::TradeUpdate(TradeUpdate {
            symbol: "FFIE".to_string(),
            last_action: LastAction::from_fill(OrderSide::Buy, dec!(0.56)),
            trade_history: Vec::new(),
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["event"], "trade_update");
        assert_eq!(json["payload"]["symbol"], "FFIE");
        assert_eq!(json["payload"]["lastAction"]["action"], "Buy");
    }

    #[test]
    fn test_data_update_field_names() {
        let msg = BotMessage::DataUpdate(DataUpdate {
            instruments: Vec::new(),
            market_status: MarketStatus::Closed,
            equity: Some(dec!(25000)),
            buying_power: None,
            account_type: "Paper".to_string(),
            last_actions: HashMap::new(),
            trade_history: Vec::new(),
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["event"], "data_update");
        assert_eq!(json["payload"]["marketStatus"], "Closed");
        assert_eq!(json["payload"]["accountType"], "Paper");
        assert!(json["payload"]["buyingPower"].is_null());
    }
}
