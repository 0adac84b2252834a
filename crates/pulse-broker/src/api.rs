//! Broker API contract and response types.

use crate::error::BrokerResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pulse_core::{ClientOrderId, OrderSide};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Market clock state.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Clock {
    pub is_open: bool,
}

/// Account equity and buying power.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    #[serde(with = "rust_decimal::serde::str")]
    pub equity: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub buying_power: Decimal,
}

/// Latest trade for a symbol.
#[derive(Debug, Clone, Deserialize)]
pub struct LatestTrade {
    #[serde(rename = "p")]
    pub price: Decimal,
    #[serde(rename = "t")]
    pub timestamp: DateTime<Utc>,
}

/// One daily bar.
#[derive(Debug, Clone, Deserialize)]
pub struct Bar {
    #[serde(rename = "t")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "c")]
    pub close: Decimal,
}

/// An open position as reported by the broker.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPosition {
    pub symbol: String,
    #[serde(with = "qty_str")]
    pub qty: i64,
}

/// Order submission request.
#[derive(Debug, Clone, Serialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub qty: i64,
    pub side: OrderSide,
    #[serde(rename = "type")]
    pub order_type: String,
    pub time_in_force: String,
    pub client_order_id: String,
}

impl OrderRequest {
    /// Market order, good-til-canceled, matching the original submission
    /// parameters.
    pub fn market(symbol: impl Into<String>, qty: i64, side: OrderSide) -> Self {
        Self {
            symbol: symbol.into(),
            qty,
            side,
            order_type: "market".to_string(),
            time_in_force: "gtc".to_string(),
            client_order_id: ClientOrderId::new().to_string(),
        }
    }
}

/// Broker acknowledgement of a submission.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmittedOrder {
    pub id: String,
}

/// Order state as reported by a status poll.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderView {
    pub id: String,
    pub status: String,
    #[serde(default, with = "opt_decimal_str")]
    pub filled_avg_price: Option<Decimal>,
    #[serde(default)]
    pub filled_at: Option<DateTime<Utc>>,
}

/// Coarse disposition of a polled order, independent of the broker's
/// status vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDisposition {
    Filled,
    Canceled,
    Rejected,
    /// Any non-terminal status (new, accepted, partially_filled, ...).
    Pending,
}

impl OrderView {
    pub fn disposition(&self) -> OrderDisposition {
        match self.status.as_str() {
            "filled" => OrderDisposition::Filled,
            "canceled" | "cancelled" => OrderDisposition::Canceled,
            "rejected" => OrderDisposition::Rejected,
            _ => OrderDisposition::Pending,
        }
    }
}

/// The brokerage surface the engine depends on.
///
/// All calls may fail; callers decide whether a failure degrades to an
/// absent value or terminates an operation. Implementations must bound
/// every call with a timeout.
#[async_trait]
pub trait Broker: Send + Sync {
    async fn get_clock(&self) -> BrokerResult<Clock>;

    async fn get_account(&self) -> BrokerResult<Account>;

    async fn get_latest_trade(&self, symbol: &str) -> BrokerResult<LatestTrade>;

    /// Most recent daily bars, oldest first.
    async fn get_bars(&self, symbol: &str, timeframe: &str, limit: usize)
        -> BrokerResult<Vec<Bar>>;

    async fn list_positions(&self) -> BrokerResult<Vec<RawPosition>>;

    async fn submit_order(&self, request: OrderRequest) -> BrokerResult<SubmittedOrder>;

    async fn get_order(&self, order_id: &str) -> BrokerResult<OrderView>;
}

/// Broker APIs encode share counts as strings.
mod qty_str {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<i64>().map_err(serde::de::Error::custom)
    }
}

mod opt_decimal_str {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer};
    use std::str::FromStr;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            Some(s) => Decimal::from_str(&s)
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}
