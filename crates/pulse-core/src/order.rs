//! Order lifecycle types and identifiers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Order side: buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    /// Capitalized label for display caches ("Buy"/"Sell").
    pub fn label(&self) -> &'static str {
        match self {
            Self::Buy => "Buy",
            Self::Sell => "Sell",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// A buy/sell decision produced by the signal evaluator.
///
/// Derived from a quote and thresholds; never persisted independently of
/// the resulting order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSignal {
    pub symbol: String,
    pub side: OrderSide,
    /// The price that crossed a threshold.
    pub trigger_price: Decimal,
    pub decided_at: DateTime<Utc>,
}

/// Order status. All states except `Submitted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Accepted by the broker, fill not yet confirmed.
    Submitted,
    /// Completely filled.
    Filled,
    /// Canceled at the broker.
    Canceled,
    /// Rejected by the broker.
    Rejected,
    /// Fill confirmation retry budget exhausted; order abandoned.
    TimedOut,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Submitted)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Submitted => write!(f, "submitted"),
            Self::Filled => write!(f, "filled"),
            Self::Canceled => write!(f, "canceled"),
            Self::Rejected => write!(f, "rejected"),
            Self::TimedOut => write!(f, "timed_out"),
        }
    }
}

/// Client order ID attached to every submission for idempotency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientOrderId(String);

impl ClientOrderId {
    /// Format: `pulse_{timestamp_ms}_{uuid_short}`
    pub fn new() -> Self {
        let ts = Utc::now().timestamp_millis();
        let uuid_short = &Uuid::new_v4().to_string()[..8];
        Self(format!("pulse_{ts}_{uuid_short}"))
    }

    /// Wrap an existing id (e.g., one already sent to the broker).
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ClientOrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An order tracked from submission to its terminal state.
///
/// Created by the order executor on a buy/sell decision. Immutable once
/// terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Broker-assigned order id.
    pub id: String,
    /// Client-side id sent with the submission.
    pub client_order_id: ClientOrderId,
    pub symbol: String,
    pub side: OrderSide,
    pub qty: i64,
    pub status: OrderStatus,
    /// Average fill price, present only when `status == Filled`.
    pub filled_avg_price: Option<Decimal>,
    pub submitted_at: DateTime<Utc>,
    /// When the order reached a terminal state.
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Order {
    /// A freshly submitted order awaiting resolution.
    pub fn submitted(
        id: impl Into<String>,
        client_order_id: ClientOrderId,
        symbol: impl Into<String>,
        side: OrderSide,
        qty: i64,
    ) -> Self {
        Self {
            id: id.into(),
            client_order_id,
            symbol: symbol.into(),
            side,
            qty,
            status: OrderStatus::Submitted,
            filled_avg_price: None,
            submitted_at: Utc::now(),
            resolved_at: None,
        }
    }

    /// Transition into a terminal state. Fill price is recorded only for
    /// `Filled`.
    pub fn resolve(mut self, status: OrderStatus, filled_avg_price: Option<Decimal>) -> Self {
        debug_assert!(status.is_terminal());
        self.status = status;
        self.filled_avg_price = if status == OrderStatus::Filled {
            filled_avg_price
        } else {
            None
        };
        self.resolved_at = Some(Utc::now());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_order_side_opposite() {
        assert_eq!(OrderSide::Buy.opposite(), OrderSide::Sell);
        assert_eq!(OrderSide::Sell.opposite(), OrderSide::Buy);
    }

    #[test]
    fn test_order_side_label() {
        assert_eq!(OrderSide::Buy.label(), "Buy");
        assert_eq!(OrderSide::Sell.to_string(), "sell");
    }

    #[test]
    fn test_status_terminal() {
        assert!(!OrderStatus::Submitted.is_terminal());
        assert!(OrderStatus::Filled.is_terminal());
        assert!(OrderStatus::Canceled.is_terminal());
        assert!(OrderStatus::Rejected.is_terminal());
        assert!(OrderStatus::TimedOut.is_terminal());
    }

    #[test]
    fn test_client_order_id_unique() {
        let a = ClientOrderId::new();
        let b = ClientOrderId::new();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("pulse_"));
    }

    #[test]
    fn test_order_resolve_filled() {
        let order = Order::submitted("oid-1", ClientOrderId::new(), "FFIE", OrderSide::Buy, 1);
        assert_eq!(order.status, OrderStatus::Submitted);
        assert!(order.resolved_at.is_none());

        let filled = order.resolve(OrderStatus::Filled, Some(dec!(0.56)));
        assert_eq!(filled.status, OrderStatus::Filled);
        assert_eq!(filled.filled_avg_price, Some(dec!(0.56)));
        assert!(filled.resolved_at.is_some());
    }

    #[test]
    fn test_order_resolve_rejected_has_no_fill_price() {
        let order = Order::submitted("oid-2", ClientOrderId::new(), "FFIE", OrderSide::Sell, 1);
        let rejected = order.resolve(OrderStatus::Rejected, Some(dec!(0.56)));
        assert_eq!(rejected.status, OrderStatus::Rejected);
        assert_eq!(rejected.filled_avg_price, None);
    }
}
