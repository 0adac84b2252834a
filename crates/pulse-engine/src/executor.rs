//! Order submission and bounded fill confirmation.
//!
//! The executor drives every order through `submitted → {filled | canceled
//! | rejected | timed_out}` with a fixed poll budget. There is no
//! mid-flight cancellation: an order that outlives the budget is abandoned
//! as `timed_out`, not revoked at the broker.

use crate::cache::LastActionCache;
use crate::guard::InFlightGuard;
use chrono::{DateTime, Utc};
use pulse_broker::{Broker, OrderDisposition, OrderRequest};
use pulse_core::{
    BotMessage, ClientOrderId, LastAction, Order, OrderSide, OrderStatus, TradeRecord, TradeUpdate,
};
use pulse_ledger::TradeLedger;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// Fill-confirmation retry settings.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Status poll attempts per order.
    pub poll_attempts: u32,
    /// Fixed delay between attempts.
    pub poll_delay: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            poll_attempts: 3,
            poll_delay: Duration::from_secs(3),
        }
    }
}

/// Terminal result of one `place_order` call.
#[derive(Debug)]
pub enum ExecutionOutcome {
    /// Order filled; a trade was recorded and broadcast.
    Filled(Order),
    /// Order reached a terminal state without filling
    /// (canceled, rejected, or timed out).
    Unfilled(Order),
    /// The broker refused the submission; no order was created.
    SubmitFailed,
    /// Suppressed: an order for this instrument was already in flight.
    Skipped,
}

/// Order execution state machine.
///
/// Exclusively owns in-flight orders until they are terminal, and is the
/// only writer to the trade ledger and last-action cache.
pub struct OrderExecutor {
    broker: Arc<dyn Broker>,
    ledger: Arc<TradeLedger>,
    last_actions: LastActionCache,
    events: broadcast::Sender<String>,
    in_flight: InFlightGuard,
    config: ExecutorConfig,
}

impl OrderExecutor {
    pub fn new(
        broker: Arc<dyn Broker>,
        ledger: Arc<TradeLedger>,
        last_actions: LastActionCache,
        events: broadcast::Sender<String>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            broker,
            ledger,
            last_actions,
            events,
            in_flight: InFlightGuard::new(),
            config,
        }
    }

    pub fn in_flight(&self) -> &InFlightGuard {
        &self.in_flight
    }

    /// Submit an order and drive it to a terminal state.
    pub async fn place_order(&self, symbol: &str, qty: i64, side: OrderSide) -> ExecutionOutcome {
        let _slot = match self.in_flight.try_acquire(symbol) {
            Some(slot) => slot,
            None => {
                warn!(
                    symbol = %symbol,
                    side = %side,
                    "Order already in flight for instrument, decision skipped"
                );
                return ExecutionOutcome::Skipped;
            }
        };

        let request = OrderRequest::market(symbol, qty, side);
        let client_order_id = ClientOrderId::from_string(request.client_order_id.clone());

        let ack = match self.broker.submit_order(request).await {
            Ok(ack) => ack,
            Err(e) => {
                error!(symbol = %symbol, side = %side, error = %e, "Order submission failed");
                return ExecutionOutcome::SubmitFailed;
            }
        };

        let order = Order::submitted(ack.id, client_order_id, symbol, side, qty);
        info!(
            symbol = %symbol,
            side = %side,
            qty,
            order_id = %order.id,
            "Order submitted"
        );

        self.confirm_fill(order).await
    }

    /// Poll until the order is terminal or the retry budget runs out.
    async fn confirm_fill(&self, order: Order) -> ExecutionOutcome {
        let attempts = self.config.poll_attempts;

        for attempt in 1..=attempts {
            match self.broker.get_order(&order.id).await {
                Ok(view) => match view.disposition() {
                    OrderDisposition::Filled => match view.filled_avg_price {
                        Some(price) => {
                            let filled = order.resolve(OrderStatus::Filled, Some(price));
                            self.on_fill(&filled, price, view.filled_at).await;
                            return ExecutionOutcome::Filled(filled);
                        }
                        None => {
                            // Fill reported without a price: incomplete data,
                            // treated as still pending.
                            warn!(
                                order_id = %order.id,
                                attempt,
                                "Fill reported without average price"
                            );
                        }
                    },
                    OrderDisposition::Canceled => {
                        error!(order_id = %order.id, "Order was canceled");
                        return ExecutionOutcome::Unfilled(
                            order.resolve(OrderStatus::Canceled, None),
                        );
                    }
                    OrderDisposition::Rejected => {
                        error!(order_id = %order.id, "Order was rejected");
                        return ExecutionOutcome::Unfilled(
                            order.resolve(OrderStatus::Rejected, None),
                        );
                    }
                    OrderDisposition::Pending => {
                        warn!(
                            order_id = %order.id,
                            attempt,
                            remaining = attempts - attempt,
                            "Order not filled, retrying"
                        );
                    }
                },
                Err(e) => {
                    warn!(order_id = %order.id, attempt, error = %e, "Order status poll failed");
                }
            }

            if attempt < attempts {
                tokio::time::sleep(self.config.poll_delay).await;
            }
        }

        error!(
            order_id = %order.id,
            attempts,
            "Order not filled within retry budget, abandoning"
        );
        ExecutionOutcome::Unfilled(order.resolve(OrderStatus::TimedOut, None))
    }

    /// Fill side effects: ledger append, last-action update, then the
    /// `trade_update` broadcast, strictly in that order.
    async fn on_fill(&self, order: &Order, price: Decimal, filled_at: Option<DateTime<Utc>>) {
        let portfolio_balance = match self.broker.get_account().await {
            Ok(account) => Some(account.equity),
            Err(e) => {
                warn!(error = %e, "Equity fetch at fill time failed");
                None
            }
        };

        let trade = TradeRecord {
            symbol: order.symbol.clone(),
            qty: order.qty,
            side: order.side,
            price,
            time: filled_at.unwrap_or_else(Utc::now),
            portfolio_balance,
        };

        if let Err(e) = self.ledger.record(trade) {
            error!(order_id = %order.id, error = %e, "Durable trade log append failed");
        }

        let last_action = LastAction::from_fill(order.side, price);
        self.last_actions.record(&order.symbol, last_action.clone());

        info!(
            symbol = %order.symbol,
            side = %order.side,
            price = %price,
            order_id = %order.id,
            "Order filled"
        );

        self.publish(&BotMessage::TradeUpdate(TradeUpdate {
            symbol: order.symbol.clone(),
            last_action,
            trade_history: self.ledger.all_trades(),
        }));
    }

    fn publish(&self, message: &BotMessage) {
        match serde_json::to_string(message) {
            Ok(json) => {
                // No receivers connected is normal.
                let _ = self.events.send(json);
            }
            Err(e) => warn!(error = %e, "Failed to serialize broadcast message"),
        }
    }
}
