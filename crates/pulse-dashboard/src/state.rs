//! Aggregation of current bot state for broadcasts and snapshots.

use pulse_core::{AccountType, BotMessage, DataUpdate};
use pulse_engine::{ConfigHandle, LastActionCache};
use pulse_feed::MarketDataGateway;
use pulse_ledger::TradeLedger;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Read-only aggregation over the gateway, ledger, and caches.
///
/// Every collection re-reads the broker and the trading configuration, so
/// threshold or symbol changes are visible on the next broadcast.
#[derive(Clone)]
pub struct DashboardState {
    gateway: MarketDataGateway,
    ledger: Arc<TradeLedger>,
    last_actions: LastActionCache,
    trading_config: ConfigHandle,
    account_type: AccountType,
}

impl DashboardState {
    pub fn new(
        gateway: MarketDataGateway,
        ledger: Arc<TradeLedger>,
        last_actions: LastActionCache,
        trading_config: ConfigHandle,
        account_type: AccountType,
    ) -> Self {
        Self {
            gateway,
            ledger,
            last_actions,
            trading_config,
            account_type,
        }
    }

    pub fn trading_config(&self) -> &ConfigHandle {
        &self.trading_config
    }

    /// Collect the full aggregate state.
    ///
    /// Each underlying fetch degrades independently; a broker outage
    /// yields a payload with absent prices rather than no payload.
    pub async fn collect_data_update(&self) -> DataUpdate {
        let trading = self.trading_config.snapshot();
        let status = self.gateway.get_market_status().await;
        let positions = self.gateway.get_positions().await;

        let mut instruments = Vec::with_capacity(trading.instruments.len());
        for instrument in &trading.instruments {
            let quote = self.gateway.get_quote(instrument, status.is_open()).await;
            instruments.push(MarketDataGateway::instrument_snapshot(
                instrument,
                quote.as_ref(),
                &positions,
            ));
        }

        DataUpdate {
            instruments,
            market_status: status,
            equity: self.gateway.get_account_equity().await,
            buying_power: self.gateway.get_buying_power().await,
            account_type: self.account_type.to_string(),
            last_actions: self.last_actions.snapshot(),
            trade_history: self.ledger.all_trades(),
        }
    }

    /// Collect and fan out one `data_update` to all subscribers.
    pub async fn broadcast_data_update(&self, tx: &broadcast::Sender<String>) {
        let message = BotMessage::DataUpdate(self.collect_data_update().await);
        match serde_json::to_string(&message) {
            Ok(json) => match tx.send(json) {
                Ok(receivers) => trace!(receivers, "Broadcast data_update sent"),
                // No receivers connected is normal.
                Err(_) => trace!("No subscribers connected"),
            },
            Err(e) => debug!(error = %e, "Failed to serialize data_update"),
        }
    }
}
