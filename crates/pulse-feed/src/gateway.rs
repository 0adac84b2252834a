//! Broker reads with degrade-to-absent semantics.

use pulse_core::{Instrument, InstrumentSnapshot, MarketStatus, Quote, QuoteSource};
use pulse_broker::Broker;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Number of daily bars fetched when falling back to the last close.
const CLOSE_LOOKBACK_DAYS: usize = 5;

/// Read-only view over the broker.
///
/// Each accessor degrades its own failure to an absent value; a failure in
/// one call never invalidates results already obtained from the others in
/// the same cycle.
#[derive(Clone)]
pub struct MarketDataGateway {
    broker: Arc<dyn Broker>,
}

impl MarketDataGateway {
    pub fn new(broker: Arc<dyn Broker>) -> Self {
        Self { broker }
    }

    /// Market open/closed state. A clock failure degrades to `Closed` so
    /// no orders are evaluated on unknown state.
    pub async fn get_market_status(&self) -> MarketStatus {
        match self.broker.get_clock().await {
            Ok(clock) if clock.is_open => MarketStatus::Open,
            Ok(_) => MarketStatus::Closed,
            Err(e) => {
                warn!(error = %e, "Clock fetch failed, treating market as closed");
                MarketStatus::Closed
            }
        }
    }

    /// Current price for an instrument: latest trade while the market is
    /// open, most recent daily close otherwise. `None` when the provider
    /// fails or has no data.
    pub async fn get_quote(&self, instrument: &Instrument, market_open: bool) -> Option<Quote> {
        let symbol = instrument.symbol.as_str();

        if market_open {
            match self.broker.get_latest_trade(symbol).await {
                Ok(trade) => Some(Quote::new(
                    symbol,
                    trade.price,
                    trade.timestamp,
                    QuoteSource::LiveTrade,
                )),
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "Latest trade fetch failed");
                    None
                }
            }
        } else {
            self.get_recent_close(symbol)
                .await
                .map(|(price, timestamp)| {
                    Quote::new(symbol, price, timestamp, QuoteSource::LastClose)
                })
        }
    }

    /// Most recent daily close within the lookback window.
    pub async fn get_recent_close(
        &self,
        symbol: &str,
    ) -> Option<(Decimal, chrono::DateTime<chrono::Utc>)> {
        match self
            .broker
            .get_bars(symbol, "1Day", CLOSE_LOOKBACK_DAYS)
            .await
        {
            Ok(bars) => match bars.last() {
                Some(bar) => Some((bar.close, bar.timestamp)),
                None => {
                    warn!(symbol = %symbol, "No daily bars available for close fallback");
                    None
                }
            },
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "Daily bars fetch failed");
                None
            }
        }
    }

    /// Holdings per symbol. Empty on failure.
    pub async fn get_positions(&self) -> HashMap<String, i64> {
        match self.broker.list_positions().await {
            Ok(positions) => positions.into_iter().map(|p| (p.symbol, p.qty)).collect(),
            Err(e) => {
                warn!(error = %e, "Positions fetch failed");
                HashMap::new()
            }
        }
    }

    pub async fn get_account_equity(&self) -> Option<Decimal> {
        match self.broker.get_account().await {
            Ok(account) => Some(account.equity),
            Err(e) => {
                warn!(error = %e, "Account equity fetch failed");
                None
            }
        }
    }

    pub async fn get_buying_power(&self) -> Option<Decimal> {
        match self.broker.get_account().await {
            Ok(account) => Some(account.buying_power),
            Err(e) => {
                warn!(error = %e, "Buying power fetch failed");
                None
            }
        }
    }

    /// Assemble the per-instrument display row from an already-fetched
    /// quote and position map.
    pub fn instrument_snapshot(
        instrument: &Instrument,
        quote: Option<&Quote>,
        positions: &HashMap<String, i64>,
    ) -> InstrumentSnapshot {
        let shares_owned = positions.get(&instrument.symbol).copied().unwrap_or(0);
        let current_price = quote.map(|q| q.price);

        InstrumentSnapshot {
            symbol: instrument.symbol.clone(),
            current_price,
            quote_time: quote.map(|q| q.timestamp),
            quote_source: quote.map(|q| q.source),
            buy_threshold: instrument.buy_threshold,
            sell_threshold: instrument.sell_threshold,
            exchange: instrument.exchange.clone(),
            shares_owned,
            market_value: current_price.map(|p| p * Decimal::from(shares_owned)),
        }
    }
}
