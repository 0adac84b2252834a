//! The trading decision cycle.

use crate::config::ConfigHandle;
use crate::executor::{ExecutionOutcome, OrderExecutor};
use crate::signal::evaluate;
use pulse_feed::MarketDataGateway;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Summary of one decision cycle, for logging and tests.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub market_open: bool,
    pub evaluated: usize,
    pub signals: usize,
    pub filled: usize,
    pub skipped: usize,
}

/// One periodic pass: market gate, then signal evaluation and order
/// execution per instrument, in configured order.
pub struct DecisionCycle {
    gateway: MarketDataGateway,
    executor: Arc<OrderExecutor>,
    config: ConfigHandle,
}

impl DecisionCycle {
    pub fn new(
        gateway: MarketDataGateway,
        executor: Arc<OrderExecutor>,
        config: ConfigHandle,
    ) -> Self {
        Self {
            gateway,
            executor,
            config,
        }
    }

    /// Run one cycle against an immutable configuration snapshot.
    ///
    /// Every failure is scoped to one instrument; the cycle always
    /// completes the remaining instruments.
    pub async fn run(&self) -> CycleReport {
        let config = self.config.snapshot();
        let mut report = CycleReport::default();

        let status = self.gateway.get_market_status().await;
        if !status.is_open() {
            info!("Market is closed. No trading will be done.");
            return report;
        }
        report.market_open = true;

        for instrument in &config.instruments {
            report.evaluated += 1;
            let quote = self.gateway.get_quote(instrument, true).await;

            debug!(
                symbol = %instrument.symbol,
                price = ?quote.as_ref().map(|q| q.price),
                buy_threshold = %instrument.buy_threshold,
                sell_threshold = %instrument.sell_threshold,
                "Checking trading conditions"
            );

            let signal = match evaluate(quote.as_ref(), instrument) {
                Some(signal) => signal,
                None => {
                    if quote.is_none() {
                        warn!(
                            symbol = %instrument.symbol,
                            "No current price available to evaluate trading conditions"
                        );
                    }
                    continue;
                }
            };

            report.signals += 1;
            info!(
                symbol = %signal.symbol,
                side = %signal.side,
                price = %signal.trigger_price,
                "Threshold crossed"
            );

            match self
                .executor
                .place_order(&signal.symbol, config.order_qty, signal.side)
                .await
            {
                ExecutionOutcome::Filled(_) => report.filled += 1,
                ExecutionOutcome::Skipped => report.skipped += 1,
                ExecutionOutcome::Unfilled(_) | ExecutionOutcome::SubmitFailed => {}
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::LastActionCache;
    use crate::config::TradingConfig;
    use crate::executor::ExecutorConfig;
    use async_trait::async_trait;
    use chrono::Utc;
    use parking_lot::Mutex;
    use pulse_broker::{
        Account, Bar, Broker, BrokerError, BrokerResult, Clock, LatestTrade, OrderRequest,
        OrderView, RawPosition, SubmittedOrder,
    };
    use pulse_core::Instrument;
    use pulse_ledger::TradeLedger;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::sync::broadcast;

    /// Broker with per-symbol prices; orders fill immediately at the
    /// live price.
    struct MarketBroker {
        open: bool,
        prices: HashMap<String, Decimal>,
        submit_count: AtomicU32,
        last_submitted: Mutex<Option<OrderRequest>>,
    }

    impl MarketBroker {
        fn new(open: bool, prices: &[(&str, Decimal)]) -> Self {
            Self {
                open,
                prices: prices
                    .iter()
                    .map(|(s, p)| (s.to_string(), *p))
                    .collect(),
                submit_count: AtomicU32::new(0),
                last_submitted: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl Broker for MarketBroker {
        async fn get_clock(&self) -> BrokerResult<Clock> {
            Ok(Clock { is_open: self.open })
        }

        async fn get_account(&self) -> BrokerResult<Account> {
            Ok(Account {
                equity: dec!(25000),
                buying_power: dec!(50000),
            })
        }

        async fn get_latest_trade(&self, symbol: &str) -> BrokerResult<LatestTrade> {
            match self.prices.get(symbol) {
                Some(price) => Ok(LatestTrade {
                    price: *price,
                    timestamp: Utc::now(),
                }),
                None => Err(BrokerError::Api {
                    status: 404,
                    body: "no trade data".to_string(),
                }),
            }
        }

        async fn get_bars(
            &self,
            _symbol: &str,
            _timeframe: &str,
            _limit: usize,
        ) -> BrokerResult<Vec<Bar>> {
            Ok(Vec::new())
        }

        async fn list_positions(&self) -> BrokerResult<Vec<RawPosition>> {
            Ok(Vec::new())
        }

        async fn submit_order(&self, request: OrderRequest) -> BrokerResult<SubmittedOrder> {
            self.submit_count.fetch_add(1, Ordering::SeqCst);
            *self.last_submitted.lock() = Some(request);
            Ok(SubmittedOrder {
                id: "cycle-order".to_string(),
            })
        }

        async fn get_order(&self, _order_id: &str) -> BrokerResult<OrderView> {
            let submitted = self.last_submitted.lock();
            let symbol = submitted.as_ref().map(|r| r.symbol.clone()).unwrap_or_default();
            let price = self.prices.get(&symbol).copied().unwrap_or(dec!(1));
            Ok(OrderView {
                id: "cycle-order".to_string(),
                status: "filled".to_string(),
                filled_avg_price: Some(price),
                filled_at: Some(Utc::now()),
            })
        }
    }

    struct Harness {
        cycle: DecisionCycle,
        broker: Arc<MarketBroker>,
        ledger: Arc<TradeLedger>,
        _dir: TempDir,
    }

    fn harness(broker: MarketBroker, instruments: Vec<Instrument>) -> Harness {
        let dir = TempDir::new().unwrap();
        let broker = Arc::new(broker);
        let ledger = Arc::new(TradeLedger::new(dir.path().join("trades.csv")));
        let (events, _) = broadcast::channel(16);
        let executor = Arc::new(OrderExecutor::new(
            Arc::clone(&broker) as Arc<dyn Broker>,
            Arc::clone(&ledger),
            LastActionCache::new(),
            events,
            ExecutorConfig {
                poll_attempts: 3,
                poll_delay: Duration::from_millis(1),
            },
        ));
        let gateway = MarketDataGateway::new(Arc::clone(&broker) as Arc<dyn Broker>);
        let config = ConfigHandle::new(TradingConfig {
            instruments,
            ..TradingConfig::default()
        });
        Harness {
            cycle: DecisionCycle::new(gateway, executor, config),
            broker,
            ledger,
            _dir: dir,
        }
    }

    #[tokio::test]
    async fn test_market_closed_evaluates_nothing() {
        let h = harness(
            MarketBroker::new(false, &[("FFIE", dec!(0.55))]),
            vec![Instrument::new("FFIE", dec!(0.58), dec!(0.60))],
        );
        let report = h.cycle.run().await;
        assert!(!report.market_open);
        assert_eq!(report.evaluated, 0);
        assert_eq!(h.broker.submit_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_buy_signal_fills_and_records() {
        let h = harness(
            MarketBroker::new(true, &[("FFIE", dec!(0.55))]),
            vec![Instrument::new("FFIE", dec!(0.58), dec!(0.60))],
        );
        let report = h.cycle.run().await;
        assert_eq!(report.signals, 1);
        assert_eq!(report.filled, 1);

        let trades = h.ledger.all_trades();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].price, dec!(0.55));
    }

    #[tokio::test]
    async fn test_unavailable_quote_is_skipped_cycle_continues() {
        // FFIE has no price data; NXTC sells above threshold.
        let h = harness(
            MarketBroker::new(true, &[("NXTC", dec!(1.25))]),
            vec![
                Instrument::new("FFIE", dec!(0.58), dec!(0.60)),
                Instrument::new("NXTC", dec!(1.20), dec!(1.21)),
            ],
        );
        let report = h.cycle.run().await;
        assert_eq!(report.evaluated, 2);
        assert_eq!(report.signals, 1);
        assert_eq!(h.broker.submit_count.load(Ordering::SeqCst), 1);

        let submitted = h.broker.last_submitted.lock();
        assert_eq!(submitted.as_ref().unwrap().symbol, "NXTC");
    }

    #[tokio::test]
    async fn test_price_inside_band_places_no_order() {
        let h = harness(
            MarketBroker::new(true, &[("FFIE", dec!(0.59))]),
            vec![Instrument::new("FFIE", dec!(0.58), dec!(0.60))],
        );
        let report = h.cycle.run().await;
        assert_eq!(report.evaluated, 1);
        assert_eq!(report.signals, 0);
        assert_eq!(h.broker.submit_count.load(Ordering::SeqCst), 0);
    }
}
