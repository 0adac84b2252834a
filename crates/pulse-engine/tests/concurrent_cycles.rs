//! Overlapping decision cycles must never submit duplicate orders for
//! the same instrument.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use pulse_broker::{
    Account, Bar, Broker, BrokerResult, Clock, LatestTrade, OrderRequest, OrderView, RawPosition,
    SubmittedOrder,
};
use pulse_core::Instrument;
use pulse_engine::{
    ConfigHandle, DecisionCycle, ExecutorConfig, LastActionCache, OrderExecutor, TradingConfig,
};
use pulse_feed::MarketDataGateway;
use pulse_ledger::TradeLedger;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::broadcast;

/// Market is open, price is always below the buy threshold, and order
/// polls stall so orders stay in flight across cycle boundaries.
struct StallingBroker {
    submit_count: AtomicU32,
    open_submissions: Mutex<u32>,
    max_open_submissions: Mutex<u32>,
}

impl StallingBroker {
    fn new() -> Self {
        Self {
            submit_count: AtomicU32::new(0),
            open_submissions: Mutex::new(0),
            max_open_submissions: Mutex::new(0),
        }
    }
}

#[async_trait]
impl Broker for StallingBroker {
    async fn get_clock(&self) -> BrokerResult<Clock> {
        Ok(Clock { is_open: true })
    }

    async fn get_account(&self) -> BrokerResult<Account> {
        Ok(Account {
            equity: dec!(25000),
            buying_power: dec!(50000),
        })
    }

    async fn get_latest_trade(&self, _symbol: &str) -> BrokerResult<LatestTrade> {
        Ok(LatestTrade {
            price: dec!(0.55),
            timestamp: Utc::now(),
        })
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

    async fn submit_order(&self, _request: OrderRequest) -> BrokerResult<SubmittedOrder> {
        self.submit_count.fetch_add(1, Ordering::SeqCst);
        {
            let mut open = self.open_submissions.lock();
            *open += 1;
            let mut max = self.max_open_submissions.lock();
            *max = (*max).max(*open);
        }
        Ok(SubmittedOrder {
            id: "stalled-order".to_string(),
        })
    }

    async fn get_order(&self, _order_id: &str) -> BrokerResult<OrderView> {
        // Keep the order pending long enough for every concurrent cycle
        // to observe it in flight.
        tokio::time::sleep(Duration::from_millis(30)).await;
        *self.open_submissions.lock() -= 1;
        Ok(OrderView {
            id: "stalled-order".to_string(),
            status: "canceled".to_string(),
            filled_avg_price: None,
            filled_at: None,
        })
    }
}

#[tokio::test]
async fn concurrent_cycles_submit_at_most_one_order_per_instrument() {
    let dir = TempDir::new().unwrap();
    let broker = Arc::new(StallingBroker::new());
    let ledger = Arc::new(TradeLedger::new(dir.path().join("trades.csv")));
    let (events, _) = broadcast::channel(16);

    let executor = Arc::new(OrderExecutor::new(
        Arc::clone(&broker) as Arc<dyn Broker>,
        Arc::clone(&ledger),
        LastActionCache::new(),
        events,
        ExecutorConfig {
            poll_attempts: 1,
            poll_delay: Duration::from_millis(1),
        },
    ));
    let gateway = MarketDataGateway::new(Arc::clone(&broker) as Arc<dyn Broker>);
    let config = ConfigHandle::new(TradingConfig {
        instruments: vec![Instrument::new("FFIE", dec!(0.58), dec!(0.60))],
        ..TradingConfig::default()
    });
    let cycle = Arc::new(DecisionCycle::new(gateway, executor, config));

    // Four cycles racing over the same instrument.
    let mut handles = Vec::new();
    for _ in 0..4 {
        let cycle = Arc::clone(&cycle);
        handles.push(tokio::spawn(async move { cycle.run().await }));
    }

    let mut skipped = 0;
    for handle in handles {
        skipped += handle.await.unwrap().skipped;
    }

    // One cycle won the in-flight slot; every other signal was
    // suppressed, not queued.
    assert_eq!(*broker.max_open_submissions.lock(), 1);
    assert_eq!(broker.submit_count.load(Ordering::SeqCst), 1);
    assert_eq!(skipped, 3);
    assert!(ledger.is_empty(), "canceled order must not create a trade");
}
