//! Main application orchestration.
//!
//! Wires the broker, gateway, ledger, executor, and dashboard together
//! and drives the two independent periodic cycles.

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::scheduler::{spawn_periodic, PeriodicCycle};
use async_trait::async_trait;
use pulse_broker::{Broker, RestBroker, RestBrokerConfig};
use pulse_core::AccountType;
use pulse_dashboard::{run_server, DashboardState};
use pulse_engine::{ConfigHandle, DecisionCycle, LastActionCache, OrderExecutor};
use pulse_feed::MarketDataGateway;
use pulse_ledger::TradeLedger;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{error, info};

/// Broadcast channel capacity: enough to absorb a briefly slow
/// subscriber at the 30 s cadence.
const BROADCAST_CAPACITY: usize = 32;

const KEY_ID_ENV: &str = "APCA_API_KEY_ID";
const SECRET_KEY_ENV: &str = "APCA_API_SECRET_KEY";
const BASE_URL_ENV: &str = "APCA_API_BASE_URL";

/// Main application.
pub struct Application {
    config: AppConfig,
}

struct DecisionTask(DecisionCycle);

#[async_trait]
impl PeriodicCycle for DecisionTask {
    fn name(&self) -> &'static str {
        "decision"
    }

    async fn run(&self) {
        let report = self.0.run().await;
        if report.market_open {
            info!(
                evaluated = report.evaluated,
                signals = report.signals,
                filled = report.filled,
                skipped = report.skipped,
                "Decision cycle complete"
            );
        }
    }
}

struct BroadcastTask {
    state: DashboardState,
    tx: broadcast::Sender<String>,
}

#[async_trait]
impl PeriodicCycle for BroadcastTask {
    fn name(&self) -> &'static str {
        "broadcast"
    }

    async fn run(&self) {
        self.state.broadcast_data_update(&self.tx).await;
    }
}

impl Application {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Run until interrupted.
    pub async fn run(self) -> AppResult<()> {
        let config = self.config;

        let key_id = std::env::var(KEY_ID_ENV)
            .map_err(|_| AppError::Config(format!("{KEY_ID_ENV} not set")))?;
        let secret_key = std::env::var(SECRET_KEY_ENV)
            .map_err(|_| AppError::Config(format!("{SECRET_KEY_ENV} not set")))?;
        let base_url =
            std::env::var(BASE_URL_ENV).unwrap_or_else(|_| config.broker.base_url.clone());

        let account_type = AccountType::from_base_url(&base_url);
        info!(base_url = %base_url, account_type = %account_type, "Connecting to broker");

        let broker: Arc<dyn Broker> = Arc::new(RestBroker::new(RestBrokerConfig::new(
            base_url,
            config.broker.data_url.clone(),
            key_id,
            secret_key,
        ))?);

        let gateway = MarketDataGateway::new(Arc::clone(&broker));
        let ledger = Arc::new(TradeLedger::new(&config.ledger.trade_log));
        let last_actions = LastActionCache::new();
        let (broadcast_tx, _) = broadcast::channel(BROADCAST_CAPACITY);

        let trading_config = ConfigHandle::new(config.trading.clone().into());

        let executor = Arc::new(OrderExecutor::new(
            Arc::clone(&broker),
            Arc::clone(&ledger),
            last_actions.clone(),
            broadcast_tx.clone(),
            config.execution.clone().into(),
        ));

        let decision_cycle =
            DecisionCycle::new(gateway.clone(), executor, trading_config.clone());

        let dashboard_state = DashboardState::new(
            gateway,
            ledger,
            last_actions,
            trading_config,
            account_type,
        );

        let decision_handle = spawn_periodic(
            Arc::new(DecisionTask(decision_cycle)),
            Duration::from_secs(config.schedule.decision_interval_secs),
        );
        let broadcast_handle = spawn_periodic(
            Arc::new(BroadcastTask {
                state: dashboard_state.clone(),
                tx: broadcast_tx.clone(),
            }),
            Duration::from_secs(config.schedule.broadcast_interval_secs),
        );

        let server_handle = tokio::spawn(run_server(
            dashboard_state,
            broadcast_tx,
            config.dashboard.clone(),
        ));

        info!(
            decision_interval_secs = config.schedule.decision_interval_secs,
            broadcast_interval_secs = config.schedule.broadcast_interval_secs,
            "pulse bot running"
        );

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested");
            }
            result = server_handle => {
                match result {
                    Ok(Err(e)) => error!(error = %e, "Dashboard server failed"),
                    Err(e) => error!(error = %e, "Dashboard server task panicked"),
                    Ok(Ok(())) => {}
                }
            }
        }

        decision_handle.abort();
        broadcast_handle.abort();
        Ok(())
    }
}
