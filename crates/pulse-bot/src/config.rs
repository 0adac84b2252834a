//! Application configuration.

use crate::error::{AppError, AppResult};
use pulse_core::Instrument;
use pulse_dashboard::DashboardConfig;
use pulse_engine::{ExecutorConfig, TradingConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Broker connection settings. Credentials come from the environment
/// (`APCA_API_KEY_ID` / `APCA_API_SECRET_KEY`), never from the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Trading API host. Overridable via `APCA_API_BASE_URL`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Market data API host.
    #[serde(default = "default_data_url")]
    pub data_url: String,
}

fn default_base_url() -> String {
    "https://paper-api.alpaca.markets".to_string()
}

fn default_data_url() -> String {
    "https://data.alpaca.markets".to_string()
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            data_url: default_data_url(),
        }
    }
}

/// Cycle cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Trading decision cycle interval (seconds). Default: 60.
    #[serde(default = "default_decision_interval_secs")]
    pub decision_interval_secs: u64,
    /// Broadcast cycle interval (seconds). Default: 30.
    #[serde(default = "default_broadcast_interval_secs")]
    pub broadcast_interval_secs: u64,
}

fn default_decision_interval_secs() -> u64 {
    60
}

fn default_broadcast_interval_secs() -> u64 {
    30
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            decision_interval_secs: default_decision_interval_secs(),
            broadcast_interval_secs: default_broadcast_interval_secs(),
        }
    }
}

/// Fill-confirmation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Status poll attempts per order. Default: 3.
    #[serde(default = "default_poll_attempts")]
    pub poll_attempts: u32,
    /// Delay between poll attempts (seconds). Default: 3.
    #[serde(default = "default_poll_delay_secs")]
    pub poll_delay_secs: u64,
}

fn default_poll_attempts() -> u32 {
    3
}

fn default_poll_delay_secs() -> u64 {
    3
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            poll_attempts: default_poll_attempts(),
            poll_delay_secs: default_poll_delay_secs(),
        }
    }
}

impl From<ExecutionConfig> for ExecutorConfig {
    fn from(cfg: ExecutionConfig) -> Self {
        Self {
            poll_attempts: cfg.poll_attempts,
            poll_delay: Duration::from_secs(cfg.poll_delay_secs),
        }
    }
}

/// Ledger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Trade log file path. Default: "trades.csv".
    #[serde(default = "default_trade_log")]
    pub trade_log: String,
}

fn default_trade_log() -> String {
    "trades.csv".to_string()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            trade_log: default_trade_log(),
        }
    }
}

/// Initial trading configuration, mutable at runtime through the
/// dashboard config endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingFileConfig {
    #[serde(default)]
    pub instruments: Vec<Instrument>,
    #[serde(default = "default_strategy")]
    pub strategy: String,
    #[serde(default = "default_broker_label")]
    pub broker: String,
    /// Shares per order. Default: 1.
    #[serde(default = "default_order_qty")]
    pub order_qty: i64,
}

fn default_strategy() -> String {
    "Scalping".to_string()
}

fn default_broker_label() -> String {
    "Alpaca".to_string()
}

fn default_order_qty() -> i64 {
    1
}

impl Default for TradingFileConfig {
    fn default() -> Self {
        Self {
            instruments: Vec::new(),
            strategy: default_strategy(),
            broker: default_broker_label(),
            order_qty: default_order_qty(),
        }
    }
}

impl From<TradingFileConfig> for TradingConfig {
    fn from(cfg: TradingFileConfig) -> Self {
        Self {
            instruments: cfg.instruments,
            strategy: cfg.strategy,
            broker: cfg.broker,
            order_qty: cfg.order_qty,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub broker: BrokerConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub trading: TradingFileConfig,
}

impl AppConfig {
    /// Load configuration from the default location.
    pub fn load() -> AppResult<Self> {
        let config_path =
            std::env::var("PULSE_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());

        if Path::new(&config_path).exists() {
            Self::from_file(&config_path)
        } else {
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }
}
