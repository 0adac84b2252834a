//! Runtime-mutable trading configuration.
//!
//! The configuration is owned by a single handle; every cycle reads an
//! immutable snapshot taken at cycle start, so thresholds and the
//! instrument list only ever change between cycles.

use parking_lot::RwLock;
use pulse_core::Instrument;
use std::sync::Arc;
use tracing::warn;

/// Strategy labels offered to the operator. Display-only.
pub const STRATEGIES: [&str; 5] = [
    "Scalping",
    "Momentum Trading",
    "Breakout Trading",
    "Reversal Trading",
    "News-Based Trading",
];

/// Trading configuration as read by one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct TradingConfig {
    /// Instruments in evaluation order.
    pub instruments: Vec<Instrument>,
    /// Selected strategy label.
    pub strategy: String,
    /// Broker label.
    pub broker: String,
    /// Shares per order.
    pub order_qty: i64,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            instruments: Vec::new(),
            strategy: STRATEGIES[0].to_string(),
            broker: "Alpaca".to_string(),
            order_qty: 1,
        }
    }
}

impl TradingConfig {
    /// Warn about instruments whose buy threshold is at or above their
    /// sell threshold. Such instruments can oscillate every cycle; the
    /// operator is told, the configuration is still accepted.
    pub fn flag_overlapping_thresholds(&self) {
        for instrument in &self.instruments {
            if instrument.thresholds_overlap() {
                warn!(
                    symbol = %instrument.symbol,
                    buy = %instrument.buy_threshold,
                    sell = %instrument.sell_threshold,
                    "Buy threshold is not below sell threshold; instrument may oscillate"
                );
            }
        }
    }
}

/// Shared handle to the trading configuration.
#[derive(Clone, Default)]
pub struct ConfigHandle {
    inner: Arc<RwLock<TradingConfig>>,
}

impl ConfigHandle {
    pub fn new(config: TradingConfig) -> Self {
        config.flag_overlapping_thresholds();
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Immutable snapshot for one cycle.
    pub fn snapshot(&self) -> TradingConfig {
        self.inner.read().clone()
    }

    /// Replace the configuration. Takes effect from the next cycle.
    pub fn update(&self, config: TradingConfig) {
        config.flag_overlapping_thresholds();
        *self.inner.write() = config;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_snapshot_is_isolated_from_updates() {
        let handle = ConfigHandle::new(TradingConfig {
            instruments: vec![Instrument::new("FFIE", dec!(0.58), dec!(0.60))],
            ..TradingConfig::default()
        });

        let snapshot = handle.snapshot();

        let mut updated = handle.snapshot();
        updated.instruments[0].buy_threshold = dec!(0.50);
        handle.update(updated);

        // The earlier snapshot still sees the old threshold.
        assert_eq!(snapshot.instruments[0].buy_threshold, dec!(0.58));
        assert_eq!(handle.snapshot().instruments[0].buy_threshold, dec!(0.50));
    }

    #[test]
    fn test_default_config() {
        let config = TradingConfig::default();
        assert_eq!(config.order_qty, 1);
        assert_eq!(config.strategy, "Scalping");
        assert!(config.instruments.is_empty());
    }
}
