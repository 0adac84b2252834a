//! Trading decision and order execution engine.
//!
//! - `signal`: pure threshold evaluation, quote + thresholds → decision
//! - `guard`: per-instrument in-flight order slots
//! - `executor`: submit + bounded fill-confirmation state machine
//! - `cycle`: one decision pass over the configured instrument list
//! - `config`: the runtime-mutable trading configuration handle

pub mod cache;
pub mod config;
pub mod cycle;
pub mod executor;
pub mod guard;
pub mod signal;

pub use cache::LastActionCache;
pub use config::{ConfigHandle, TradingConfig, STRATEGIES};
pub use cycle::{CycleReport, DecisionCycle};
pub use executor::{ExecutionOutcome, ExecutorConfig, OrderExecutor};
pub use guard::InFlightGuard;
pub use signal::evaluate;
