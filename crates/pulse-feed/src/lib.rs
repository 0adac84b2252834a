//! Market data gateway for the pulse trading bot.
//!
//! Pure reads against the broker with per-call degradation: a provider
//! failure turns into an absent value and a log line, never an error that
//! aborts the calling cycle.

pub mod gateway;

pub use gateway::MarketDataGateway;
