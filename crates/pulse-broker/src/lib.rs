//! Broker API capability for the pulse trading bot.
//!
//! The [`Broker`] trait is the injected seam between the trading engine
//! and the brokerage: production code talks to [`RestBroker`], tests
//! substitute a fake without touching call sites.

pub mod api;
pub mod error;
pub mod rest;

pub use api::{
    Account, Bar, Broker, Clock, LatestTrade, OrderDisposition, OrderRequest, OrderView,
    RawPosition, SubmittedOrder,
};
pub use error::{BrokerError, BrokerResult};
pub use rest::{RestBroker, RestBrokerConfig};
