//! Core domain types for the pulse trading bot.
//!
//! This crate provides the fundamental types shared across the system:
//! - `Instrument`: a tracked symbol with buy/sell thresholds
//! - `Quote`, `Position`: per-cycle market and account views
//! - `Order`, `OrderStatus`, `TradeSignal`: order lifecycle types
//! - `TradeRecord`, `LastAction`: ledger and display-cache entries
//! - `BotMessage`: wire payloads for the live update feed

pub mod events;
pub mod instrument;
pub mod order;
pub mod quote;
pub mod trade;

pub use events::{BotMessage, DataUpdate, InstrumentSnapshot, TradeUpdate};
pub use instrument::{AccountType, Instrument, MarketStatus};
pub use order::{ClientOrderId, Order, OrderStatus, OrderSide, TradeSignal};
pub use quote::{Position, Quote, QuoteSource};
pub use trade::{LastAction, TradeRecord};
