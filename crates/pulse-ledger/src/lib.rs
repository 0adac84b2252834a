//! Append-only trade ledger.
//!
//! An in-memory ordered record of completed trades plus a durable CSV log.
//! The ledger is the only writer to the log file; every other component
//! reads trades through [`TradeLedger::all_trades`].

pub mod error;
pub mod ledger;

pub use error::{LedgerError, LedgerResult};
pub use ledger::TradeLedger;
