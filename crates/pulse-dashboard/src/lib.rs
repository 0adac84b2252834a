//! Live update feed for the pulse trading bot.
//!
//! Aggregates market, account, and ledger state into `data_update`
//! payloads and serves them to WebSocket subscribers. A subscriber
//! connecting mid-session immediately receives a full snapshot instead of
//! waiting for the next scheduled broadcast.

pub mod config;
pub mod server;
pub mod state;

pub use config::DashboardConfig;
pub use server::{create_router, run_server, AppState};
pub use state::DashboardState;
