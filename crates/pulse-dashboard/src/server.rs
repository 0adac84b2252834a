//! HTTP/WebSocket server implementation using axum.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use futures_util::stream::StreamExt;
use futures_util::SinkExt;
use pulse_core::{BotMessage, Instrument};
use pulse_engine::STRATEGIES;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

use crate::config::DashboardConfig;
use crate::state::DashboardState;

/// Connection limiter to prevent too many concurrent WebSocket connections.
pub struct ConnectionLimiter {
    current: AtomicUsize,
    max: usize,
}

impl ConnectionLimiter {
    pub fn new(max: usize) -> Self {
        Self {
            current: AtomicUsize::new(0),
            max,
        }
    }

    pub fn try_acquire(&self) -> Option<ConnectionGuard<'_>> {
        loop {
            let current = self.current.load(Ordering::Acquire);
            if current >= self.max {
                return None;
            }
            if self
                .current
                .compare_exchange(current, current + 1, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return Some(ConnectionGuard { limiter: self });
            }
        }
    }

    pub fn current_count(&self) -> usize {
        self.current.load(Ordering::Relaxed)
    }
}

pub struct ConnectionGuard<'a> {
    limiter: &'a ConnectionLimiter,
}

impl Drop for ConnectionGuard<'_> {
    fn drop(&mut self) {
        self.limiter.current.fetch_sub(1, Ordering::Release);
    }
}

/// Shared application state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    dashboard_state: DashboardState,
    broadcast_tx: broadcast::Sender<String>,
    connection_limiter: Arc<ConnectionLimiter>,
}

impl AppState {
    pub fn new(
        dashboard_state: DashboardState,
        broadcast_tx: broadcast::Sender<String>,
        config: &DashboardConfig,
    ) -> Self {
        Self {
            dashboard_state,
            broadcast_tx,
            connection_limiter: Arc::new(ConnectionLimiter::new(config.max_connections)),
        }
    }
}

/// Trading configuration as served to the setup collaborator.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigView {
    pub instruments: Vec<Instrument>,
    pub strategy: String,
    pub broker: String,
    pub order_qty: i64,
    pub strategies: Vec<&'static str>,
}

/// Partial runtime configuration update. Omitted fields keep their
/// current values; changes take effect from the next cycle.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigUpdate {
    pub instruments: Option<Vec<Instrument>>,
    pub strategy: Option<String>,
    pub broker: Option<String>,
    pub order_qty: Option<i64>,
}

/// Create the axum router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/api/snapshot", get(get_snapshot))
        .route("/api/config", get(get_config).post(update_config))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Current aggregate state as JSON.
async fn get_snapshot(State(state): State<AppState>) -> Json<pulse_core::DataUpdate> {
    Json(state.dashboard_state.collect_data_update().await)
}

/// Current trading configuration.
async fn get_config(State(state): State<AppState>) -> Json<ConfigView> {
    let trading = state.dashboard_state.trading_config().snapshot();
    Json(ConfigView {
        instruments: trading.instruments,
        strategy: trading.strategy,
        broker: trading.broker,
        order_qty: trading.order_qty,
        strategies: STRATEGIES.to_vec(),
    })
}

/// Apply a runtime configuration update.
async fn update_config(
    State(state): State<AppState>,
    Json(update): Json<ConfigUpdate>,
) -> Json<ConfigView> {
    let handle = state.dashboard_state.trading_config();
    let mut trading = handle.snapshot();

    if let Some(instruments) = update.instruments {
        trading.instruments = instruments;
    }
    if let Some(strategy) = update.strategy {
        trading.strategy = strategy;
    }
    if let Some(broker) = update.broker {
        trading.broker = broker;
    }
    if let Some(order_qty) = update.order_qty {
        trading.order_qty = order_qty;
    }

    info!(
        instruments = trading.instruments.len(),
        strategy = %trading.strategy,
        "Trading configuration updated"
    );
    handle.update(trading.clone());

    Json(ConfigView {
        instruments: trading.instruments,
        strategy: trading.strategy,
        broker: trading.broker,
        order_qty: trading.order_qty,
        strategies: STRATEGIES.to_vec(),
    })
}

/// WebSocket upgrade handler.
async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    if state.connection_limiter.try_acquire().is_none() {
        warn!(
            current = state.connection_limiter.current_count(),
            "WebSocket connection limit reached"
        );
        return (StatusCode::SERVICE_UNAVAILABLE, "Too many connections").into_response();
    }

    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

/// Handle one subscriber connection.
async fn handle_ws_connection(socket: WebSocket, state: AppState) {
    let _guard = match state.connection_limiter.try_acquire() {
        Some(guard) => guard,
        None => {
            warn!("Connection limit reached during upgrade");
            return;
        }
    };

    info!(
        connections = state.connection_limiter.current_count(),
        "New subscriber connected"
    );

    let (mut sender, mut receiver) = socket.split();

    // Subscribe before sending the snapshot so no broadcast is missed
    // in between.
    let mut broadcast_rx = state.broadcast_tx.subscribe();

    // A new subscriber immediately receives the full current state.
    let initial = BotMessage::DataUpdate(state.dashboard_state.collect_data_update().await);
    if let Ok(json) = serde_json::to_string(&initial) {
        if sender.send(Message::Text(json.into())).await.is_err() {
            debug!("Failed to send initial snapshot, subscriber disconnected");
            return;
        }
    }

    // Drain incoming frames for close detection.
    let mut incoming_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Close(_)) => {
                    debug!("Subscriber sent close frame");
                    break;
                }
                Err(e) => {
                    debug!(error = %e, "WebSocket receive error");
                    break;
                }
                _ => {}
            }
        }
    });

    // Forward broadcast messages until the subscriber goes away.
    loop {
        tokio::select! {
            result = broadcast_rx.recv() => {
                match result {
                    Ok(msg) => {
                        if sender.send(Message::Text(msg.into())).await.is_err() {
                            debug!("Send failed, subscriber disconnected");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        // Best-effort delivery: the subscriber simply
                        // missed those messages.
                        warn!(skipped = n, "Subscriber lagged, catching up");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("Broadcast channel closed");
                        break;
                    }
                }
            }
            _ = &mut incoming_task => {
                break;
            }
        }
    }

    info!(
        connections = state.connection_limiter.current_count().saturating_sub(1),
        "Subscriber disconnected"
    );
}

/// Run the dashboard HTTP server until the process exits.
pub async fn run_server(
    dashboard_state: DashboardState,
    broadcast_tx: broadcast::Sender<String>,
    config: DashboardConfig,
) -> std::io::Result<()> {
    let state = AppState::new(dashboard_state, broadcast_tx, &config);
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(port = config.port, "Starting dashboard server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}
