//! REST implementation of the [`Broker`] trait.
//!
//! Talks to an Alpaca-style brokerage: trading endpoints on the account
//! host, market data on the data host. Every call shares one HTTP client
//! with a bounded timeout so a stalled request cannot hang a cycle.

use crate::api::{
    Account, Bar, Broker, Clock, LatestTrade, OrderRequest, OrderView, RawPosition, SubmittedOrder,
};
use crate::error::{BrokerError, BrokerResult};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Default timeout for broker API requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const KEY_HEADER: &str = "APCA-API-KEY-ID";
const SECRET_HEADER: &str = "APCA-API-SECRET-KEY";

/// Connection settings for the REST broker.
#[derive(Debug, Clone)]
pub struct RestBrokerConfig {
    /// Trading API host (e.g., "https://paper-api.alpaca.markets").
    pub base_url: String,
    /// Market data API host (e.g., "https://data.alpaca.markets").
    pub data_url: String,
    pub key_id: String,
    pub secret_key: String,
    /// Per-request timeout. Defaults to 10 s.
    pub timeout: Duration,
}

impl RestBrokerConfig {
    pub fn new(
        base_url: impl Into<String>,
        data_url: impl Into<String>,
        key_id: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            data_url: data_url.into(),
            key_id: key_id.into(),
            secret_key: secret_key.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// REST broker client.
pub struct RestBroker {
    client: Client,
    config: RestBrokerConfig,
}

/// Wrapper for the latest-trade data endpoint.
#[derive(Debug, Deserialize)]
struct LatestTradeResponse {
    trade: LatestTrade,
}

/// Wrapper for the bars data endpoint.
#[derive(Debug, Deserialize)]
struct BarsResponse {
    #[serde(default)]
    bars: Vec<Bar>,
}

impl RestBroker {
    pub fn new(config: RestBrokerConfig) -> BrokerResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BrokerError::ClientSetup(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Trading API host.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header(KEY_HEADER, &self.config.key_id)
            .header(SECRET_HEADER, &self.config.secret_key)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> BrokerResult<T> {
        debug!(url = %url, "Broker GET");
        let response = self.authed(self.client.get(&url)).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BrokerError::Api {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| BrokerError::Decode(e.to_string()))
    }
}

#[async_trait]
impl Broker for RestBroker {
    async fn get_clock(&self) -> BrokerResult<Clock> {
        self.get_json(format!("{}/v2/clock", self.config.base_url))
            .await
    }

    async fn get_account(&self) -> BrokerResult<Account> {
        self.get_json(format!("{}/v2/account", self.config.base_url))
            .await
    }

    async fn get_latest_trade(&self, symbol: &str) -> BrokerResult<LatestTrade> {
        let response: LatestTradeResponse = self
            .get_json(format!(
                "{}/v2/stocks/{}/trades/latest",
                self.config.data_url, symbol
            ))
            .await?;
        Ok(response.trade)
    }

    async fn get_bars(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: usize,
    ) -> BrokerResult<Vec<Bar>> {
        let response: BarsResponse = self
            .get_json(format!(
                "{}/v2/stocks/{}/bars?timeframe={}&limit={}",
                self.config.data_url, symbol, timeframe, limit
            ))
            .await?;
        Ok(response.bars)
    }

    async fn list_positions(&self) -> BrokerResult<Vec<RawPosition>> {
        self.get_json(format!("{}/v2/positions", self.config.base_url))
            .await
    }

    async fn submit_order(&self, request: OrderRequest) -> BrokerResult<SubmittedOrder> {
        let url = format!("{}/v2/orders", self.config.base_url);
        debug!(url = %url, symbol = %request.symbol, side = %request.side, "Broker POST order");

        let response = self
            .authed(self.client.post(&url))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BrokerError::Api {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<SubmittedOrder>()
            .await
            .map_err(|e| BrokerError::Decode(e.to_string()))
    }

    async fn get_order(&self, order_id: &str) -> BrokerResult<OrderView> {
        self.get_json(format!("{}/v2/orders/{}", self.config.base_url, order_id))
            .await
    }
}
