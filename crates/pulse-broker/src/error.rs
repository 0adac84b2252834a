//! Broker error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    /// Network-level failure (connect, timeout, TLS).
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status from the broker.
    #[error("broker API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    /// Response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// HTTP client could not be constructed.
    #[error("client setup error: {0}")]
    ClientSetup(String),
}

impl From<reqwest::Error> for BrokerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

pub type BrokerResult<T> = Result<T, BrokerError>;
