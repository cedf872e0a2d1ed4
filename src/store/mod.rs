use axum::async_trait;

use crate::domain::{DataPoint, PointError, Precision};

pub mod influx;

pub use influx::InfluxClient;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("invalid store address {addr:?}: {reason}")]
    InvalidAddress { addr: String, reason: String },
    #[error("request to store failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("store returned {status}: {message}")]
    Http {
        status: reqwest::StatusCode,
        message: String,
    },
    #[error("cannot decode query response: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("cannot encode point: {0}")]
    Encode(#[from] PointError),
    #[error("store rejected query: {0}")]
    Query(String),
    #[error("store connection is closed")]
    Closed,
}

impl StoreError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::InvalidAddress { .. } => "address",
            StoreError::Transport(_) => "transport",
            StoreError::Http { .. } => "http",
            StoreError::Decode(_) => "decode",
            StoreError::Encode(_) => "encode",
            StoreError::Query(_) => "query",
            StoreError::Closed => "closed",
        }
    }
}

/// Operations the gateway needs from a time-series database.
///
/// Implementations are shared across request tasks and must be safe to call
/// concurrently without external locking.
#[async_trait]
pub trait TimeSeriesStore: Send + Sync {
    /// Creates `database` if it does not exist. Must succeed when it already does.
    async fn ensure_database(&self, database: &str) -> Result<(), StoreError>;

    /// Writes `points` as one batch.
    async fn write_points(
        &self,
        database: &str,
        precision: Precision,
        points: &[DataPoint],
    ) -> Result<(), StoreError>;
}
