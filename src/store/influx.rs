//! Client for the InfluxDB 1.x HTTP API (`/query` and `/write`).

use axum::async_trait;
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{StoreError, TimeSeriesStore};
use crate::domain::{DataPoint, Precision};

#[derive(Debug, Clone)]
pub struct InfluxClient {
    base: Url,
    reqwest: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    results: Vec<StatementResult>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

impl InfluxClient {
    /// Builds a client for `addr` (`http://host:port`). No request is made;
    /// the address is only checked for shape.
    pub fn new(addr: &str, timeout: Option<Duration>) -> Result<Self, StoreError> {
        let invalid = |reason: String| StoreError::InvalidAddress {
            addr: addr.to_string(),
            reason,
        };
        let base = Url::parse(addr).map_err(|e| invalid(e.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme {:?}", base.scheme())));
        }
        if base.host_str().is_none() {
            return Err(invalid("missing host".into()));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            base,
            reqwest: builder.build()?,
        })
    }

    fn endpoint(&self, name: &str) -> Url {
        let mut url = self.base.clone();
        let path = format!("{}/{}", self.base.path().trim_end_matches('/'), name);
        url.set_path(&path);
        url.set_query(None);
        url
    }

    /// Runs a single InfluxQL statement that returns no series.
    pub async fn execute(&self, statement: &str) -> Result<(), StoreError> {
        let response = self
            .reqwest
            .post(self.endpoint("query"))
            .query(&[("q", statement)])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(StoreError::Http {
                status,
                message: error_message(&text),
            });
        }

        let parsed: QueryResponse = serde_json::from_str(&text).map_err(StoreError::Decode)?;
        if let Some(err) = parsed.error {
            return Err(StoreError::Query(err));
        }
        if let Some(err) = parsed.results.into_iter().find_map(|r| r.error) {
            return Err(StoreError::Query(err));
        }
        Ok(())
    }
}

#[async_trait]
impl TimeSeriesStore for InfluxClient {
    async fn ensure_database(&self, database: &str) -> Result<(), StoreError> {
        self.execute(&format!("CREATE DATABASE {}", quote_ident(database)))
            .await
    }

    async fn write_points(
        &self,
        database: &str,
        precision: Precision,
        points: &[DataPoint],
    ) -> Result<(), StoreError> {
        let body = points
            .iter()
            .map(DataPoint::line_protocol)
            .collect::<Result<String, _>>()?;
        debug!(database, points = points.len(), "writing batch");

        let response = self
            .reqwest
            .post(self.endpoint("write"))
            .query(&[("db", database), ("precision", precision.as_str())])
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await?;
            return Err(StoreError::Http {
                status,
                message: error_message(&text),
            });
        }
        Ok(())
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(b) => b.error,
        Err(_) => body.trim().to_string(),
    }
}
