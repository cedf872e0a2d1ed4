use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::config::StoreCfg;
use crate::domain::{DataPoint, Precision};
use crate::error::IngestError;
use crate::ingest::types::IngestRequest;
use crate::metrics;
use crate::store::{InfluxClient, StoreError, TimeSeriesStore};

/// Owns the store connection and turns validated requests into points.
pub struct PointWriter {
    store: Arc<dyn TimeSeriesStore>,
    database: String,
    measurement: String,
    open: AtomicBool,
}

impl PointWriter {
    /// Connects to the configured InfluxDB and makes sure the database exists.
    pub async fn connect(cfg: &StoreCfg) -> anyhow::Result<Self> {
        let client = InfluxClient::new(&cfg.url, cfg.timeout())?;
        info!(url = %cfg.url, "store client created");
        Self::start(Arc::new(client), cfg).await
    }

    /// Wraps an existing store. Fails if the database cannot be ensured.
    pub async fn start(store: Arc<dyn TimeSeriesStore>, cfg: &StoreCfg) -> anyhow::Result<Self> {
        store
            .ensure_database(&cfg.database)
            .await
            .map_err(|e| anyhow::anyhow!("creating database {:?}: {}", cfg.database, e))?;
        info!(database = %cfg.database, "database ready");

        Ok(Self {
            store,
            database: cfg.database.clone(),
            measurement: cfg.measurement.clone(),
            open: AtomicBool::new(true),
        })
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Moves the connection to the closed state. Later writes fail.
    pub fn close(&self) {
        if self.open.swap(false, Ordering::AcqRel) {
            info!("store connection closed");
        }
    }

    pub fn build_point(
        &self,
        req: &IngestRequest,
        now: OffsetDateTime,
    ) -> Result<DataPoint, IngestError> {
        DataPoint::builder(self.measurement.as_str())
            .tag("node", req.node.as_str())
            .fields(req.fields.clone())
            .timestamp(now)
            .build()
            .map_err(IngestError::PointConstruction)
    }

    /// Builds the point for `req` and writes it as a single-point batch.
    pub async fn write_point(&self, req: &IngestRequest) -> Result<DataPoint, IngestError> {
        let point = self.build_point(req, OffsetDateTime::now_utc())?;

        if !self.is_open() {
            return Err(IngestError::Write(StoreError::Closed));
        }

        self.store
            .write_points(&self.database, Precision::Seconds, std::slice::from_ref(&point))
            .await
            .map_err(|e| {
                metrics::STORE_ERRORS.with_label_values(&[e.kind()]).inc();
                IngestError::Write(e)
            })?;

        metrics::POINTS_WRITTEN.inc();
        debug!(node = %req.node, fields = point.fields().len(), "point written");
        Ok(point)
    }
}
