use std::sync::Arc;

use crate::config::GatewayCfg;
use crate::readiness::Readiness;
use crate::writer::PointWriter;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<GatewayCfg>,
    pub ready: Arc<Readiness>,
    pub writer: Arc<PointWriter>,
}

impl AppState {
    pub fn new(cfg: GatewayCfg, writer: PointWriter) -> Self {
        Self {
            cfg: Arc::new(cfg),
            ready: Arc::new(Readiness::new()),
            writer: Arc::new(writer),
        }
    }
}
