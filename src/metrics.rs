use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

pub static POINTS_WRITTEN: Lazy<IntCounter> = Lazy::new(|| {
    let points_written = IntCounter::new(
        "gateway_points_written_total",
        "Number of points written to the store",
    )
    .unwrap();

    REGISTRY
        .register(Box::new(points_written.clone()))
        .unwrap();
    points_written
});

pub static INGEST_REJECTED: Lazy<IntCounterVec> = Lazy::new(|| {
    let rejected = IntCounterVec::new(
        Opts::new(
            "gateway_ingest_rejected_total",
            "Number of input requests that did not produce a point",
        ),
        &["reason"],
    )
    .unwrap();

    REGISTRY.register(Box::new(rejected.clone())).unwrap();
    rejected
});

pub static STORE_ERRORS: Lazy<IntCounterVec> = Lazy::new(|| {
    let errors = IntCounterVec::new(
        Opts::new("gateway_store_errors_total", "Failed store writes by kind"),
        &["kind"],
    )
    .unwrap();

    REGISTRY.register(Box::new(errors.clone())).unwrap();
    errors
});

/// Prometheus text exposition of every registered metric.
pub fn render() -> String {
    // touch the counters so they show up before the first event
    Lazy::force(&POINTS_WRITTEN);
    Lazy::force(&INGEST_REJECTED);
    Lazy::force(&STORE_ERRORS);

    let mut buf = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&REGISTRY.gather(), &mut buf) {
        tracing::warn!(error = %e, "encoding metrics");
    }
    String::from_utf8_lossy(&buf).into_owned()
}
