use std::net::SocketAddr;
use std::time::Duration;
use tracing::Span;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::{self, Response, StatusCode};
use axum::{response::IntoResponse, routing::get, Router};
use tokio::net::TcpListener;
use tower_http::classify::ServerErrorsFailureClass;
use tower_http::trace::TraceLayer;

use crate::app::AppState;
use crate::ingest::handler::input;
use crate::metrics;
use crate::readiness::shutdown_signal;

pub fn router(state: AppState) -> Router {
    let body_limit = state.cfg.ingest.max_payload_bytes;

    Router::new()
        .route("/input", get(input).post(input))
        .route("/input/", get(input).post(input))
        .route("/input/*rest", get(input).post(input))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(|| async { metrics::render() }))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &http::Request<_>| {
                    tracing::info_span!(
                      "http_request",
                      method = %req.method(),
                      path = %req.uri().path(),
                    )
                })
                .on_response(|res: &Response<_>, latency: Duration, _span: &Span| {
                    tracing::info!(
                      status = %res.status(),
                      latency_ms = %latency.as_millis(),
                      "response"
                    )
                })
                .on_failure(
                    |error: ServerErrorsFailureClass, latency: Duration, _span: &Span| {
                        tracing::warn!(%error, latency_ms = %latency.as_millis(), "request_failed");
                    },
                ),
        )
        .with_state(state)
}

/// Serves until a shutdown signal arrives and in-flight requests have drained.
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let addr = state.cfg.http.bind;
    let ready = state.ready.clone();
    let grace = state.cfg.http.shutdown_grace();
    let app = router(state);

    let listener: TcpListener = TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    println!("listening on {}", local);
    tracing::info!(addr = %local, "listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(ready, grace))
    .await?;
    Ok(())
}

async fn healthz() -> impl IntoResponse {
    "ok"
}

async fn readyz(State(st): State<AppState>) -> impl IntoResponse {
    if st.ready.is_ready() && st.writer.is_open() {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not ready")
    }
}
