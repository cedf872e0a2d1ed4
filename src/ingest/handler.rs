use std::net::SocketAddr;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, RawQuery, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::app::AppState;
use crate::error::IngestError;
use crate::ingest::types::FormFields;
use crate::ingest::validate::validate;
use crate::metrics;

fn is_form_body(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

pub async fn input(
    State(st): State<AppState>,
    ConnectInfo(client): ConnectInfo<SocketAddr>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let body = is_form_body(&headers).then_some(&body[..]);
    let form = FormFields::parse(query.as_deref(), body);

    match handle(&st, &form).await {
        Ok(_) => StatusCode::OK.into_response(),
        Err(err) => {
            report(client, &err);
            err.into_response()
        }
    }
}

async fn handle(st: &AppState, form: &FormFields) -> Result<(), IngestError> {
    let req = validate(form, st.cfg.http.credential())?;
    st.writer.write_point(&req).await?;
    Ok(())
}

fn report(client: SocketAddr, err: &IngestError) {
    metrics::INGEST_REJECTED
        .with_label_values(&[err.reason()])
        .inc();
    match err {
        IngestError::PointConstruction(_) | IngestError::Write(_) => {
            tracing::error!(%client, reason = %err, "failed to store reading")
        }
        _ => tracing::warn!(%client, reason = %err, "bad request"),
    }
}
