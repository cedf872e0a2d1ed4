use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::domain::PointError;
use crate::store::StoreError;

/// Everything that can go wrong with a single `/input/` request.
#[derive(thiserror::Error, Debug)]
pub enum IngestError {
    #[error("No node given")]
    MissingNode,
    #[error("No apikey given")]
    MissingCredential,
    #[error("Wrong apikey")]
    InvalidCredential,
    #[error("Error unmarshalling json: {0}")]
    MalformedPayload(#[source] serde_json::Error),
    #[error("Error creating Point: {0}")]
    PointConstruction(#[source] PointError),
    #[error("Error writing to database: {0}")]
    Write(#[source] StoreError),
}

impl IngestError {
    pub fn status(&self) -> StatusCode {
        match self {
            IngestError::MissingNode
            | IngestError::MissingCredential
            | IngestError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            IngestError::InvalidCredential => StatusCode::UNAUTHORIZED,
            IngestError::PointConstruction(_) | IngestError::Write(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Label for the rejection counter.
    pub fn reason(&self) -> &'static str {
        match self {
            IngestError::MissingNode => "missing_node",
            IngestError::MissingCredential => "missing_credential",
            IngestError::InvalidCredential => "invalid_credential",
            IngestError::MalformedPayload(_) => "malformed_payload",
            IngestError::PointConstruction(_) => "point_construction",
            IngestError::Write(_) => "write",
        }
    }

    /// The reason sent back to the device: one line, newline terminated.
    pub fn body(&self) -> String {
        let mut line = self.to_string().replace(['\r', '\n'], " ");
        line.push('\n');
        line
    }
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        (self.status(), self.body()).into_response()
    }
}
