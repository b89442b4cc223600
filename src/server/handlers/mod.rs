//! HTTP handlers for the server.

pub mod canvas;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::EaselError;

impl EaselError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            EaselError::Validation(_) | EaselError::Fetch(_) | EaselError::Decode(_) => {
                StatusCode::BAD_REQUEST
            }
            EaselError::NotFound(_) => StatusCode::NOT_FOUND,
            EaselError::Export(_) | EaselError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Every failure is `{"error": <message>, "kind": <kind>}`.
impl IntoResponse for EaselError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, kind = self.kind(), "Request failed");
        }
        let body = json!({
            "error": self.to_string(),
            "kind": self.kind(),
        });
        (status, Json(body)).into_response()
    }
}
