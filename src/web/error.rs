//! HTTP mapping of [`Error`].

use crate::errors::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{error, warn};

impl Error {
    /// Status code the error is reported with
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ItemNotFound { .. } => StatusCode::NOT_FOUND,
            Self::RevisionConflict { .. } => StatusCode::CONFLICT,
            Self::SaveFailed { source, .. } => source.status_code(),
            e if e.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();
        if status.is_server_error() {
            error!("Request failed: {message}");
        } else {
            warn!("Request rejected ({status}): {message}");
        }

        let body = match &self {
            Self::SaveFailed { saved, .. } => json!({ "error": message, "saved": saved }),
            Self::RevisionConflict { actual, .. } => json!({ "error": message, "revision": actual }),
            _ => json!({ "error": message }),
        };
        (status, Json(body)).into_response()
    }
}
