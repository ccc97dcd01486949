use crate::model::ErrorResponse;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use glimpse_viewer::ViewerError;
use tracing::error;

pub type Result<T> = std::result::Result<T, AppError>;

pub struct AppError(ViewerError);

impl From<ViewerError> for AppError {
    fn from(value: ViewerError) -> Self {
        Self(value)
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            ViewerError::Storage(e) if e.is_unavailable() => StatusCode::SERVICE_UNAVAILABLE,
            ViewerError::Storage(_) | ViewerError::CorruptPayload { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        error!(status = %status, error = %self.0, "request failed");

        let message = if status == StatusCode::SERVICE_UNAVAILABLE {
            "storage unavailable"
        } else {
            "internal error"
        };

        (
            status,
            Json(ErrorResponse {
                error: message.to_string(),
            }),
        )
            .into_response()
    }
}
