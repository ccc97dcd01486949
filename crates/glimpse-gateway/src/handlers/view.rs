use crate::error::Result;
use crate::model::ViewResponse;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use glimpse_core::Code;
use glimpse_viewer::View;
use tracing::trace;

pub async fn view_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Response> {
    // Malformed codes cannot exist, so they get the same answer as unknown ones.
    let Ok(code) = Code::parse(code) else {
        trace!("rejecting malformed code");
        return Ok((StatusCode::NOT_FOUND, Json(ViewResponse::not_found())).into_response());
    };

    let view = state.viewer().view(&code).await?;
    let status = match view {
        View::NotFound => StatusCode::NOT_FOUND,
        View::Exhausted => StatusCode::GONE,
        View::Consumed { .. } => StatusCode::OK,
    };

    Ok((status, Json(ViewResponse::from(view))).into_response())
}
