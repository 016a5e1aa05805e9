//! Aggregate statistics endpoint.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, instrument};

use super::error_response;
use crate::server::AppState;

/// Returns the aggregate snapshot over all stored messages.
#[instrument(name = "stats_snapshot", skip(state))]
pub async fn stats_snapshot(State(state): State<AppState>) -> Response {
    match state.storage.messages.stats().await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to compute stats");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        },
    }
}
