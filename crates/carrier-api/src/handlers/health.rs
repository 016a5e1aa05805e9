//! Liveness and readiness probes.
//!
//! Liveness only confirms the process answers HTTP. Readiness additionally
//! requires a configured webhook secret and a responsive database, the two
//! preconditions for accepting traffic.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error, instrument};

use crate::server::AppState;

/// Probe response body.
#[derive(Debug, Serialize)]
pub struct ProbeStatus {
    /// `"ok"` or `"not ready"`.
    pub status: &'static str,
}

/// Handler for `GET /health/live`.
#[instrument(name = "liveness", skip_all)]
pub async fn liveness() -> Response {
    (StatusCode::OK, Json(ProbeStatus { status: "ok" })).into_response()
}

/// Handler for `GET /health/ready`.
#[instrument(name = "readiness", skip_all)]
pub async fn readiness(State(state): State<AppState>) -> Response {
    if !state.config.ready() {
        debug!("Readiness failed: webhook secret not configured");
        return not_ready();
    }

    match state.storage.health_check().await {
        Ok(()) => (StatusCode::OK, Json(ProbeStatus { status: "ok" })).into_response(),
        Err(e) => {
            error!(error = %e, "Readiness failed: database unreachable");
            not_ready()
        },
    }
}

fn not_ready() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, Json(ProbeStatus { status: "not ready" })).into_response()
}
