//! HTTP request handlers for the carrier API.
//!
//! Handlers translate component outcomes into status codes and leave the
//! semantics to `carrier-core`: signature verification precedes parsing,
//! validation failures collapse to 422, and a duplicate delivery returns
//! the same success shape as a first-time ingestion.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

pub mod health;
pub mod messages;
pub mod stats;
pub mod webhook;

pub use health::{liveness, readiness};
pub use messages::list_messages;
pub use stats::stats_snapshot;
pub use webhook::ingest_message;

/// Minimal error payload.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable error description.
    pub error: &'static str,
}

/// Creates a standardized error response.
fn error_response(status: StatusCode, message: &'static str) -> Response {
    (status, Json(ErrorBody { error: message })).into_response()
}
