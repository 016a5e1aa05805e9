//! Prometheus metrics for the carrier service.
//!
//! Two counter families: one for every HTTP request, incremented by the
//! router middleware, and one for webhook ingestion outcomes. Exported in
//! the Prometheus text format at `GET /metrics`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use once_cell::sync::Lazy;
use prometheus::{opts, register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};
use tracing::error;

/// Total HTTP requests, labeled by method, path, and response status.
pub static HTTP_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!("carrier_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"]
    )
    .expect("Failed to register HTTP_REQUESTS metric")
});

/// Webhook ingestion outcomes: created, duplicate, invalid_signature,
/// validation_error, not_configured.
pub static WEBHOOK_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!("carrier_webhook_requests_total", "Total webhook requests by result"),
        &["result"]
    )
    .expect("Failed to register WEBHOOK_REQUESTS metric")
});

/// Encodes all registered metrics in the Prometheus text format.
///
/// # Errors
///
/// Returns an error when encoding fails or the buffer is not valid UTF-8.
pub fn gather_metrics() -> anyhow::Result<String> {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    encoder.encode(&prometheus::gather(), &mut buffer)?;

    Ok(String::from_utf8(buffer)?)
}

/// Handler for `GET /metrics`.
pub async fn export_metrics() -> Response {
    match gather_metrics() {
        Ok(body) => (StatusCode::OK, body).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        },
    }
}
