//! Webhook ingestion handler.
//!
//! Order matters here: the signature is verified over the exact raw bytes
//! received, before any JSON parsing, so authentication never depends on
//! payload content.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use carrier_core::IncomingMessage;
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use super::error_response;
use crate::{
    crypto::{authenticate, AuthOutcome},
    metrics::WEBHOOK_REQUESTS,
    server::AppState,
};

/// Response for an accepted webhook, identical for created and duplicate
/// deliveries.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    /// Always `"ok"`.
    pub status: &'static str,
}

/// Ingests one message delivered by webhook.
///
/// Returns 200 for both first-time and duplicate deliveries, 401 for a
/// missing or mismatched signature, 422 for malformed or invalid payloads,
/// and 503 when no secret is configured.
#[instrument(name = "ingest_message", skip(state, headers, body))]
pub async fn ingest_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers.get("x-signature").and_then(|value| value.to_str().ok());

    match authenticate(state.config.webhook_secret.as_deref(), signature, &body) {
        AuthOutcome::Authenticated => {},
        AuthOutcome::NotConfigured => {
            error!("Webhook secret is not configured");
            WEBHOOK_REQUESTS.with_label_values(&["not_configured"]).inc();
            return error_response(StatusCode::SERVICE_UNAVAILABLE, "service not ready");
        },
        AuthOutcome::MissingSignature | AuthOutcome::SignatureMismatch => {
            warn!("Rejected webhook with missing or mismatched signature");
            WEBHOOK_REQUESTS.with_label_values(&["invalid_signature"]).inc();
            return error_response(StatusCode::UNAUTHORIZED, "invalid signature");
        },
    }

    let incoming: IncomingMessage = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            debug!(error = %e, "Malformed webhook payload");
            WEBHOOK_REQUESTS.with_label_values(&["validation_error"]).inc();
            return error_response(StatusCode::UNPROCESSABLE_ENTITY, "validation error");
        },
    };

    let message = match incoming.validate() {
        Ok(valid) => valid,
        Err(e) => {
            debug!(error = %e, "Webhook payload failed validation");
            WEBHOOK_REQUESTS.with_label_values(&["validation_error"]).inc();
            return error_response(StatusCode::UNPROCESSABLE_ENTITY, "validation error");
        },
    };

    match state.storage.messages.insert(&message).await {
        Ok(outcome) => {
            WEBHOOK_REQUESTS.with_label_values(&[outcome.as_str()]).inc();
            info!(
                message_id = %message.message_id,
                result = outcome.as_str(),
                "Webhook processed"
            );
            (StatusCode::OK, Json(WebhookAck { status: "ok" })).into_response()
        },
        Err(e) => {
            error!(error = %e, "Failed to persist message");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        },
    }
}
