//! HTTP server configuration and request routing.
//!
//! Axum router with the middleware stack and graceful shutdown. Requests
//! flow through middleware in order:
//! 1. Request ID generation
//! 2. Request/response logging
//! 3. Metrics counting
//! 4. Timeout enforcement
//! 5. Handler execution
//!
//! # Graceful Shutdown
//!
//! The server handles SIGINT and SIGTERM: it stops accepting connections
//! and waits for in-flight requests before returning, after which the
//! caller closes the database pool.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use carrier_core::Storage;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;
use uuid::Uuid;

use crate::{config::Config, handlers, metrics};

/// Shared application state available to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Storage layer; the only mutable state requests share.
    pub storage: Storage,
    /// Process configuration, loaded once at startup.
    pub config: Arc<Config>,
}

/// Creates the Axum router with all routes and middleware.
pub fn create_router(storage: Storage, config: Arc<Config>) -> Router {
    let request_timeout = Duration::from_secs(config.request_timeout);
    let state = AppState { storage, config };

    Router::new()
        .route("/webhook", post(handlers::ingest_message))
        .route("/messages", get(handlers::list_messages))
        .route("/stats", get(handlers::stats_snapshot))
        .route("/health/live", get(handlers::liveness))
        .route("/health/ready", get(handlers::readiness))
        .route("/metrics", get(metrics::export_metrics))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(middleware::from_fn(track_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(inject_request_id))
        .with_state(state)
}

/// Middleware to inject a request ID into all responses.
///
/// Adds an `X-Request-Id` header for correlating log lines per request.
async fn inject_request_id(req: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();

    let mut req = req;
    req.extensions_mut().insert(request_id.clone());

    let mut response = next.run(req).await;

    if let Ok(header_value) = request_id.parse() {
        response.headers_mut().insert("X-Request-Id", header_value);
    }

    response
}

/// Middleware counting every request by method, path, and status.
async fn track_metrics(req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    metrics::HTTP_REQUESTS
        .with_label_values(&[method.as_str(), path.as_str(), response.status().as_str()])
        .inc();

    response
}

/// Starts the HTTP server with graceful shutdown support.
///
/// Binds to the specified address and serves requests until a shutdown
/// signal is received.
///
/// # Errors
///
/// Returns `std::io::Error` if the port is already in use or the network
/// interface is unavailable.
pub async fn start_server(
    storage: Storage,
    config: Arc<Config>,
    addr: SocketAddr,
) -> Result<(), std::io::Error> {
    let app = create_router(storage, config);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("HTTP server listening on {}", actual_addr);

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    info!("HTTP server stopped gracefully");
    Ok(())
}

/// Waits for shutdown signal (CTRL+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received CTRL+C, starting graceful shutdown");
        },
        () = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
