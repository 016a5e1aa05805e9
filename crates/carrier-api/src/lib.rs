//! Carrier HTTP API.
//!
//! The boundary layer of the carrier service: configuration, webhook
//! signature authentication, request handlers, metrics, and the server
//! itself.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod crypto;
pub mod handlers;
pub mod metrics;
pub mod server;

pub use config::Config;
pub use server::{create_router, start_server, AppState};
