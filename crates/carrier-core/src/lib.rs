//! Core domain types and storage for the carrier message service.
//!
//! Provides the message model with field validation, the clock abstraction
//! used to stamp ingestion times, and the SQLite-backed storage layer with
//! idempotent inserts, filtered listing, and aggregate statistics. The HTTP
//! boundary crate depends on these types; nothing here knows about HTTP.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod models;
pub mod storage;
pub mod time;

pub use error::{CoreError, Result};
pub use models::{IncomingMessage, Message, NewMessage, ValidationError};
pub use storage::messages::{InsertOutcome, MessageFilter, Page, SenderCount, StatsSnapshot};
pub use storage::Storage;
pub use time::{Clock, RealClock, TestClock};
