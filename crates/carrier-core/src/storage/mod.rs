//! Storage layer for message persistence.
//!
//! All database access goes through the repository in this module; SQL
//! outside `storage` is forbidden so the schema can evolve in one place.
//! The pool is created once at process start, handed to [`Storage::new`],
//! and released when the process shuts down.

use std::sync::Arc;

use sqlx::SqlitePool;

pub mod messages;

use crate::{error::Result, time::Clock};

/// Entry point for all database operations.
#[derive(Clone)]
pub struct Storage {
    /// Repository for message persistence and queries.
    pub messages: Arc<messages::Repository>,
}

impl Storage {
    /// Creates a storage instance over the given pool and clock.
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        let pool = Arc::new(pool);
        Self { messages: Arc::new(messages::Repository::new(pool, clock)) }
    }

    /// Performs a lightweight connectivity check.
    ///
    /// Used by the readiness probe; executes a trivial query and nothing
    /// else.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Database` if the connection is unhealthy.
    pub async fn health_check(&self) -> Result<()> {
        let _: (i32,) = sqlx::query_as("SELECT 1").fetch_one(&*self.messages.pool()).await?;

        Ok(())
    }
}

/// Creates the message schema if it does not exist.
///
/// Runs at process start and from test setup. `message_id` is the primary
/// key; its uniqueness constraint is what makes ingestion idempotent.
///
/// # Errors
///
/// Returns `CoreError::Database` if a DDL statement fails.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS messages (
            message_id TEXT PRIMARY KEY,
            sender TEXT NOT NULL,
            recipient TEXT NOT NULL,
            ts TEXT NOT NULL,
            text TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_messages_ts ON messages(ts, message_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_messages_sender ON messages(sender)")
        .execute(pool)
        .await?;

    Ok(())
}
