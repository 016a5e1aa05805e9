//! Repository for message persistence, queries, and aggregates.
//!
//! Inserts are idempotent: `message_id` is the table's primary key, and the
//! engine's unique-constraint rejection is translated into a
//! [`InsertOutcome::Duplicate`] result instead of an error. There is no
//! read-before-write; two concurrent inserts of the same id resolve to
//! exactly one `Created` inside the engine's own transaction.

use std::sync::Arc;

use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::{
    error::{CoreError, Result},
    models::{Message, NewMessage},
    time::Clock,
};

/// Page size used when the caller supplies none, or an out-of-range value.
pub const DEFAULT_PAGE_LIMIT: i64 = 50;

/// Largest accepted page size.
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Result of an idempotent insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The message was stored for the first time.
    Created,
    /// A message with the same `message_id` already exists; nothing changed.
    Duplicate,
}

impl InsertOutcome {
    /// Stable lowercase name, used for logging and metrics labels.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Duplicate => "duplicate",
        }
    }
}

/// Conjunctive listing filters; `None` fields do not constrain the result.
#[derive(Debug, Clone, Default)]
pub struct MessageFilter {
    /// Exact-match filter on the sender.
    pub sender: Option<String>,
    /// Inclusive lower bound on `ts`, compared as strings.
    pub since: Option<String>,
    /// Case-insensitive substring match against `text`. Messages without
    /// text never match a non-empty needle.
    pub search: Option<String>,
}

/// Normalized pagination window.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    /// Page size, within `[1, MAX_PAGE_LIMIT]`.
    pub limit: i64,
    /// Non-negative skip count.
    pub offset: i64,
}

impl Page {
    /// Normalizes caller-supplied pagination values.
    ///
    /// A missing or out-of-range limit silently becomes
    /// [`DEFAULT_PAGE_LIMIT`]; a missing or negative offset becomes zero.
    /// Invalid paging input degrades, it never errors.
    pub fn clamp(limit: Option<i64>, offset: Option<i64>) -> Self {
        let limit = match limit {
            Some(value) if (1..=MAX_PAGE_LIMIT).contains(&value) => value,
            _ => DEFAULT_PAGE_LIMIT,
        };
        let offset = offset.unwrap_or(0).max(0);

        Self { limit, offset }
    }
}

/// Per-sender message count in the stats ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct SenderCount {
    /// The sender.
    #[serde(rename = "from")]
    pub sender: String,
    /// Number of stored messages from that sender.
    pub count: i64,
}

/// Aggregate view over the whole store. No filters apply.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    /// Total number of stored messages.
    pub total_messages: i64,
    /// Number of distinct senders.
    pub senders_count: i64,
    /// Top senders by message count, at most ten entries, count descending.
    pub messages_per_sender: Vec<SenderCount>,
    /// Smallest `ts` across all messages; null when the store is empty.
    pub first_message_ts: Option<String>,
    /// Largest `ts` across all messages; null when the store is empty.
    pub last_message_ts: Option<String>,
}

/// Repository for message database operations.
pub struct Repository {
    pool: Arc<SqlitePool>,
    clock: Arc<dyn Clock>,
}

impl Repository {
    /// Creates a new repository over the shared pool and clock.
    pub fn new(pool: Arc<SqlitePool>, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    /// Returns a reference to the database pool.
    pub fn pool(&self) -> Arc<SqlitePool> {
        self.pool.clone()
    }

    /// Inserts a message, stamping `created_at` from the clock.
    ///
    /// The write and the uniqueness check are a single statement; when the
    /// primary key rejects the row, existing data is untouched and the call
    /// reports [`InsertOutcome::Duplicate`].
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Database` for any failure other than the
    /// uniqueness violation.
    pub async fn insert(&self, message: &NewMessage) -> Result<InsertOutcome> {
        let created_at = self.clock.now_utc().format("%Y-%m-%dT%H:%M:%SZ").to_string();

        let inserted = sqlx::query(
            r#"
            INSERT INTO messages (message_id, sender, recipient, ts, text, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&message.message_id)
        .bind(&message.sender)
        .bind(&message.recipient)
        .bind(&message.ts)
        .bind(message.text.as_deref())
        .bind(&created_at)
        .execute(&*self.pool)
        .await
        .map_err(CoreError::from);

        match inserted {
            Ok(_) => Ok(InsertOutcome::Created),
            Err(CoreError::ConstraintViolation(_)) => Ok(InsertOutcome::Duplicate),
            Err(err) => Err(err),
        }
    }

    /// Returns one page of matching messages plus the filter-wide total.
    ///
    /// Ordering is `ts` ascending with `message_id` ascending as the
    /// tie-break, so repeated identical queries page through an identical
    /// sequence regardless of insertion order.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Database` if either query fails.
    pub async fn list(&self, filter: &MessageFilter, page: &Page) -> Result<(Vec<Message>, i64)> {
        let mut count_query = QueryBuilder::new("SELECT COUNT(*) FROM messages");
        push_filters(&mut count_query, filter);
        let total: i64 = count_query.build_query_scalar().fetch_one(&*self.pool).await?;

        let mut page_query = QueryBuilder::new(
            "SELECT message_id, sender, recipient, ts, text, created_at FROM messages",
        );
        push_filters(&mut page_query, filter);
        page_query
            .push(" ORDER BY ts ASC, message_id ASC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset);

        let messages = page_query.build_query_as::<Message>().fetch_all(&*self.pool).await?;

        Ok((messages, total))
    }

    /// Computes the aggregate snapshot over the current committed state.
    ///
    /// Ties in the top-ten ranking are broken by first-seen sender: the
    /// append-only rowid of a sender's earliest message.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Database` if any aggregate query fails.
    pub async fn stats(&self) -> Result<StatsSnapshot> {
        let (total_messages, senders_count): (i64, i64) =
            sqlx::query_as("SELECT COUNT(*), COUNT(DISTINCT sender) FROM messages")
                .fetch_one(&*self.pool)
                .await?;

        let messages_per_sender: Vec<SenderCount> = sqlx::query_as(
            r#"
            SELECT sender, COUNT(*) AS count
            FROM messages
            GROUP BY sender
            ORDER BY count DESC, MIN(rowid) ASC
            LIMIT 10
            "#,
        )
        .fetch_all(&*self.pool)
        .await?;

        let (first_message_ts, last_message_ts): (Option<String>, Option<String>) =
            sqlx::query_as("SELECT MIN(ts), MAX(ts) FROM messages").fetch_one(&*self.pool).await?;

        Ok(StatsSnapshot {
            total_messages,
            senders_count,
            messages_per_sender,
            first_message_ts,
            last_message_ts,
        })
    }
}

/// Appends the filter conditions to a query under construction.
fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filter: &MessageFilter) {
    let mut separator = " WHERE ";

    if let Some(sender) = &filter.sender {
        builder.push(separator).push("sender = ").push_bind(sender.clone());
        separator = " AND ";
    }

    if let Some(since) = &filter.since {
        builder.push(separator).push("ts >= ").push_bind(since.clone());
        separator = " AND ";
    }

    if let Some(needle) = &filter.search {
        builder
            .push(separator)
            .push("lower(coalesce(text, '')) LIKE ")
            .push_bind(like_pattern(needle))
            .push(" ESCAPE '\\'");
    }
}

/// Builds a `%needle%` pattern with LIKE metacharacters escaped, so the
/// search is a literal substring match.
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");

    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_accepts_in_range_values() {
        let page = Page::clamp(Some(2), Some(7));
        assert_eq!(page.limit, 2);
        assert_eq!(page.offset, 7);
    }

    #[test]
    fn clamp_substitutes_default_for_out_of_range_limits() {
        for limit in [None, Some(0), Some(-5), Some(101), Some(150)] {
            assert_eq!(Page::clamp(limit, None).limit, DEFAULT_PAGE_LIMIT, "limit {limit:?}");
        }
        assert_eq!(Page::clamp(Some(100), None).limit, 100);
        assert_eq!(Page::clamp(Some(1), None).limit, 1);
    }

    #[test]
    fn clamp_floors_offset_at_zero() {
        assert_eq!(Page::clamp(None, Some(-3)).offset, 0);
        assert_eq!(Page::clamp(None, None).offset, 0);
    }

    #[test]
    fn like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("Hello"), "%hello%");
        assert_eq!(like_pattern("50%"), "%50\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern("back\\slash"), "%back\\\\slash%");
    }

    #[test]
    fn insert_outcome_labels() {
        assert_eq!(InsertOutcome::Created.as_str(), "created");
        assert_eq!(InsertOutcome::Duplicate.as_str(), "duplicate");
    }
}
