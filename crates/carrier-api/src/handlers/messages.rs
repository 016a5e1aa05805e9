//! Filtered, paginated message listing.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use carrier_core::{Message, MessageFilter, Page};
use serde::{Deserialize, Serialize};
use tracing::{error, instrument};

use super::error_response;
use crate::server::AppState;

/// Query parameters accepted by `GET /messages`.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Page size; out-of-range values silently become the default.
    pub limit: Option<i64>,
    /// Skip count; negative values are treated as zero.
    pub offset: Option<i64>,
    /// Exact-match sender filter.
    pub from: Option<String>,
    /// Inclusive lower bound on `ts`.
    pub since: Option<String>,
    /// Case-insensitive substring match against the text.
    pub q: Option<String>,
}

/// One page of messages plus the filter-wide total.
#[derive(Debug, Serialize)]
pub struct MessageList {
    /// The page contents, ordered by `ts` then `message_id`.
    pub data: Vec<Message>,
    /// Count of all messages matching the filters, independent of paging.
    pub total: i64,
    /// Effective page size after clamping.
    pub limit: i64,
    /// Effective offset after clamping.
    pub offset: i64,
}

/// Lists messages matching the given filters.
#[instrument(name = "list_messages", skip(state))]
pub async fn list_messages(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Response {
    let page = Page::clamp(params.limit, params.offset);
    let filter = MessageFilter { sender: params.from, since: params.since, search: params.q };

    match state.storage.messages.list(&filter, &page).await {
        Ok((data, total)) => {
            Json(MessageList { data, total, limit: page.limit, offset: page.offset })
                .into_response()
        },
        Err(e) => {
            error!(error = %e, "Failed to list messages");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        },
    }
}
