use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::ApiError;
use crate::state::feed::{format_timestamp, new_entry_id, Entry, Feed};
use crate::state::AppState;

/// Body of `POST /api/{feed}`. Only `content` is required.
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub id: Option<String>,
    pub content: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub count: usize,
}

/// Build all feed routes under /api
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/:feed", get(list_entries).post(submit_entry))
        .with_state(state)
}

fn parse_feed(name: &str) -> Result<Feed, ApiError> {
    name.parse::<Feed>().map_err(|_| ApiError::UnknownFeed)
}

//
// ─────────────────────────────────────────────────────────────
// GET /api/{feed}
// Full list, newest first. Store faults degrade to []
// ─────────────────────────────────────────────────────────────
//
async fn list_entries(
    Path(feed): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Entry>>, ApiError>
{
    let feed = parse_feed(&feed)?;
    Ok(Json(state.lists.read_list_or_empty(feed).await))
}

//
// ─────────────────────────────────────────────────────────────
// POST /api/{feed}
// Prepend one entry, truncate to 100, return the new length
// ─────────────────────────────────────────────────────────────
//
async fn submit_entry(
    Path(feed): Path<String>,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SubmitResponse>, ApiError>
{
    let feed = parse_feed(&feed)?;

    // Parsed by hand: browsers post string bodies as text/plain.
    let req = serde_json::from_slice::<SubmitRequest>(&body).map_err(|e| {
        tracing::debug!(feed = %feed, "Rejected body: {e}");
        ApiError::InvalidPayload
    })?;

    let content = match req.content {
        Some(c) if !c.is_empty() => c,
        _ => return Err(ApiError::ContentRequired),
    };

    let now = Utc::now();
    let entry = Entry {
        id: req.id.unwrap_or_else(|| new_entry_id(now)),
        content,
        created_at: req.created_at.unwrap_or_else(|| format_timestamp(now)),
    };

    let count = state.lists.append_entry(feed, entry).await?;

    Ok(Json(SubmitResponse {
        success: true,
        count,
    }))
}
