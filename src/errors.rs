use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failures of the blob layer and the list store built on it.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Blob not found")]
    NotFound,

    #[error("Blob store is disabled (no bucket or credentials configured)")]
    Disabled,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Blob store call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Failed to serialize list: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    /// Absent key or disabled store: a legitimate empty list, not a fault.
    pub fn is_empty_state(&self) -> bool {
        matches!(self, StoreError::NotFound | StoreError::Disabled)
    }
}

/// Failures of `ListStore::append_entry`.
#[derive(Error, Debug)]
pub enum AppendError {
    #[error("Content is required")]
    ContentRequired,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AppendError> for ApiError {
    fn from(err: AppendError) -> Self {
        match err {
            AppendError::ContentRequired => ApiError::ContentRequired,
            AppendError::Store(_) => ApiError::Internal,
        }
    }
}

/// Errors surfaced at the HTTP boundary. The body is always `{"error": ...}`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Content is required")]
    ContentRequired,

    #[error("Invalid JSON body")]
    InvalidPayload,

    #[error("Unknown feed")]
    UnknownFeed,

    #[error("Internal Server Error")]
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::ContentRequired | ApiError::InvalidPayload => StatusCode::BAD_REQUEST,
            ApiError::UnknownFeed => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Client-side submission failures.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Content is required")]
    EmptyContent,

    #[error("Please wait {remaining_secs}s before posting again")]
    Cooling { remaining_secs: u64 },

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server rejected submission ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Cooldown storage error: {0}")]
    Storage(#[from] std::io::Error),
}
