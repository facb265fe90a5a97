use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::client::aggregate::{aggregate, AggregatedItem};
use crate::client::fallback::fallback_entries;
use crate::client::gate::{CooldownStorage, GateState, SubmissionGate};
use crate::errors::ClientError;
use crate::routes::feed_routes::SubmitResponse;
use crate::services::list_service::prepend_bounded;
use crate::state::feed::{Entry, Feed};

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client for one feed: holds the local view, the cooldown gate and an
/// HTTP client pointed at `{base_url}/api/{feed}`.
///
/// The local view is updated optimistically on submit and is what
/// [`FeedClient::summary`] aggregates; it can run ahead of the server.
pub struct FeedClient<S> {
    http: Client,
    url: String,
    feed: Feed,
    gate: SubmissionGate<S>,
    entries: Vec<Entry>,
}

impl<S: CooldownStorage> FeedClient<S> {
    pub fn new(base_url: &str, feed: Feed, storage: S) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(HTTP_TIMEOUT).build()?;

        Ok(Self {
            http,
            url: format!("{}/api/{}", base_url.trim_end_matches('/'), feed.name()),
            feed,
            gate: SubmissionGate::new(feed, storage),
            entries: Vec::new(),
        })
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn gate_state(&self) -> GateState {
        self.gate.state(Utc::now().timestamp_millis())
    }

    /// Reload the local view from the server.
    ///
    /// Never fails: an error status, an unreachable server, an unparsable
    /// body or an empty feed all fall back to the built-in list.
    pub async fn refresh(&mut self) -> &[Entry] {
        self.entries = match self.fetch().await {
            Ok(list) if !list.is_empty() => list,
            Ok(_) => {
                tracing::debug!(feed = %self.feed, "Feed is empty, showing defaults");
                fallback_entries(self.feed)
            }
            Err(e) => {
                tracing::warn!(feed = %self.feed, "Failed to load feed, showing defaults: {e}");
                fallback_entries(self.feed)
            }
        };

        &self.entries
    }

    async fn fetch(&self) -> Result<Vec<Entry>, reqwest::Error> {
        self.http
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<Entry>>()
            .await
    }

    pub async fn submit(&mut self, content: &str) -> Result<SubmitResponse, ClientError> {
        self.submit_at(content, Utc::now()).await
    }

    /// Submit `content` as of `now`.
    ///
    /// Rejected locally (no request) when empty or cooling down. Otherwise
    /// the cooldown starts and the entry is shown before the POST is
    /// sent; neither is undone if the server refuses it.
    pub async fn submit_at(
        &mut self,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<SubmitResponse, ClientError> {
        if content.is_empty() {
            return Err(ClientError::EmptyContent);
        }

        self.gate.try_acquire(now.timestamp_millis())?;

        let entry = Entry::new(content, now);
        self.entries = prepend_bounded(std::mem::take(&mut self.entries), entry.clone());

        let resp = self.http.post(&self.url).json(&entry).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = match resp.json::<ErrorBody>().await {
                Ok(body) => body.error,
                Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
            };
            tracing::warn!(feed = %self.feed, status = status.as_u16(), "Submission rejected: {message}");
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.json::<SubmitResponse>().await?)
    }

    /// Frequency ranking of the local view.
    pub fn summary(&self) -> Vec<AggregatedItem> {
        aggregate(&self.entries)
    }
}
