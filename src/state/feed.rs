use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};

/// Maximum number of entries kept in a feed blob.
pub const MAX_RETAINED: usize = 100;

/// A single submitted item.
///
/// Stored exactly as `{id, content, created_at}`; `created_at` is an
/// ISO-8601 string and is trusted as sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub content: String,
    pub created_at: String,
}

impl Entry {
    /// Build an entry stamped with `now`, using a fresh id.
    pub fn new(content: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: new_entry_id(now),
            content: content.into(),
            created_at: format_timestamp(now),
        }
    }
}

/// The logical feeds served under `/api/{feed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feed {
    Barrage,
    Bulletin,
}

impl Feed {
    pub const ALL: [Feed; 2] = [Feed::Barrage, Feed::Bulletin];

    /// Path segment used in the URL.
    pub fn name(&self) -> &'static str {
        match self {
            Feed::Barrage => "barrage",
            Feed::Bulletin => "bulletin",
        }
    }

    /// Object key of the backing blob.
    pub fn blob_key(&self) -> &'static str {
        match self {
            Feed::Barrage => "barrage.json",
            Feed::Bulletin => "bulletins.json",
        }
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct UnknownFeed(pub String);

impl FromStr for Feed {
    type Err = UnknownFeed;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Feed::ALL
            .into_iter()
            .find(|feed| feed.name() == s)
            .ok_or_else(|| UnknownFeed(s.to_string()))
    }
}

/// `{epoch_millis}-{9 random lowercase alphanumerics}`.
pub fn new_entry_id(now: DateTime<Utc>) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();

    format!("{}-{}", now.timestamp_millis(), suffix)
}

/// RFC 3339 with millisecond precision and a `Z` suffix.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
