use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::ClientError;
use crate::state::feed::Feed;

/// Minimum spacing between accepted submissions from one client.
pub const COOLDOWN_MS: i64 = 60_000;

/// Where the last-submission timestamp (epoch millis) lives per feed.
pub trait CooldownStorage: Send {
    fn load(&self, feed: Feed) -> Option<i64>;

    fn save(&mut self, feed: Feed, at_ms: i64) -> io::Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryCooldownStorage {
    stamps: HashMap<Feed, i64>,
}

impl CooldownStorage for MemoryCooldownStorage {
    fn load(&self, feed: Feed) -> Option<i64> {
        self.stamps.get(&feed).copied()
    }

    fn save(&mut self, feed: Feed, at_ms: i64) -> io::Result<()> {
        self.stamps.insert(feed, at_ms);
        Ok(())
    }
}

/// JSON file `{"barrage": <millis>, "bulletin": <millis>}` that survives restarts.
///
/// An unreadable or malformed file counts as "never submitted".
#[derive(Debug, Clone)]
pub struct FileCooldownStorage {
    path: PathBuf,
}

impl FileCooldownStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> HashMap<String, i64> {
        match fs::read_to_string(&self.path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                tracing::warn!(path = %self.path.display(), "Ignoring malformed cooldown file: {e}");
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        }
    }
}

impl CooldownStorage for FileCooldownStorage {
    fn load(&self, feed: Feed) -> Option<i64> {
        self.read_all().get(feed.name()).copied()
    }

    fn save(&mut self, feed: Feed, at_ms: i64) -> io::Result<()> {
        let mut stamps = self.read_all();
        stamps.insert(feed.name().to_string(), at_ms);

        let json = serde_json::to_string_pretty(&stamps)?;
        fs::write(&self.path, json)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Ready,
    /// Whole seconds left, rounded up.
    Cooling(u64),
}

impl GateState {
    /// Reconstruct the state from the last recorded submission.
    pub fn at(last_submission_ms: Option<i64>, now_ms: i64, cooldown_ms: i64) -> Self {
        let Some(last) = last_submission_ms else {
            return GateState::Ready;
        };

        let elapsed = now_ms.saturating_sub(last).max(0);
        if elapsed >= cooldown_ms {
            return GateState::Ready;
        }

        let remaining_ms = (cooldown_ms - elapsed) as u64;
        GateState::Cooling(remaining_ms.div_ceil(1000))
    }

    /// One second passes. `Cooling(1)` steps straight to `Ready`, so a
    /// countdown never shows `Cooling(0)`.
    pub fn tick(self) -> Self {
        match self {
            GateState::Cooling(n) if n > 1 => GateState::Cooling(n - 1),
            _ => GateState::Ready,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, GateState::Ready)
    }
}

/// Drive `state` down to `Ready`, one `tick` per second, reporting each step.
pub async fn countdown<F>(mut state: GateState, mut on_tick: F)
where
    F: FnMut(GateState),
{
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    // First tick completes immediately.
    interval.tick().await;

    while !state.is_ready() {
        interval.tick().await;
        state = state.tick();
        on_tick(state);
    }
}

/// Client-side throttle: one accepted submission per feed per cooldown window.
///
/// Advisory only. The server does not enforce it, so any second client
/// (or a cleared storage) bypasses it.
pub struct SubmissionGate<S> {
    feed: Feed,
    storage: S,
    cooldown_ms: i64,
}

impl<S: CooldownStorage> SubmissionGate<S> {
    pub fn new(feed: Feed, storage: S) -> Self {
        Self {
            feed,
            storage,
            cooldown_ms: COOLDOWN_MS,
        }
    }

    pub fn state(&self, now_ms: i64) -> GateState {
        GateState::at(self.storage.load(self.feed), now_ms, self.cooldown_ms)
    }

    /// Record a submission attempt at `now_ms`, or report the seconds left.
    ///
    /// The window starts on the attempt, before the server has answered.
    pub fn try_acquire(&mut self, now_ms: i64) -> Result<(), ClientError> {
        if let GateState::Cooling(remaining_secs) = self.state(now_ms) {
            return Err(ClientError::Cooling { remaining_secs });
        }

        self.storage.save(self.feed, now_ms)?;
        Ok(())
    }
}
