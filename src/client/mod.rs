//! Client side of the feeds: what a browser tab does around the HTTP calls.

pub mod aggregate;
pub mod fallback;
pub mod feed_client;
pub mod gate;

pub use aggregate::{aggregate, AggregatedItem, PALETTE};
pub use fallback::fallback_entries;
pub use feed_client::FeedClient;
pub use gate::{
    countdown, CooldownStorage, FileCooldownStorage, GateState, MemoryCooldownStorage,
    SubmissionGate, COOLDOWN_MS,
};
