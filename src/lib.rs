//! Barrage and bulletin feeds for China News From Japan.
//!
//! Server side: each feed is a newest-first list of at most
//! [`state::MAX_RETAINED`] entries, stored as one JSON blob and mutated by
//! read-modify-write (`services::list_service`).
//!
//! Client side (`client`): a per-feed cooldown gate, the frequency
//! aggregation used by the barrage display, and an HTTP client that ties
//! them together.

pub mod app;
pub mod client;
pub mod config;
pub mod errors;
pub mod routes;
pub mod services;
pub mod state;
