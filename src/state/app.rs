use std::sync::Arc;

use crate::services::list_service::ListStore;
use crate::state::blob::{BlobStore, SharedBlobStore};

/// Shared application state handed to the feed routes.
///
/// Holds no lists in memory: every request goes to the blob store.
#[derive(Clone)]
pub struct AppState {
    pub lists: ListStore,
}

impl AppState {
    pub fn new(blobs: SharedBlobStore) -> Self {
        Self {
            lists: ListStore::new(blobs),
        }
    }

    pub fn from_store<B: BlobStore + 'static>(blobs: B) -> Self {
        Self::new(Arc::new(blobs))
    }
}
