use bytes::Bytes;

use crate::errors::{AppendError, StoreError};
use crate::state::blob::SharedBlobStore;
use crate::state::feed::{Entry, Feed, MAX_RETAINED};

const CONTENT_TYPE: &str = "application/json";

/// Bounded, newest-first list per feed, persisted as one JSON blob.
///
/// Every mutation is a read-modify-write against the blob with no
/// conditional put, so two concurrent appends can lose one entry.
#[derive(Clone)]
pub struct ListStore {
    blobs: SharedBlobStore,
}

impl ListStore {
    pub fn new(blobs: SharedBlobStore) -> Self {
        Self { blobs }
    }

    pub fn storage_enabled(&self) -> bool {
        self.blobs.is_enabled()
    }

    /// Current list for `feed`.
    ///
    /// Absent key, disabled store and malformed blob all read as empty.
    /// Transport faults and timeouts are returned to the caller.
    pub async fn read_list(&self, feed: Feed) -> Result<Vec<Entry>, StoreError> {
        let data = match self.blobs.fetch_blob(feed.blob_key()).await {
            Ok(data) => data,
            Err(e) if e.is_empty_state() => {
                tracing::debug!(feed = %feed, "No blob yet ({e}), reading as empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        match serde_json::from_slice::<Vec<Entry>>(&data) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                tracing::warn!(feed = %feed, "Malformed feed blob, reading as empty: {e}");
                Ok(Vec::new())
            }
        }
    }

    /// Read path for `GET /api/{feed}`: every failure degrades to an empty list.
    pub async fn read_list_or_empty(&self, feed: Feed) -> Vec<Entry> {
        self.read_list(feed).await.unwrap_or_else(|e| {
            tracing::warn!(feed = %feed, "Failed to read feed, serving empty list: {e}");
            Vec::new()
        })
    }

    /// Overwrite the blob for `feed` with `entries`.
    pub async fn write_list(&self, feed: Feed, entries: &[Entry]) -> Result<(), StoreError> {
        let body = serde_json::to_vec(entries)?;
        self.blobs
            .write_blob(feed.blob_key(), Bytes::from(body), CONTENT_TYPE)
            .await
    }

    /// Prepend `entry`, keep the newest `MAX_RETAINED`, write back.
    /// Returns the stored length.
    pub async fn append_entry(&self, feed: Feed, entry: Entry) -> Result<usize, AppendError> {
        if entry.content.is_empty() {
            return Err(AppendError::ContentRequired);
        }

        let current = self.read_list(feed).await.map_err(|e| {
            tracing::error!(feed = %feed, "Pre-write read failed, aborting append: {e}");
            e
        })?;

        let limited = prepend_bounded(current, entry);

        self.write_list(feed, &limited).await.map_err(|e| {
            tracing::error!(feed = %feed, "Failed to write feed: {e}");
            e
        })?;

        tracing::info!(feed = %feed, count = limited.len(), "Entry appended");
        Ok(limited.len())
    }
}

/// `[entry, ...current]` truncated to `MAX_RETAINED`, dropping the oldest.
pub fn prepend_bounded(current: Vec<Entry>, entry: Entry) -> Vec<Entry> {
    let mut updated = Vec::with_capacity((current.len() + 1).min(MAX_RETAINED));
    updated.push(entry);
    updated.extend(current.into_iter().take(MAX_RETAINED - 1));
    updated
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use object_store::memory::InMemory;
    use tokio::sync::Barrier;

    use super::*;
    use crate::state::blob::{BlobStore, ObjectBlobStore};

    fn entry(n: usize) -> Entry {
        Entry {
            id: format!("id-{n}"),
            content: format!("message {n}"),
            created_at: "2024-05-01T12:00:00.000Z".to_string(),
        }
    }

    fn memory_store() -> ListStore {
        ListStore::new(Arc::new(ObjectBlobStore::new(Arc::new(InMemory::new()))))
    }

    /// Refuses every call like an unreachable endpoint.
    struct Unreachable;

    #[async_trait]
    impl BlobStore for Unreachable {
        async fn fetch_blob(&self, _key: &str) -> Result<Bytes, StoreError> {
            Err(StoreError::Transport("connection refused".into()))
        }

        async fn write_blob(
            &self,
            _key: &str,
            _data: Bytes,
            _content_type: &'static str,
        ) -> Result<(), StoreError> {
            Err(StoreError::Transport("connection refused".into()))
        }
    }

    /// Reads fail, writes succeed: a transient fault on the pre-write read.
    struct FlakyRead {
        inner: ObjectBlobStore,
    }

    #[async_trait]
    impl BlobStore for FlakyRead {
        async fn fetch_blob(&self, _key: &str) -> Result<Bytes, StoreError> {
            Err(StoreError::Transport("reset by peer".into()))
        }

        async fn write_blob(
            &self,
            key: &str,
            data: Bytes,
            content_type: &'static str,
        ) -> Result<(), StoreError> {
            self.inner.write_blob(key, data, content_type).await
        }
    }

    #[test]
    fn test_prepend_bounded_truncates_tail() {
        let current: Vec<Entry> = (0..MAX_RETAINED).map(entry).collect();
        let updated = prepend_bounded(current, entry(999));

        assert_eq!(updated.len(), MAX_RETAINED);
        assert_eq!(updated[0].id, "id-999");
        assert_eq!(updated[1].id, "id-0");
        assert_eq!(updated.last().unwrap().id, format!("id-{}", MAX_RETAINED - 2));
    }

    #[tokio::test]
    async fn test_absent_feed_reads_empty() {
        let lists = memory_store();
        assert!(lists.read_list(Feed::Barrage).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_puts_entry_first() {
        let lists = memory_store();

        assert_eq!(lists.append_entry(Feed::Bulletin, entry(1)).await.unwrap(), 1);
        assert_eq!(lists.append_entry(Feed::Bulletin, entry(2)).await.unwrap(), 2);

        let list = lists.read_list(Feed::Bulletin).await.unwrap();
        assert_eq!(list, vec![entry(2), entry(1)]);

        // Feeds are independent blobs.
        assert!(lists.read_list(Feed::Barrage).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_retains_newest_hundred() {
        let lists = memory_store();

        for n in 0..150 {
            let count = lists.append_entry(Feed::Barrage, entry(n)).await.unwrap();
            assert!(count <= MAX_RETAINED);
        }

        let list = lists.read_list(Feed::Barrage).await.unwrap();
        assert_eq!(list.len(), MAX_RETAINED);
        assert_eq!(list[0].id, "id-149");
        assert_eq!(list[MAX_RETAINED - 1].id, "id-50");
        assert!(list.iter().all(|e| e.id != "id-49"));

        let ids: Vec<&str> = list.iter().map(|e| e.id.as_str()).collect();
        let expected: Vec<String> = (50..150).rev().map(|n| format!("id-{n}")).collect();
        assert_eq!(ids, expected.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_empty_content_never_touches_store() {
        let lists = ListStore::new(Arc::new(Unreachable));

        let mut empty = entry(1);
        empty.content.clear();

        let err = lists.append_entry(Feed::Barrage, empty).await.unwrap_err();
        assert!(matches!(err, AppendError::ContentRequired));
    }

    #[tokio::test]
    async fn test_malformed_blob_reads_empty_and_is_replaced() {
        let blobs = Arc::new(ObjectBlobStore::new(Arc::new(InMemory::new())));
        blobs
            .write_blob("barrage.json", Bytes::from("{\"not\": \"a list\"}"), CONTENT_TYPE)
            .await
            .unwrap();

        let lists = ListStore::new(blobs);
        assert!(lists.read_list(Feed::Barrage).await.unwrap().is_empty());

        assert_eq!(lists.append_entry(Feed::Barrage, entry(1)).await.unwrap(), 1);
        assert_eq!(lists.read_list(Feed::Barrage).await.unwrap(), vec![entry(1)]);
    }

    #[tokio::test]
    async fn test_transport_fault_on_read() {
        let lists = ListStore::new(Arc::new(Unreachable));

        assert!(matches!(
            lists.read_list(Feed::Bulletin).await,
            Err(StoreError::Transport(_))
        ));
        assert!(lists.read_list_or_empty(Feed::Bulletin).await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_pre_read_aborts_write() {
        let inner = ObjectBlobStore::new(Arc::new(InMemory::new()));
        let lists = ListStore::new(Arc::new(FlakyRead { inner }));

        let err = lists.append_entry(Feed::Barrage, entry(1)).await.unwrap_err();
        assert!(matches!(err, AppendError::Store(StoreError::Transport(_))));
    }

    #[tokio::test]
    async fn test_disabled_store_reads_empty_rejects_writes() {
        let lists = ListStore::new(Arc::new(ObjectBlobStore::disabled()));

        assert!(!lists.storage_enabled());
        assert!(lists.read_list(Feed::Barrage).await.unwrap().is_empty());

        let err = lists.append_entry(Feed::Barrage, entry(1)).await.unwrap_err();
        assert!(matches!(err, AppendError::Store(StoreError::Disabled)));
    }

    /// Holds every read until two readers are waiting, so both see the
    /// same snapshot before either writes.
    struct Lockstep {
        inner: ObjectBlobStore,
        barrier: Barrier,
    }

    #[async_trait]
    impl BlobStore for Lockstep {
        async fn fetch_blob(&self, key: &str) -> Result<Bytes, StoreError> {
            self.barrier.wait().await;
            self.inner.fetch_blob(key).await
        }

        async fn write_blob(
            &self,
            key: &str,
            data: Bytes,
            content_type: &'static str,
        ) -> Result<(), StoreError> {
            self.inner.write_blob(key, data, content_type).await
        }
    }

    #[tokio::test]
    async fn test_concurrent_appends_lose_an_update() {
        let memory = Arc::new(InMemory::new());
        let direct = ListStore::new(Arc::new(ObjectBlobStore::new(memory.clone())));
        direct.append_entry(Feed::Bulletin, entry(0)).await.unwrap();

        let lists = ListStore::new(Arc::new(Lockstep {
            inner: ObjectBlobStore::new(memory),
            barrier: Barrier::new(2),
        }));

        let (a, b) = tokio::join!(
            lists.append_entry(Feed::Bulletin, entry(1)),
            lists.append_entry(Feed::Bulletin, entry(2)),
        );
        assert_eq!(a.unwrap(), 2);
        assert_eq!(b.unwrap(), 2);

        // Both writers prepended to [entry 0]; the later put wins.
        let list = direct.read_list(Feed::Bulletin).await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1], entry(0));

        let kept: Vec<&str> = list
            .iter()
            .map(|e| e.id.as_str())
            .filter(|id| *id == "id-1" || *id == "id-2")
            .collect();
        assert_eq!(kept.len(), 1);
    }
}
