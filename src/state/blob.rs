use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::{Attribute, Attributes, ObjectStore, PutOptions, PutPayload, RetryConfig};

use crate::config::StorageConfig;
use crate::errors::StoreError;

/// Get/put access to opaque blobs by key.
///
/// No versioning and no conditional writes: the last writer wins.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Fetch the bytes stored under `key`. An absent key is `StoreError::NotFound`.
    async fn fetch_blob(&self, key: &str) -> Result<Bytes, StoreError>;

    /// Overwrite the blob under `key`.
    async fn write_blob(&self, key: &str, data: Bytes, content_type: &'static str)
        -> Result<(), StoreError>;

    /// Whether a backing store is configured at all.
    fn is_enabled(&self) -> bool {
        true
    }
}

pub type SharedBlobStore = Arc<dyn BlobStore>;

/// `BlobStore` backed by an `object_store` implementation (R2/S3 in
/// production, `InMemory` in tests).
///
/// Built without a store when credentials are missing: reads then behave
/// as an absent key and writes fail with `StoreError::Disabled`.
pub struct ObjectBlobStore {
    store: Option<Arc<dyn ObjectStore>>,
}

impl ObjectBlobStore {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store: Some(store) }
    }

    pub fn disabled() -> Self {
        Self { store: None }
    }

    /// Build an R2/S3 client from config, or a disabled store if the
    /// bucket or credentials are missing or the client cannot be built.
    pub fn from_config(cfg: &StorageConfig) -> Self {
        let (Some(bucket), Some(endpoint), Some(key_id), Some(secret)) = (
            cfg.bucket.as_deref(),
            cfg.resolved_endpoint(),
            cfg.access_key_id.as_deref(),
            cfg.secret_access_key.as_deref(),
        ) else {
            tracing::warn!("Object storage not configured; feeds will read empty and reject writes");
            return Self::disabled();
        };

        let retry = RetryConfig {
            max_retries: 0,
            ..Default::default()
        };

        let built = AmazonS3Builder::new()
            .with_bucket_name(bucket)
            .with_endpoint(&endpoint)
            .with_region(&cfg.region)
            .with_access_key_id(key_id)
            .with_secret_access_key(secret)
            .with_allow_http(endpoint.starts_with("http://"))
            .with_retry(retry)
            .build();

        match built {
            Ok(s3) => {
                tracing::info!(bucket = %bucket, endpoint = %endpoint, "Object storage enabled");
                Self::new(Arc::new(s3))
            }
            Err(e) => {
                tracing::warn!("Failed to build object storage client: {e}");
                Self::disabled()
            }
        }
    }
}

fn store_error(err: object_store::Error) -> StoreError {
    match err {
        object_store::Error::NotFound { .. } => StoreError::NotFound,
        e => StoreError::Transport(e.to_string()),
    }
}

#[async_trait]
impl BlobStore for ObjectBlobStore {
    async fn fetch_blob(&self, key: &str) -> Result<Bytes, StoreError> {
        let store = self.store.as_ref().ok_or(StoreError::Disabled)?;
        let path = ObjectPath::from(key);

        let result = store.get(&path).await.map_err(store_error)?;
        result.bytes().await.map_err(store_error)
    }

    async fn write_blob(
        &self,
        key: &str,
        data: Bytes,
        content_type: &'static str,
    ) -> Result<(), StoreError> {
        let store = self.store.as_ref().ok_or(StoreError::Disabled)?;
        let path = ObjectPath::from(key);

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.into());
        let opts = PutOptions {
            attributes,
            ..Default::default()
        };

        store
            .put_opts(&path, PutPayload::from(data), opts)
            .await
            .map(|_| ())
            .map_err(store_error)
    }

    fn is_enabled(&self) -> bool {
        self.store.is_some()
    }
}

/// Caps every get and put of `inner` at `timeout`. An elapsed call is
/// `StoreError::Timeout`, handled like any other transport fault.
pub struct Bounded<B> {
    inner: B,
    timeout: Duration,
}

impl<B: BlobStore> Bounded<B> {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(inner: B, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    async fn within<T, F>(&self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .unwrap_or(Err(StoreError::Timeout(self.timeout)))
    }
}

#[async_trait]
impl<B: BlobStore> BlobStore for Bounded<B> {
    async fn fetch_blob(&self, key: &str) -> Result<Bytes, StoreError> {
        self.within(self.inner.fetch_blob(key)).await
    }

    async fn write_blob(
        &self,
        key: &str,
        data: Bytes,
        content_type: &'static str,
    ) -> Result<(), StoreError> {
        self.within(self.inner.write_blob(key, data, content_type)).await
    }

    fn is_enabled(&self) -> bool {
        self.inner.is_enabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;

    #[tokio::test]
    async fn test_missing_key_is_not_found() {
        let blobs = ObjectBlobStore::new(Arc::new(InMemory::new()));
        let err = blobs.fetch_blob("barrage.json").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn test_write_then_fetch() {
        let inner = Arc::new(InMemory::new());
        let blobs = ObjectBlobStore::new(inner.clone());

        blobs
            .write_blob("bulletins.json", Bytes::from("[]"), "application/json")
            .await
            .expect("write failed");

        let data = blobs.fetch_blob("bulletins.json").await.expect("fetch failed");
        assert_eq!(data, Bytes::from("[]"));

        let raw = inner
            .get(&ObjectPath::from("bulletins.json"))
            .await
            .expect("inner get failed");
        let content_type: Option<&str> =
            raw.attributes.get(&Attribute::ContentType).map(|v| v.as_ref());
        assert_eq!(content_type, Some("application/json"));
    }

    #[tokio::test]
    async fn test_disabled_store() {
        let blobs = ObjectBlobStore::disabled();
        assert!(!blobs.is_enabled());

        let read = blobs.fetch_blob("barrage.json").await.unwrap_err();
        assert!(read.is_empty_state());

        let write = blobs
            .write_blob("barrage.json", Bytes::from("[]"), "application/json")
            .await
            .unwrap_err();
        assert!(matches!(write, StoreError::Disabled));
    }

    /// Never answers.
    struct Hang;

    #[async_trait]
    impl BlobStore for Hang {
        async fn fetch_blob(&self, _key: &str) -> Result<Bytes, StoreError> {
            std::future::pending().await
        }

        async fn write_blob(
            &self,
            _key: &str,
            _data: Bytes,
            _content_type: &'static str,
        ) -> Result<(), StoreError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_store_times_out() {
        let timeout = Bounded::<Hang>::DEFAULT_TIMEOUT;
        let blobs = Bounded::new(Hang, timeout);
        let start = tokio::time::Instant::now();

        let read = blobs.fetch_blob("barrage.json").await.unwrap_err();
        assert!(matches!(read, StoreError::Timeout(t) if t == timeout));
        assert!(!read.is_empty_state());
        assert_eq!(start.elapsed(), timeout);

        let write = blobs
            .write_blob("barrage.json", Bytes::from("[]"), "application/json")
            .await
            .unwrap_err();
        assert!(matches!(write, StoreError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_bounded_passes_results_through() {
        let blobs = Bounded::new(
            ObjectBlobStore::new(Arc::new(InMemory::new())),
            Duration::from_secs(10),
        );

        assert!(matches!(
            blobs.fetch_blob("barrage.json").await,
            Err(StoreError::NotFound)
        ));
        blobs
            .write_blob("barrage.json", Bytes::from("[]"), "application/json")
            .await
            .unwrap();
        assert_eq!(blobs.fetch_blob("barrage.json").await.unwrap(), Bytes::from("[]"));

        assert!(!Bounded::new(ObjectBlobStore::disabled(), Duration::from_secs(1)).is_enabled());
    }

    #[test]
    fn test_missing_credentials_disable_store() {
        let cfg = StorageConfig {
            bucket: Some("feeds".into()),
            account_id: Some("abc".into()),
            ..Default::default()
        };
        let blobs = ObjectBlobStore::from_config(&cfg);
        assert!(!blobs.is_enabled());
    }
}
