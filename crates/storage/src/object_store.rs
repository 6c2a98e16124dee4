//! Object storage backend (MinIO/S3 compatible).

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::{aws::AmazonS3Builder, path::Path, prefix::PrefixStore, ObjectStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use zarrs_object_store::AsyncObjectStore;
use zarrs_storage::storage_adapter::async_to_sync::{AsyncToSyncBlockOn, AsyncToSyncStorageAdapter};

use crate::backend::{
    is_safe_key, listing_dir, ArrayStore, StorageBackend, StorageError, StorageResult,
};

/// Configuration for object storage connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStorageConfig {
    /// S3/MinIO endpoint URL
    pub endpoint: String,
    /// Bucket name
    pub bucket: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// AWS region (use "us-east-1" for MinIO)
    pub region: String,
    /// Allow HTTP (for local MinIO)
    pub allow_http: bool,
}

impl Default for ObjectStorageConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://minio:9000".to_string(),
            bucket: "fish-flow-data-bucket".to_string(),
            access_key_id: "minioadmin".to_string(),
            secret_access_key: "minioadmin".to_string(),
            region: "us-east-1".to_string(),
            allow_http: true,
        }
    }
}

impl ObjectStorageConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            endpoint: std::env::var("S3_ENDPOINT").unwrap_or(defaults.endpoint),
            bucket: std::env::var("S3_BUCKET").unwrap_or(defaults.bucket),
            access_key_id: std::env::var("S3_ACCESS_KEY").unwrap_or(defaults.access_key_id),
            secret_access_key: std::env::var("S3_SECRET_KEY")
                .unwrap_or(defaults.secret_access_key),
            region: std::env::var("S3_REGION").unwrap_or(defaults.region),
            allow_http: std::env::var("S3_ALLOW_HTTP")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(defaults.allow_http),
        }
    }
}

/// Blocking executor that works from within a tokio runtime.
///
/// The zarrs read API is synchronous; object-store array stores drive their
/// async requests through this. Call it from a blocking-pool thread or a
/// multi-threaded runtime worker.
#[derive(Clone, Copy)]
pub struct TokioBlockOn;

impl AsyncToSyncBlockOn for TokioBlockOn {
    fn block_on<F: core::future::Future>(&self, future: F) -> F::Output {
        tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
    }
}

/// Object storage client for scenario data.
pub struct ObjectStorage {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl ObjectStorage {
    /// Create a new object storage client from config.
    pub fn new(config: &ObjectStorageConfig) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::new()
            .with_endpoint(&config.endpoint)
            .with_bucket_name(&config.bucket)
            .with_access_key_id(&config.access_key_id)
            .with_secret_access_key(&config.secret_access_key)
            .with_region(&config.region);

        if config.allow_http {
            builder = builder.with_allow_http(true);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::Config(format!("Failed to create S3 client: {}", e)))?;

        Ok(Self {
            store: Arc::new(store),
            bucket: config.bucket.clone(),
        })
    }

    /// Wrap an already-constructed store.
    pub fn from_store(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }

    fn location(key: &str) -> StorageResult<Path> {
        if !is_safe_key(key) {
            warn!(key = %key, "Rejecting malformed object key");
            return Err(StorageError::not_found(key));
        }
        Ok(Path::from(key))
    }
}

#[async_trait]
impl StorageBackend for ObjectStorage {
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn read_bytes(&self, key: &str) -> StorageResult<Bytes> {
        let location = Self::location(key)?;

        let result = match self.store.get(&location).await {
            Ok(result) => result,
            Err(object_store::Error::NotFound { .. }) => return Err(StorageError::not_found(key)),
            Err(e) => return Err(StorageError::unavailable(key, e)),
        };

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::unavailable(key, e))?;

        debug!(size = bytes.len(), "Read object");
        Ok(bytes)
    }

    async fn list_keys(&self, prefix: &str) -> BTreeSet<String> {
        let dir = listing_dir(prefix);
        let dir_path = Path::from(dir);
        let list_prefix = if dir.is_empty() { None } else { Some(&dir_path) };

        let mut keys = BTreeSet::new();
        let mut stream = self.store.list(list_prefix);
        loop {
            match stream.try_next().await {
                Ok(Some(meta)) => {
                    let key = meta.location.to_string();
                    if key.starts_with(prefix) {
                        keys.insert(key);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(bucket = %self.bucket, prefix = %prefix, error = %e, "List failed");
                    return BTreeSet::new();
                }
            }
        }

        keys
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn open_array_store(&self, key: &str) -> StorageResult<ArrayStore> {
        let root_metadata = Self::location(&format!("{}/zarr.json", key.trim_end_matches('/')))?;

        match self.store.head(&root_metadata).await {
            Ok(_) => {}
            Err(object_store::Error::NotFound { .. }) => return Err(StorageError::not_found(key)),
            Err(e) => return Err(StorageError::unavailable(key, e)),
        }

        let prefixed = PrefixStore::new(Arc::clone(&self.store), key.trim_end_matches('/'));
        let async_store = Arc::new(AsyncObjectStore::new(prefixed));
        let sync_store = AsyncToSyncStorageAdapter::new(async_store, TokioBlockOn);

        Ok(Arc::new(sync_store))
    }

    fn describe(&self) -> String {
        format!("s3://{}", self.bucket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;

    async fn memory_storage(objects: &[(&str, &str)]) -> ObjectStorage {
        let store = Arc::new(InMemory::new());
        for (key, body) in objects {
            store
                .put(&Path::from(*key), Bytes::from(body.to_string()).into())
                .await
                .unwrap();
        }
        ObjectStorage::from_store(store, "test-bucket")
    }

    #[test]
    fn test_default_config() {
        let config = ObjectStorageConfig::default();
        assert_eq!(config.endpoint, "http://minio:9000");
        assert_eq!(config.region, "us-east-1");
        assert!(config.allow_http);
    }

    #[tokio::test]
    async fn test_read_and_not_found() {
        let storage = memory_storage(&[("movement/demo/metadata.json", "{}")]).await;

        let bytes = storage.read_bytes("movement/demo/metadata.json").await.unwrap();
        assert_eq!(&bytes[..], b"{}");

        let err = storage.read_bytes("movement/demo/habitat.json").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_list_matches_key_prefix_semantics() {
        let storage = memory_storage(&[
            ("movement/a/metadata.json", "{}"),
            ("movement/abc/metadata.json", "{}"),
            ("depth/c/metadata.json", "{}"),
        ])
        .await;

        let keys = storage.list_keys("movement/").await;
        assert_eq!(keys.len(), 2);
        assert!(!keys.contains("depth/c/metadata.json"));

        let keys = storage.list_keys("movement/ab").await;
        assert_eq!(keys.into_iter().collect::<Vec<_>>(), vec!["movement/abc/metadata.json"]);

        assert!(storage.list_keys("habitat/").await.is_empty());
    }

    #[tokio::test]
    async fn test_open_missing_array_store() {
        let storage = memory_storage(&[]).await;
        let err = storage
            .open_array_store("movement/demo/matrices.zarr")
            .await
            .err()
            .unwrap();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_describe() {
        let storage = ObjectStorage::from_store(Arc::new(InMemory::new()), "fish");
        assert_eq!(storage.describe(), "s3://fish");
    }
}
