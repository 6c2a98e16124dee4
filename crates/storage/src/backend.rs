//! The storage backend contract.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use fishflow_common::DataError;

use crate::local::LocalStorage;
use crate::object_store::{ObjectStorage, ObjectStorageConfig};

/// A readable Zarr store rooted at one array-store key.
///
/// Dropping the handle releases it.
pub type ArrayStore = zarrs_storage::ReadableStorage;

/// Result type alias using StorageError.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors reported by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Key not found: {key}")]
    NotFound { key: String },

    #[error("Storage unavailable for {key}: {reason}")]
    Unavailable { key: String, reason: String },

    #[error("Invalid storage configuration: {0}")]
    Config(String),
}

impl StorageError {
    pub fn not_found(key: impl Into<String>) -> Self {
        StorageError::NotFound { key: key.into() }
    }

    pub fn unavailable(key: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        StorageError::Unavailable {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}

impl From<StorageError> for DataError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { key } => DataError::NotFound(key),
            StorageError::Unavailable { key, reason } => {
                DataError::Unavailable { what: key, reason }
            }
            StorageError::Config(reason) => DataError::unavailable("storage backend", reason),
        }
    }
}

/// Uniform read primitives over a hierarchical key space.
///
/// Keys are `/`-separated and relative to the backend root. Both backends
/// report a missing key as [`StorageError::NotFound`].
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Fetch the full contents stored under `key`.
    async fn read_bytes(&self, key: &str) -> StorageResult<Bytes>;

    /// Every key starting with `prefix`, sorted. Listing failures are logged
    /// and yield an empty set.
    async fn list_keys(&self, prefix: &str) -> BTreeSet<String>;

    /// Open the Zarr hierarchy stored under `key`.
    async fn open_array_store(&self, key: &str) -> StorageResult<ArrayStore>;

    /// Short human-readable description for logs.
    fn describe(&self) -> String;
}

/// Which backend to construct.
#[derive(Debug, Clone)]
pub enum BackendConfig {
    /// A local directory tree.
    Local { root: PathBuf },
    /// An S3-compatible bucket.
    ObjectStore(ObjectStorageConfig),
}

impl BackendConfig {
    pub fn build(&self) -> StorageResult<Arc<dyn StorageBackend>> {
        match self {
            BackendConfig::Local { root } => Ok(Arc::new(LocalStorage::new(root))),
            BackendConfig::ObjectStore(config) => Ok(Arc::new(ObjectStorage::new(config)?)),
        }
    }
}

/// Split a key prefix into the directory to list and the full prefix filter.
///
/// `"movement/"` lists `movement`, `"movement/abc"` lists `movement` and keeps
/// only keys starting with `movement/abc`.
pub(crate) fn listing_dir(prefix: &str) -> &str {
    match prefix.rfind('/') {
        Some(i) => &prefix[..i],
        None => "",
    }
}

/// Reject keys that could escape the backend root.
pub(crate) fn is_safe_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('/')
        && key.split('/').all(|segment| segment != ".." && segment != ".")
}
