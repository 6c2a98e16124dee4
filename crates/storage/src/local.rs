//! Local filesystem backend.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;
use zarrs_filesystem::FilesystemStore;

use crate::backend::{
    is_safe_key, listing_dir, ArrayStore, StorageBackend, StorageError, StorageResult,
};

/// Storage backend rooted at a local directory. Keys map to relative paths.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> StorageResult<PathBuf> {
        if !is_safe_key(key) {
            warn!(key = %key, "Rejecting key outside storage root");
            return Err(StorageError::not_found(key));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl StorageBackend for LocalStorage {
    #[instrument(skip(self), fields(root = %self.root.display()))]
    async fn read_bytes(&self, key: &str) -> StorageResult<Bytes> {
        let path = self.resolve(key)?;

        match tokio::fs::read(&path).await {
            Ok(data) => {
                debug!(size = data.len(), "Read file");
                Ok(Bytes::from(data))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound || path.is_dir() => {
                Err(StorageError::not_found(key))
            }
            Err(e) => Err(StorageError::unavailable(key, e)),
        }
    }

    async fn list_keys(&self, prefix: &str) -> BTreeSet<String> {
        let root = self.root.clone();
        let prefix = prefix.to_string();

        let listed = tokio::task::spawn_blocking(move || {
            let start = root.join(listing_dir(&prefix));
            if !start.is_dir() {
                return Ok(BTreeSet::new());
            }

            let mut keys = BTreeSet::new();
            for entry in WalkDir::new(&start).follow_links(true) {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) if e.depth() == 0 => return Err(e.to_string()),
                    Err(e) => {
                        warn!(path = ?e.path(), error = %e, "Skipping unreadable entry");
                        continue;
                    }
                };
                if !entry.file_type().is_file() {
                    continue;
                }
                let Ok(relative) = entry.path().strip_prefix(&root) else {
                    continue;
                };
                let key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                if key.starts_with(&prefix) {
                    keys.insert(key);
                }
            }
            Ok::<_, String>(keys)
        })
        .await;

        match listed {
            Ok(Ok(keys)) => keys,
            Ok(Err(e)) => {
                warn!(root = %self.root.display(), error = %e, "Failed to list keys");
                BTreeSet::new()
            }
            Err(e) => {
                warn!(root = %self.root.display(), error = %e, "Key listing task failed");
                BTreeSet::new()
            }
        }
    }

    #[instrument(skip(self), fields(root = %self.root.display()))]
    async fn open_array_store(&self, key: &str) -> StorageResult<ArrayStore> {
        let path = self.resolve(key)?;
        if !path.is_dir() {
            return Err(StorageError::not_found(key));
        }

        let store = FilesystemStore::new(&path).map_err(|e| StorageError::unavailable(key, e))?;
        Ok(Arc::new(store))
    }

    fn describe(&self) -> String {
        format!("local:{}", self.root.display())
    }
}
