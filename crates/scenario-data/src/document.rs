//! Reading JSON documents from a storage backend.

use serde::de::DeserializeOwned;

use fishflow_common::{DataError, DataResult};
use storage::StorageBackend;

/// Fetch `key` and parse it as JSON.
///
/// A missing key is `NotFound`; bytes that do not parse as `T` are
/// `Malformed`.
pub async fn read_json<T: DeserializeOwned>(
    backend: &dyn StorageBackend,
    key: &str,
) -> DataResult<T> {
    let bytes = backend.read_bytes(key).await?;
    serde_json::from_slice(&bytes).map_err(|e| DataError::malformed(key, e))
}
