//! Storage abstractions for the fishflow query layer.
//!
//! Provides:
//! - A single [`StorageBackend`] contract over a local directory tree or an
//!   object store (MinIO/S3)
//! - The persisted key layout of scenario datasets
//! - The metadata catalog of scenarios discovered under a backend

pub mod backend;
pub mod catalog;
pub mod layout;
pub mod local;
pub mod object_store;

pub use self::object_store::{ObjectStorage, ObjectStorageConfig, TokioBlockOn};
pub use backend::{ArrayStore, BackendConfig, StorageBackend, StorageError, StorageResult};
pub use catalog::ScenarioCatalog;
pub use layout::ScenarioPath;
pub use local::LocalStorage;
