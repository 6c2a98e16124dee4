//! Scenario Data Access & Query Layer
//!
//! Loads pre-computed scenario datasets from a [`storage::StorageBackend`],
//! validates them and reshapes them for clients:
//!
//! - **Geometries**: GeoJSON feature collection to cells ordered by id
//! - **Habitat quality**: `{date, r, probability[]}` records
//! - **Occupancy**: monthly columnar snapshot tables pivoted per depth bin
//! - **Movement matrices**: one 2-D slice per date from a Zarr hierarchy
//! - **Availability**: date-window checks run before any storage access
//!
//! # Architecture
//!
//! ```text
//! Request
//!    │
//!    ▼
//! ScenarioDataService
//!    │
//!    ├─► ScenarioCatalog (resolve scenario, in memory)
//!    │
//!    ├─► AvailabilityWindow::validate (date-ranged queries only)
//!    │
//!    └─► geometry / habitat / occupancy / movement loader
//!              │
//!              ▼
//!        StorageBackend (local directory or object store)
//! ```
//!
//! Missing or malformed data never surfaces as a fault: the service logs the
//! cause and returns `None`.

pub mod availability;
pub mod cell_depths;
pub mod document;
pub mod geometry;
pub mod habitat;
pub mod movement;
pub mod occupancy;
pub mod service;
pub mod testdata;

pub use availability::{AvailabilityWindow, MAX_REQUEST_DAYS};
pub use occupancy::{OccupancyRow, OccupancyTable};
pub use service::ScenarioDataService;
