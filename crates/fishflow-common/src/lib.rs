//! Common types and utilities shared across the fishflow crates.

pub mod error;
pub mod grid;
pub mod habitat;
pub mod movement;
pub mod occupancy;
pub mod scenario;
pub mod time;

pub use error::{DataError, DataResult, ValidationError};
pub use grid::{CellMaxDepths, GridCell, GridGeometries, PolygonGeometry};
pub use habitat::{AllHabitatQuality, HabitatDataItem};
pub use movement::{MovementMatrices, MovementMatrix};
pub use occupancy::{OccupancyLayout, OccupancyPayload, OccupancyResult};
pub use scenario::{
    DatasetFamily, MetadataError, ScenarioParameters, ScenarioSummary, TemporalCoverage,
};
pub use time::{DateRange, TimeParseError};
