//! Scenario metadata.
//!
//! A scenario is one dataset instance (species, region, time window) stored
//! under `<family>/<scenario_id>/`. Its `metadata.json` is parsed once when the
//! catalog is built into an immutable [`ScenarioSummary`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::time::{parse_date, shift_days, TimeParseError};

/// Dataset families served by the query layer, each under its own key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetFamily {
    /// Anchor-date scenarios: habitat quality and daily movement matrices.
    Movement,
    /// Time-window scenarios: depth occupancy snapshots and cell depths.
    Depth,
}

impl DatasetFamily {
    /// Top-level key prefix for this family.
    pub fn prefix(&self) -> &'static str {
        match self {
            DatasetFamily::Movement => "movement",
            DatasetFamily::Depth => "depth",
        }
    }
}

impl std::fmt::Display for DatasetFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Typed summary of a scenario's metadata record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioSummary {
    pub scenario_id: String,
    pub name: String,
    pub species: String,
    pub region: String,
    pub description: String,
    #[serde(flatten)]
    pub coverage: TemporalCoverage,
    pub grid_size: usize,
    #[serde(flatten)]
    pub parameters: ScenarioParameters,
    /// Map center as `[lat, lng]`.
    pub map_center: [f64; 2],
    pub map_zoom: u32,
}

/// When a scenario has data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TemporalCoverage {
    /// Data is available within `maximum_window_size` days of each anchor.
    Anchored {
        dates: Vec<NaiveDate>,
        maximum_window_size: u32,
    },
    /// Data covers a single closed window.
    Window { time_window: [NaiveDate; 2] },
}

/// Declared parameter values of a scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScenarioParameters {
    RValues { r_values: Vec<f64> },
    DepthBins { depth_bins: Vec<i64>, resolution: String },
}

impl ScenarioSummary {
    /// Parse a `metadata.json` record for the given family.
    pub fn from_metadata(family: DatasetFamily, bytes: &[u8]) -> Result<Self, MetadataError> {
        match family {
            DatasetFamily::Movement => {
                let record: MovementRecord = serde_json::from_slice(bytes)?;
                record.try_into()
            }
            DatasetFamily::Depth => {
                let record: DepthRecord = serde_json::from_slice(bytes)?;
                record.try_into()
            }
        }
    }

    pub fn family(&self) -> DatasetFamily {
        match self.coverage {
            TemporalCoverage::Anchored { .. } => DatasetFamily::Movement,
            TemporalCoverage::Window { .. } => DatasetFamily::Depth,
        }
    }

    /// Anchor dates and window size, if this is a date-anchored scenario.
    pub fn anchors(&self) -> Option<(&[NaiveDate], u32)> {
        match &self.coverage {
            TemporalCoverage::Anchored {
                dates,
                maximum_window_size,
            } => Some((dates.as_slice(), *maximum_window_size)),
            TemporalCoverage::Window { .. } => None,
        }
    }

    pub fn depth_bins(&self) -> &[i64] {
        match &self.parameters {
            ScenarioParameters::DepthBins { depth_bins, .. } => depth_bins,
            ScenarioParameters::RValues { .. } => &[],
        }
    }
}

/// Why a metadata record was rejected.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("schema validation failed: {0}")]
    Schema(#[from] serde_json::Error),

    #[error(transparent)]
    Date(#[from] TimeParseError),

    #[error("invalid metadata: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
struct MovementRecord {
    scenario_id: String,
    name: String,
    species: String,
    region: String,
    description: String,
    dates: Vec<String>,
    maximum_window_size: u32,
    grid_size: usize,
    r_values: Vec<f64>,
    map_center: [f64; 2],
    map_zoom: u32,
}

impl TryFrom<MovementRecord> for ScenarioSummary {
    type Error = MetadataError;

    fn try_from(record: MovementRecord) -> Result<Self, Self::Error> {
        let dates = record
            .dates
            .iter()
            .map(|d| parse_date(d))
            .collect::<Result<Vec<_>, _>>()?;

        if dates.is_empty() {
            return Err(MetadataError::Invalid(
                "anchor-date scenario declares no dates".to_string(),
            ));
        }

        let window = i64::from(record.maximum_window_size);
        if let Some(anchor) = dates
            .iter()
            .find(|d| shift_days(**d, -window).is_none() || shift_days(**d, window).is_none())
        {
            return Err(MetadataError::Invalid(format!(
                "maximum_window_size {} around {} leaves the calendar",
                record.maximum_window_size, anchor
            )));
        }

        Ok(Self {
            scenario_id: record.scenario_id,
            name: record.name,
            species: record.species,
            region: record.region,
            description: record.description,
            coverage: TemporalCoverage::Anchored {
                dates,
                maximum_window_size: record.maximum_window_size,
            },
            grid_size: record.grid_size,
            parameters: ScenarioParameters::RValues {
                r_values: record.r_values,
            },
            map_center: record.map_center,
            map_zoom: record.map_zoom,
        })
    }
}

#[derive(Debug, Deserialize)]
struct DepthRecord {
    scenario_id: String,
    name: String,
    species: String,
    region: String,
    description: String,
    time_window: Vec<String>,
    grid_size: usize,
    depth_bins: Vec<i64>,
    resolution: String,
    map_center: [f64; 2],
    map_zoom: u32,
}

impl TryFrom<DepthRecord> for ScenarioSummary {
    type Error = MetadataError;

    fn try_from(record: DepthRecord) -> Result<Self, Self::Error> {
        let window = record
            .time_window
            .iter()
            .map(|d| parse_date(d))
            .collect::<Result<Vec<_>, _>>()?;

        let time_window = match window.as_slice() {
            [start, end] if start <= end => [*start, *end],
            _ => {
                return Err(MetadataError::Invalid(format!(
                    "time_window must be two ascending dates, got {:?}",
                    record.time_window
                )))
            }
        };

        Ok(Self {
            scenario_id: record.scenario_id,
            name: record.name,
            species: record.species,
            region: record.region,
            description: record.description,
            coverage: TemporalCoverage::Window { time_window },
            grid_size: record.grid_size,
            parameters: ScenarioParameters::DepthBins {
                depth_bins: record.depth_bins,
                resolution: record.resolution,
            },
            map_center: record.map_center,
            map_zoom: record.map_zoom,
        })
    }
}
