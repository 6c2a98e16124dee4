//! Habitat-quality surfaces.

use chrono::NaiveDate;
use serde::Serialize;

/// Habitat quality of every cell on one date for one `r` value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HabitatDataItem {
    pub date: NaiveDate,
    pub r: f64,
    /// One probability per grid cell.
    pub probability: Vec<f64>,
}

/// Every habitat record of a scenario, in stored order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllHabitatQuality {
    pub scenario_id: String,
    pub habitat_data: Vec<HabitatDataItem>,
}
