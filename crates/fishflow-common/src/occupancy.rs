//! Depth-occupancy snapshots reshaped for clients.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which view of an occupancy table to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OccupancyLayout {
    /// `probabilities[timestamp][cell]`.
    #[default]
    #[serde(rename = "matrix")]
    TimestampMajor,
    /// `cells[cell_id][timestamp]`.
    #[serde(rename = "cells")]
    CellMajor,
}

/// Occupancy of one depth bin over one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OccupancyResult {
    pub scenario_id: String,
    pub month: NaiveDate,
    pub depth_bin: i64,
    pub data: OccupancyPayload,
}

/// Both views index values by position in `timestamps`, which is strictly
/// ascending. A cell with no row at a timestamp holds `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OccupancyPayload {
    TimestampMajor {
        timestamps: Vec<String>,
        /// Column order of `probabilities`, as first encountered in the table.
        cell_ids: Vec<i64>,
        probabilities: Vec<Vec<Option<f64>>>,
    },
    CellMajor {
        timestamps: Vec<String>,
        cells: BTreeMap<i64, Vec<Option<f64>>>,
    },
}

impl OccupancyPayload {
    pub fn timestamps(&self) -> &[String] {
        match self {
            OccupancyPayload::TimestampMajor { timestamps, .. }
            | OccupancyPayload::CellMajor { timestamps, .. } => timestamps,
        }
    }

    pub fn layout(&self) -> OccupancyLayout {
        match self {
            OccupancyPayload::TimestampMajor { .. } => OccupancyLayout::TimestampMajor,
            OccupancyPayload::CellMajor { .. } => OccupancyLayout::CellMajor,
        }
    }

    /// Probability series of one cell, aligned to `timestamps`.
    pub fn series(&self, cell_id: i64) -> Option<Vec<Option<f64>>> {
        match self {
            OccupancyPayload::TimestampMajor {
                cell_ids,
                probabilities,
                ..
            } => {
                let column = cell_ids.iter().position(|c| *c == cell_id)?;
                Some(probabilities.iter().map(|row| row[column]).collect())
            }
            OccupancyPayload::CellMajor { cells, .. } => cells.get(&cell_id).cloned(),
        }
    }
}
