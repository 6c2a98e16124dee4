//! Daily movement probability matrices.

use chrono::NaiveDate;
use serde::Serialize;

/// Transition probabilities between cells on one date, `matrix[from][to]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovementMatrix {
    pub date: NaiveDate,
    pub matrix: Vec<Vec<f64>>,
}

/// Matrices found for an inclusive date range.
///
/// Dates without a stored matrix are absent; nothing is zero-filled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovementMatrices {
    pub scenario_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub matrices: Vec<MovementMatrix>,
}

impl MovementMatrices {
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.matrices.iter().map(|m| m.date).collect()
    }
}
