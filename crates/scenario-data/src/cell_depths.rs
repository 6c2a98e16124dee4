//! Per-cell maximum usable depth.

use serde_json::Value;

use fishflow_common::{CellMaxDepths, DataError, DataResult};
use storage::{ScenarioPath, StorageBackend};

use crate::document::read_json;

/// Load `cell_depths.json`, an array whose index is the cell identifier.
pub async fn load_cell_max_depths(
    backend: &dyn StorageBackend,
    scenario_id: &str,
) -> DataResult<CellMaxDepths> {
    let key = ScenarioPath::cell_depths(scenario_id);
    let document: Value = read_json(backend, &key).await?;

    let max_depths = document
        .as_array()
        .ok_or_else(|| DataError::malformed(&key, "expected an array indexed by cell id"))?
        .iter()
        .enumerate()
        .map(|(cell_id, v)| {
            v.as_f64().ok_or_else(|| {
                DataError::malformed(
                    &key,
                    format!("depth of cell {} is not numeric: {}", cell_id, v),
                )
            })
        })
        .collect::<DataResult<Vec<f64>>>()?;

    Ok(CellMaxDepths {
        scenario_id: scenario_id.to_string(),
        max_depths,
    })
}
